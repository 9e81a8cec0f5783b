//! Pipeline composition and execution.
//!
//! A pipeline is a source followed by an ordered list of filters, fixed once
//! it is spawned. Every stage gets its own task; all of them share one
//! [`CancellationToken`].

use futures::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::core::{Filter, Result, Sink, Source};
use crate::runtime::{spawn_filter, spawn_source, Inlet, StageHandle, StageOutcome};
use crate::sinks;

/// A source and the filters it feeds, in the order they will see values.
///
/// # Examples
///
/// ```rust
/// use fizzpipe::prelude::*;
///
/// #[tokio::main]
/// async fn main() -> Result<()> {
///     let mut rendered = Vec::new();
///
///     Pipeline::new(Generator::new())
///         .filter(LimitFilter::new(5))
///         .filter(TagFilter::new(3, "fizz")?)
///         .run(|value| rendered.push(value.render()))
///         .await;
///
///     assert_eq!(rendered, vec!["1", "2", "fizz", "4", "5"]);
///     Ok(())
/// }
/// ```
pub struct Pipeline<S: Source> {
    source: S,
    filters: Vec<Box<dyn Filter<Item = S::Item>>>,
    token: CancellationToken,
}

impl<S: Source> Pipeline<S> {
    /// Create a new pipeline with no filters
    pub fn new(source: S) -> Self {
        Self {
            source,
            filters: Vec::new(),
            token: CancellationToken::new(),
        }
    }

    /// Append a filter after the ones already added
    pub fn filter<F>(mut self, filter: F) -> Self
    where
        F: Filter<Item = S::Item>,
    {
        self.filters.push(Box::new(filter));
        self
    }

    /// Use an externally owned cancellation token
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    /// The token every stage of this pipeline will observe
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Number of stages, source included
    pub fn stage_count(&self) -> usize {
        self.filters.len() + 1
    }

    /// Start every stage and return the final output.
    pub fn spawn(self) -> RunningPipeline<S::Item> {
        compose(self.source, self.filters, &self.token)
    }

    /// Run to completion, calling `action` on every value that reaches the
    /// end. Returns how many values were seen.
    pub async fn run<F>(self, action: F) -> usize
    where
        F: FnMut(S::Item),
    {
        let (output, stages) = self.spawn().into_parts();
        let seen = sinks::run(output, action).await;
        join_stages(stages).await;
        seen
    }

    /// Run to completion, writing every value into `sink`.
    pub async fn sink<C>(self, mut sink: C) -> Result<usize>
    where
        C: Sink<Item = S::Item>,
    {
        let (output, stages) = self.spawn().into_parts();
        let written = sinks::drain(output, &mut sink).await;
        join_stages(stages).await;
        written
    }
}

/// Start `source`, then thread its output through `filters` left to right.
pub fn compose<S: Source>(
    source: S,
    filters: Vec<Box<dyn Filter<Item = S::Item>>>,
    token: &CancellationToken,
) -> RunningPipeline<S::Item> {
    let (mut stream, head) = spawn_source(source, token);
    let mut stages = Vec::with_capacity(filters.len() + 1);
    stages.push(head);

    for filter in filters {
        let (next, stage) = spawn_filter(filter, stream);
        stream = next;
        stages.push(stage);
    }

    let names: Vec<&str> = stages.iter().map(StageHandle::name).collect();
    debug!(stages = ?names, "pipeline composed");

    RunningPipeline {
        output: stream,
        stages,
        token: token.clone(),
    }
}

/// A spawned pipeline: its final output plus a handle on every stage.
///
/// Dropping it hangs up the last stage, which releases every stage before it.
pub struct RunningPipeline<T> {
    output: Inlet<T>,
    stages: Vec<StageHandle>,
    token: CancellationToken,
}

impl<T: Send + 'static> RunningPipeline<T> {
    /// Take the next value, or None once the pipeline has ended or was
    /// cancelled.
    pub async fn next(&mut self) -> Option<T> {
        self.output.recv().await.ok().flatten()
    }

    /// Ask every stage to stop.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.token
    }

    /// Stage names, source first
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(StageHandle::name).collect()
    }

    pub fn into_parts(self) -> (Inlet<T>, Vec<StageHandle>) {
        (self.output, self.stages)
    }

    /// Hang up and wait for every stage to end.
    pub async fn join(self) -> Vec<(String, StageOutcome)> {
        let (output, stages) = self.into_parts();
        drop(output);
        join_stages(stages).await
    }
}

async fn join_stages(stages: Vec<StageHandle>) -> Vec<(String, StageOutcome)> {
    let names: Vec<String> = stages.iter().map(|s| s.name().to_string()).collect();
    let outcomes = join_all(stages.into_iter().map(StageHandle::join)).await;
    names.into_iter().zip(outcomes).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Value;
    use crate::processors::{LimitFilter, TagFilter};
    use crate::sources::{Generator, VecSource};

    #[tokio::test]
    async fn test_stages_are_spawned_in_declared_order() {
        let running = Pipeline::new(Generator::new())
            .filter(LimitFilter::new(3))
            .filter(TagFilter::new(3, "fizz").unwrap())
            .spawn();

        assert_eq!(
            running.stage_names(),
            vec!["generator", "limit(3)", "tag(3, \"fizz\")"]
        );
        running.join().await;
    }

    #[tokio::test]
    async fn test_no_filters_passes_source_through() {
        let source = VecSource::new(vec![Value::new(1), Value::new(2)]);
        let mut seen = Vec::new();

        let count = Pipeline::new(source).run(|v| seen.push(v.identity())).await;

        assert_eq!(count, 2);
        assert_eq!(seen, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_stage_count_includes_source() {
        let pipeline = Pipeline::new(Generator::new())
            .filter(LimitFilter::new(1))
            .filter(TagFilter::new(2, "even").unwrap());
        assert_eq!(pipeline.stage_count(), 3);
    }
}
