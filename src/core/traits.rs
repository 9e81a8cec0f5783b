//! Core traits for the pipeline.
//!
//! A pipeline is a [`Source`] feeding an ordered chain of [`Filter`]s, drained
//! by a [`Sink`]. Sources and filters each run as their own task; the runtime
//! connects them with single-slot handoffs and owns their lifecycle.

use crate::core::error::Result;
use crate::runtime::{Inlet, Outlet};
use async_trait::async_trait;

/// A source generates items lazily, one per request.
///
/// The runtime only asks for the next item once the downstream handoff has
/// room for it, so a source never runs more than one item ahead of its
/// reader.
///
/// # Examples
///
/// ```rust
/// use async_trait::async_trait;
/// use fizzpipe::core::{Result, Source};
///
/// struct Countdown {
///     remaining: u64,
/// }
///
/// #[async_trait]
/// impl Source for Countdown {
///     type Item = u64;
///
///     async fn produce(&mut self) -> Result<Option<Self::Item>> {
///         if self.remaining == 0 {
///             return Ok(None);
///         }
///         self.remaining -= 1;
///         Ok(Some(self.remaining))
///     }
/// }
/// ```
#[async_trait]
pub trait Source: Send + 'static {
    /// The type of items this source generates
    type Item: Send + 'static;

    /// Produce the next item, or None if the source is exhausted.
    async fn produce(&mut self) -> Result<Option<Self::Item>>;

    /// Name used in log output
    fn name(&self) -> String {
        "source".to_string()
    }
}

/// A filter stage: reads from its input and writes to its output until it
/// decides to stop or its input ends.
///
/// Returning (with `Ok` or `Err`) or panicking all finalize the output: the
/// runtime drops the [`Outlet`] exactly once when `run` is done with it.
///
/// # Examples
///
/// ```rust
/// use async_trait::async_trait;
/// use fizzpipe::core::{Filter, Result};
/// use fizzpipe::runtime::{Inlet, Outlet};
///
/// struct Doubler;
///
/// #[async_trait]
/// impl Filter for Doubler {
///     type Item = u64;
///
///     async fn run(&mut self, mut input: Inlet<u64>, output: Outlet<u64>) -> Result<()> {
///         while let Some(n) = input.recv().await? {
///             output.send(n * 2).await?;
///         }
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Filter: Send + 'static {
    /// The type of items flowing through this filter
    type Item: Send + 'static;

    /// Drive the filter to completion.
    async fn run(&mut self, input: Inlet<Self::Item>, output: Outlet<Self::Item>) -> Result<()>;

    /// Name used in log output
    fn name(&self) -> String {
        "filter".to_string()
    }
}

/// A sink consumes the items arriving at the end of a pipeline.
///
/// # Examples
///
/// ```rust
/// use async_trait::async_trait;
/// use fizzpipe::core::{Result, Sink, Value};
///
/// struct LogSink;
///
/// #[async_trait]
/// impl Sink for LogSink {
///     type Item = Value;
///
///     async fn write(&mut self, item: Self::Item) -> Result<()> {
///         println!("Logged: {}", item);
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Sink: Send {
    /// The type of items this sink accepts
    type Item: Send + 'static;

    /// Consume a single item.
    async fn write(&mut self, item: Self::Item) -> Result<()>;

    /// Called once the stream has ended.
    async fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

