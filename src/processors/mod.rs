//! Filter implementations for the fizzpipe library.
//!
//! Each filter is a small immutable configuration record; its `run` method
//! is the stage logic the runtime drives.

use async_trait::async_trait;
use std::future::Future;
use std::marker::PhantomData;

use crate::core::{Error, Filter, Result, Value};
use crate::runtime::{Inlet, Outlet};

/// A filter that forwards at most `limit` items, then stops reading.
///
/// Stopping drops the input, which releases every stage upstream. A limit of
/// zero forwards nothing and finalizes its output straight away.
pub struct LimitFilter<T> {
    limit: usize,
    _phantom: PhantomData<fn() -> T>,
}

impl<T> LimitFilter<T> {
    /// Create a new limit filter
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            _phantom: PhantomData,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

#[async_trait]
impl<T: Send + 'static> Filter for LimitFilter<T> {
    type Item = T;

    async fn run(&mut self, mut input: Inlet<T>, output: Outlet<T>) -> Result<()> {
        for _ in 0..self.limit {
            match input.recv().await? {
                Some(item) => output.send(item).await?,
                None => break,
            }
        }
        Ok(())
    }

    fn name(&self) -> String {
        format!("limit({})", self.limit)
    }
}

/// A filter that tags every value whose identity is a multiple of `divisor`.
///
/// All values are forwarded in arrival order, tagged or not. Only the
/// identity is tested, so several tag filters in a row each add their own tag
/// independently, in composition order.
#[derive(Debug, Clone)]
pub struct TagFilter {
    divisor: u64,
    tag: String,
}

impl TagFilter {
    /// Create a new tag filter. The divisor must be positive.
    pub fn new<S: Into<String>>(divisor: u64, tag: S) -> Result<Self> {
        let tag = tag.into();
        if divisor == 0 {
            return Err(Error::InvalidDivisor { tag });
        }
        Ok(Self { divisor, tag })
    }

    pub fn divisor(&self) -> u64 {
        self.divisor
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Whether `value` gets this filter's tag
    pub fn matches(&self, value: &Value) -> bool {
        value.identity() % self.divisor == 0
    }

    /// Tag `value` if it matches
    pub fn apply(&self, mut value: Value) -> Value {
        if self.matches(&value) {
            value.push_tag(self.tag.as_str());
        }
        value
    }
}

#[async_trait]
impl Filter for TagFilter {
    type Item = Value;

    async fn run(&mut self, mut input: Inlet<Value>, output: Outlet<Value>) -> Result<()> {
        while let Some(value) = input.recv().await? {
            output.send(self.apply(value)).await?;
        }
        Ok(())
    }

    fn name(&self) -> String {
        format!("tag({}, {:?})", self.divisor, self.tag)
    }
}

/// Helper function to create a filter from a function
pub fn filter_from_fn<F, Fut, T>(name: impl Into<String>, f: F) -> FnFilter<F, Fut, T>
where
    F: FnMut(Inlet<T>, Outlet<T>) -> Fut + Send + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
    T: Send + 'static,
{
    FnFilter {
        name: name.into(),
        f,
        _phantom: PhantomData,
    }
}

/// A filter created from a function
pub struct FnFilter<F, Fut, T> {
    name: String,
    f: F,
    _phantom: PhantomData<fn() -> (Fut, T)>,
}

#[async_trait]
impl<F, Fut, T> Filter for FnFilter<F, Fut, T>
where
    F: FnMut(Inlet<T>, Outlet<T>) -> Fut + Send + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
    T: Send + 'static,
{
    type Item = T;

    async fn run(&mut self, input: Inlet<T>, output: Outlet<T>) -> Result<()> {
        (self.f)(input, output).await
    }

    fn name(&self) -> String {
        self.name.clone()
    }
}
