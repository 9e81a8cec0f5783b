//! Source implementations for the fizzpipe library.
//!
//! Sources sit at the head of a pipeline and are started with
//! [`spawn_source`](crate::runtime::spawn_source).

use async_trait::async_trait;
use std::collections::VecDeque;
use std::num::NonZeroU64;

use crate::core::{Result, Source, Value};

/// An unbounded source of untagged values with ascending identities.
///
/// Identities start at 1 and grow by one per value. The generator is lazy:
/// the runtime only asks for a value once the previous one was taken, and it
/// stops as soon as the pipeline is cancelled or its reader hangs up.
#[derive(Debug, Clone)]
pub struct Generator {
    next: Option<NonZeroU64>,
}

impl Generator {
    /// Create a generator starting at identity 1
    pub fn new() -> Self {
        Self::starting_at(NonZeroU64::MIN)
    }

    /// Create a generator starting at the given identity
    pub fn starting_at(first: NonZeroU64) -> Self {
        Self { next: Some(first) }
    }
}

impl Default for Generator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Source for Generator {
    type Item = Value;

    async fn produce(&mut self) -> Result<Option<Self::Item>> {
        // Running out of identities ends the stream instead of reusing one.
        let Some(identity) = self.next else {
            return Ok(None);
        };
        self.next = identity.checked_add(1);
        Ok(Some(Value::new(identity.get())))
    }

    fn name(&self) -> String {
        "generator".to_string()
    }
}

/// A source that yields items from a vector
pub struct VecSource<T> {
    items: VecDeque<T>,
}

impl<T> VecSource<T> {
    /// Create a new vector source
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items: items.into(),
        }
    }

    /// Check if the source has more items
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get the number of remaining items
    pub fn len(&self) -> usize {
        self.items.len()
    }
}

impl<T> FromIterator<T> for VecSource<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

#[async_trait]
impl<T: Send + 'static> Source for VecSource<T> {
    type Item = T;

    async fn produce(&mut self) -> Result<Option<Self::Item>> {
        Ok(self.items.pop_front())
    }

    fn name(&self) -> String {
        "vec".to_string()
    }
}
