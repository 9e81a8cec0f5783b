//! Core traits and types for the fizzpipe library.
//!
//! This module contains the fundamental traits, the error type and the
//! [`Value`] that flows through every pipeline.

pub mod error;
pub mod traits;
pub mod value;

// Re-export core items
pub use error::{Error, Result};
pub use traits::{Filter, Sink, Source};
pub use value::Value;
