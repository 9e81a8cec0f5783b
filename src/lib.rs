//! # A cancellable streaming filter pipeline
//!
//! An endless generator feeds a chain of filter stages, each running as its
//! own tokio task, and a sink at the end consumes the results.
//!
//! ## Core Concepts
//!
//! - **Value**: an identity plus the tags stages attached to it
//! - **Source**: the head of the pipeline, e.g. the [`Generator`](sources::Generator)
//! - **Filter**: a stage reading one input and writing one output
//! - **Sink**: consumes whatever reaches the end
//! - **Handoff**: a single-slot channel between neighbouring stages
//!
//! Every stage finalizes its output exactly once, even when its logic fails
//! or panics. A stage that stops reading releases everything upstream, and a
//! shared cancellation token stops the whole pipeline on request.
//!
//! ## Example
//!
//! ```rust
//! use fizzpipe::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     Pipeline::new(Generator::new())
//!         .filter(LimitFilter::new(15))
//!         .filter(TagFilter::new(3, "fizz")?)
//!         .filter(TagFilter::new(5, "buzz")?)
//!         .sink(PrintSink::new())
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod pipeline;
pub mod processors;
pub mod runtime;
pub mod sinks;
pub mod sources;
pub mod util;

// Re-export commonly used items
pub mod prelude {
    pub use crate::core::{Error, Filter, Result, Sink, Source, Value};
    pub use crate::pipeline::{compose, Pipeline, RunningPipeline};
    pub use crate::processors::{filter_from_fn, LimitFilter, TagFilter};
    pub use crate::runtime::{Inlet, Outlet, StageOutcome};
    pub use crate::sinks::{run, CollectSink, PrintSink};
    pub use crate::sources::{Generator, VecSource};
    pub use tokio_util::sync::CancellationToken;
}

// Re-export main error type
pub use crate::core::{Error, Result};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
