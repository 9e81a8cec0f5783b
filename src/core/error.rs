//! Error types for the pipeline.

use std::io;

use thiserror::Error;

/// The main error type for the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The pipeline's cancellation token fired
    #[error("Pipeline was shut down")]
    Shutdown,

    /// The downstream stage hung up and will not take any more values
    #[error("Downstream stage hung up")]
    Disconnected,

    /// A tagging filter was configured with a zero divisor
    #[error("Divisor for tag {tag:?} must be positive")]
    InvalidDivisor { tag: String },

    /// A limit could not be parsed from user input
    #[error("Invalid limit {input:?}: {reason}")]
    InvalidLimit { input: String, reason: String },

    /// A stage's logic failed
    #[error("Stage {stage} failed: {message}")]
    Stage { stage: String, message: String },

    /// Writing to an output failed
    #[error("Failed to write output: {message}")]
    Output { kind: io::ErrorKind, message: String },

    /// A custom error with a message
    #[error("{0}")]
    Custom(String),
}

// Convenience constructors
impl Error {
    /// Create a stage failure for the named stage
    pub fn stage<S: Into<String>, M: std::fmt::Display>(stage: S, message: M) -> Self {
        Error::Stage {
            stage: stage.into(),
            message: message.to_string(),
        }
    }

    /// Create a custom error with a message
    pub fn custom<S: Into<String>>(message: S) -> Self {
        Error::Custom(message.into())
    }

    /// Whether this error ends a stage without it being a fault.
    ///
    /// Cancellation and a hung-up consumer are ordinary ways for a stage to
    /// stop; everything else is logged as a failure.
    pub fn is_termination(&self) -> bool {
        matches!(self, Error::Shutdown | Error::Disconnected)
    }

    /// Whether the reader of our output went away, e.g. `fizzpipe | head -1`.
    pub fn is_broken_pipe(&self) -> bool {
        matches!(
            self,
            Error::Output {
                kind: io::ErrorKind::BrokenPipe,
                ..
            }
        )
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Output {
            kind: e.kind(),
            message: e.to_string(),
        }
    }
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, Error>;
