//! Error types for the skew-signals workspace.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for signal computation.
///
/// Only precondition failures are errors. Numeric degeneracies (zero totals,
/// empty windows) are returned as NaN or infinity by the calculators.
#[derive(Error, Debug)]
pub enum Error {
    /// Input shape or precondition violation (empty sides, bad depths, zero window).
    #[error("Shape error: {0}")]
    Shape(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data error (invalid or missing data).
    #[error("Data error: {0}")]
    Data(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a shape error.
    pub fn shape(msg: impl Into<String>) -> Self {
        Error::Shape(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create a data error.
    pub fn data(msg: impl Into<String>) -> Self {
        Error::Data(msg.into())
    }

    /// True for precondition failures raised at the call boundary.
    pub fn is_shape(&self) -> bool {
        matches!(self, Error::Shape(_))
    }
}
