//! Error types for relay-core.

use thiserror::Error;

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid alert pattern: {0}")]
    InvalidPattern(String),

    #[error("Alert pattern is missing required group: {0}")]
    MissingGroup(&'static str),

    #[error("Invalid size: {0}")]
    InvalidSize(String),

    #[error("Malformed secret record")]
    MalformedSecret,
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
