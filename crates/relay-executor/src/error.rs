//! Executor error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("HTTP client error: {0}")]
    HttpClient(String),
}

pub type ExecutorResult<T> = Result<T, ExecutorError>;

/// Failure to obtain an upstream response.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// Connect, timeout or body read failure. Retried like a 5xx.
    #[error("network error: {0}")]
    Network(String),

    /// The request could not be built. Never retried.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl TransportError {
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, TransportError::Network(_))
    }
}
