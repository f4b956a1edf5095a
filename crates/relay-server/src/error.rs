//! Request rejection taxonomy and server error types.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use relay_telemetry::Metrics;
use thiserror::Error;
use tracing::{error, warn};

/// Why an inbound request was not relayed.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Mandatory setting missing or invalid.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Caller IP, token or secret lookup failed.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Malformed body or unparseable order.
    #[error("invalid request: {0}")]
    Validation(String),

    /// Target path or method not whitelisted.
    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("method not allowed: {0}")]
    MethodNotAllowed(String),
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Authentication(_) => StatusCode::UNAUTHORIZED,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::Authentication(_) => "unauthorized",
            Self::Validation(_) => "invalid",
            Self::Forbidden(_) => "forbidden",
            Self::MethodNotAllowed(_) => "method_not_allowed",
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        match &self {
            Self::Configuration(_) => error!(error = %self, "Request rejected"),
            _ => warn!(error = %self, "Request rejected"),
        }
        Metrics::alert(self.label());

        (
            self.status(),
            [(header::CONTENT_TYPE, "application/json")],
            String::new(),
        )
            .into_response()
    }
}

/// Server lifecycle errors.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Invalid listen address: {0}")]
    InvalidAddress(String),

    #[error("Secret store error: {0}")]
    SecretStore(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ServerResult<T> = Result<T, ServerError>;
