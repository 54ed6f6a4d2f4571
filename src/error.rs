//! Gateway error types

use std::time::Duration;

/// Gateway error types
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    // Model API / network errors
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("model not found: {0}")]
    ModelNotFound(String),

    #[error("model call timed out after {0:?}")]
    Timeout(Duration),

    // Data errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Capability name outside the fixed enumerated set.
    #[error("unknown capability: {0}")]
    UnknownCapability(String),

    #[error("not found: {0}")]
    NotFound(String),

    // Configuration errors
    #[error("no model client configured")]
    NoClient,

    #[error("configuration error: {0}")]
    Configuration(String),

    // Durable store errors (never surfaced to capability callers)
    #[error("store error: {0}")]
    Store(String),

    // Soft errors
    #[error("empty response from model")]
    EmptyResponse,

    #[error("content filtered: {reason}")]
    ContentFiltered { reason: String },
}

impl GatewayError {
    /// Whether the error is worth retrying.
    ///
    /// Rate limits, transport failures, timeouts and 5xx responses are
    /// transient. Everything else is permanent.
    pub fn is_transient(&self) -> bool {
        match self {
            GatewayError::RateLimited { .. } | GatewayError::Http(_) => true,
            GatewayError::Timeout(_) => true,
            GatewayError::Api { status, .. } => (500..600).contains(status),
            _ => false,
        }
    }

    /// Provider-supplied retry hint, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            GatewayError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        GatewayError::Http(err.to_string())
    }
}

/// Result type alias for gateway operations
pub type Result<T> = std::result::Result<T, GatewayError>;
