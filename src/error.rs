//! Marquee error types

use std::time::Duration;

/// Marquee error types.
///
/// `Clone` so that one settled in-flight lookup can hand the same outcome
/// to every caller waiting on it.
#[derive(Debug, Clone, thiserror::Error)]
pub enum MarqueeError {
    // Provider/network errors
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    // Data errors
    #[error("JSON error: {0}")]
    Json(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    // Persistence errors
    #[error("storage error: {0}")]
    Storage(String),

    // Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A background component stopped before the request settled.
    #[error("{0} shut down before the request settled")]
    ShutDown(&'static str),
}

impl MarqueeError {
    /// Whether retrying the same request later could succeed.
    ///
    /// Network failures, rate limiting, and 5xx responses are transient.
    /// Everything else (bad input, 4xx, storage, configuration) is not.
    pub fn is_transient(&self) -> bool {
        match self {
            MarqueeError::Http(_) | MarqueeError::RateLimited { .. } => true,
            MarqueeError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Provider-supplied backoff hint, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            MarqueeError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

impl From<serde_json::Error> for MarqueeError {
    fn from(err: serde_json::Error) -> Self {
        MarqueeError::Json(err.to_string())
    }
}

impl From<reqwest::Error> for MarqueeError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => MarqueeError::Api {
                status: status.as_u16(),
                message: err.to_string(),
            },
            None => MarqueeError::Http(err.to_string()),
        }
    }
}

/// Result type alias for Marquee operations
pub type Result<T> = std::result::Result<T, MarqueeError>;
