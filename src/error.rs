//! Error types for rss-notify.

use thiserror::Error;

/// Common error type for rss-notify.
#[derive(Error, Debug)]
pub enum RelayError {
    /// The feed endpoint was unreachable or answered with a non-success status.
    #[error("fetch error: {0}")]
    Fetch(String),

    /// The feed body could not be parsed as RSS.
    #[error("parse error: {0}")]
    Parse(String),

    /// Webhook transport failure or a non-zero application status.
    #[error("delivery error: {0}")]
    Delivery(String),

    /// Seen-item persistence failed.
    #[error("store error: {0}")]
    Store(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<sqlx::Error> for RelayError {
    fn from(e: sqlx::Error) -> Self {
        RelayError::Store(e.to_string())
    }
}

impl From<serde_json::Error> for RelayError {
    fn from(e: serde_json::Error) -> Self {
        RelayError::Store(e.to_string())
    }
}

/// Result type alias for rss-notify operations.
pub type Result<T> = std::result::Result<T, RelayError>;
