//! Report store error types

use thiserror::Error;

use crate::report::ReportId;

/// Errors that can occur talking to the report backend
#[derive(Error, Debug)]
pub enum StoreError {
    /// Backend could not be reached
    #[error("Report backend unavailable: {0}")]
    Unavailable(String),

    /// Request exceeded the configured timeout
    #[error("Request timeout")]
    Timeout,

    /// Transport-level failure
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Backend answered with a non-success status
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Response body did not match the report schema
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// No report with this id
    #[error("Report not found: {0}")]
    NotFound(ReportId),

    /// Change feed could not be established or failed
    #[error("Subscription error: {0}")]
    Subscription(String),

    /// Store was built from an unusable configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Decode(err.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for StoreError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        StoreError::Subscription(err.to_string())
    }
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;
