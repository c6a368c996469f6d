//! Error types for livewatch
//!
//! The taxonomy follows how far each failure is allowed to travel:
//! only [`Error::SourceUnavailable`] ever reaches a poll caller, and only
//! [`Error::Persistence`] ever aborts a scheduler tick. Detail and delivery
//! failures are contained where they happen.

use thiserror::Error;

/// Result type alias for livewatch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for livewatch
#[derive(Error, Debug)]
pub enum Error {
    /// External status fetch failed (transport, timeout, non-2xx, unparseable or malformed body)
    #[error("Status source unavailable: {0}")]
    SourceUnavailable(String),

    /// Secondary stream-detail fetch failed
    #[error("Stream detail unavailable: {0}")]
    DetailUnavailable(String),

    /// Push gateway rejected the message or could not be reached
    #[error("Delivery failed ({gateway}): {message}")]
    DeliveryFailed {
        /// Gateway name
        gateway: String,
        /// Error message
        message: String,
    },

    /// Session store read/write failed
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a source-unavailable error
    pub fn source_unavailable(msg: impl Into<String>) -> Self {
        Self::SourceUnavailable(msg.into())
    }

    /// Create a detail-unavailable error
    pub fn detail_unavailable(msg: impl Into<String>) -> Self {
        Self::DetailUnavailable(msg.into())
    }

    /// Create a delivery-failed error
    pub fn delivery_failed(gateway: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DeliveryFailed {
            gateway: gateway.into(),
            message: message.into(),
        }
    }

    /// Create a persistence error
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Whether this error is one a poll caller may observe
    pub fn is_source_unavailable(&self) -> bool {
        matches!(self, Self::SourceUnavailable(_))
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
