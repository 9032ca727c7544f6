//! Error types for the civic intake core.
//!
//! Only `InvalidInput`, `ProcessingFailed` and `RemoteWriteFailed` (on add)
//! are meant to reach a citizen. Everything else degrades to a default value
//! at the call site and is only logged.

use thiserror::Error;

/// Result type alias using the civic Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for civic intake operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Upload or form input rejected before any processing.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Every image processing strategy was exhausted.
    #[error("Processing failed for {filename}: {}", .reasons.join("; "))]
    ProcessingFailed {
        filename: String,
        reasons: Vec<String>,
    },

    /// Persisting to the document store failed after the local apply.
    #[error("Remote write failed: {0}")]
    RemoteWriteFailed(String),

    /// Fetching from the document store failed.
    #[error("Remote read failed: {0}")]
    RemoteReadFailed(String),

    /// Suggestion or validation endpoint failed or returned garbage.
    #[error("AI unavailable: {0}")]
    AiUnavailable(String),

    /// The generative endpoint refused the request for quota reasons.
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error should be shown to the submitting user.
    pub fn is_user_visible(&self) -> bool {
        matches!(
            self,
            Error::InvalidInput(_) | Error::ProcessingFailed { .. } | Error::RemoteWriteFailed(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}
