//! Error types for recall.

use thiserror::Error;

/// Result type alias using recall's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for recall operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Knowledge item not found
    #[error("Knowledge item not found: {0}")]
    ItemNotFound(uuid::Uuid),

    /// Embedding generation failed or no embedding backend is usable
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Inference/generation failed
    #[error("Inference error: {0}")]
    Inference(String),

    /// An external call exceeded its deadline
    #[error("Timed out after {duration_ms}ms: {operation}")]
    Timeout { operation: String, duration_ms: u64 },

    /// Client exceeded its request allowance for the current window
    #[error("Rate limit exceeded for client {client_key}")]
    RateLimited { client_key: String },

    /// Input failed validation
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Search/ranking operation failed
    #[error("Search error: {0}")]
    Search(String),

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
    /// True for governor denials, which callers should answer with backoff.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Error::RateLimited { .. })
    }

    /// True for unknown item ids and other missing resources.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_) | Error::ItemNotFound(_))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout { .. })
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            return Error::Timeout {
                operation: "http request".to_string(),
                duration_ms: 0,
            };
        }
        Error::Request(e.to_string())
    }
}
