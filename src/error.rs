//! Error types for the cache and HTTP layers
//!
//! Provides unified error handling using thiserror.

use serde_json::Value;
use thiserror::Error;

// == Api Error Enum ==
/// Errors that reach the caller of the HTTP client or the cached-fetch API.
///
/// Cache-tier failures never show up here: they are absorbed and turned into
/// misses. `Clone` lets one deduplicated failure be handed to every waiter.
#[derive(Error, Debug, Clone)]
pub enum ApiError {
    /// The request did not complete within the configured timeout
    #[error("Request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// The server could not be reached at all
    #[error("No connectivity: {0}")]
    Offline(String),

    /// The server answered with a non-2xx status
    #[error("HTTP {status} {status_text}")]
    Http {
        status: u16,
        status_text: String,
        body: Value,
    },

    /// A 2xx response body could not be decoded
    #[error("Failed to parse response (status {status}): {message}")]
    Parse { status: u16, message: String },

    /// Any other transport failure
    #[error("Request failed: {0}")]
    Request(String),

    /// The path could not be turned into a request URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The client could not be assembled from its configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ApiError {
    /// Returns true for failures a caller may reasonably retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, ApiError::Timeout { .. } | ApiError::Offline(_))
    }

    /// HTTP status carried by the error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } | ApiError::Parse { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns true when the server rejected the credentials.
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }
}

// == Store Error Enum ==
/// Failures of a persistent key-value store backing the cookie tier or the
/// token store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Value exceeds the store's per-entry size limit
    #[error("Value of {size} bytes exceeds limit of {limit} bytes")]
    TooLarge { size: usize, limit: usize },

    /// Backing file could not be read or written
    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Backing file holds something that is not valid store JSON
    #[error("Store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// == Result Type Alias ==
/// Convenience Result type for HTTP and cached-fetch operations.
pub type Result<T> = std::result::Result<T, ApiError>;
