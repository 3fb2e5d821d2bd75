//! Error types.

use thiserror::Error;

/// Failure of a single HTTP fetch.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("HTTP status {0}")]
    Status(u16),
    #[error("transport error: {0}")]
    Transport(String),
}

/// Failure of the inference capability. Always absorbed by the standardizer.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("cannot reach inference server at {0}")]
    Connection(String),
    #[error("inference request timed out after {0}s")]
    Timeout(u64),
    #[error("inference server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("no usable model: {0}")]
    NoModel(String),
    #[error("malformed inference response: {0}")]
    Response(String),
}

/// Errors surfaced by harvest operations.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("invalid name tables: {0}")]
    Tables(String),

    #[error("invalid url {url}: {reason}")]
    Url { url: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, HarvestError>;
