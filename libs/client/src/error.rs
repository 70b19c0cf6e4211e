//! Custom error types for the client library

use thiserror::Error;

/// Custom error type for client operations
#[derive(Error, Debug)]
pub enum ClientError {
    /// Transport-level HTTP failure
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx response carrying the server's error code
    #[error("API error {status}: {code}")]
    Api { status: u16, code: String },

    /// Client-local storage failure
    #[error("Local storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// Malformed JSON payload
    #[error("Malformed payload: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Type alias for client results
pub type ClientResult<T> = Result<T, ClientError>;
