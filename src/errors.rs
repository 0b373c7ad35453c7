//! Error types for ollamastream
//!
//! Every public operation either resolves with a typed value or fails with
//! a `ClientError` carrying a human-readable cause.

use thiserror::Error;

/// Main error type for the Ollama chat client
#[derive(Error, Debug)]
pub enum ClientError {
    /// Bad caller arguments, detected before anything reaches the network
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// HTTP client errors (connection refused, reset, TLS, ...)
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Non-2xx response or an error record emitted by the server
    #[error("Ollama API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    /// Transport failure while the response body was being consumed
    #[error("Streaming error: {0}")]
    StreamingError(String),

    /// Every record of a stream failed to decode
    #[error("Malformed stream: {failures} record(s) failed to decode and none succeeded")]
    MalformedStream { failures: usize },

    /// The logical call ran past its deadline
    #[error("Operation timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// The call was cancelled before the stream terminated
    #[error("Operation cancelled")]
    Cancelled,

    /// All retry attempts failed
    #[error("Chat failed after {attempts} attempt(s): {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: Box<ClientError>,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

impl ClientError {
    /// Whether a fresh attempt could plausibly succeed.
    ///
    /// Timeouts are terminal for the logical call and are never retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::HttpError(_) => true,
            ClientError::StreamingError(_) => true,
            ClientError::MalformedStream { .. } => true,
            ClientError::ApiError { status, .. } => {
                *status >= 500 || *status == 408 || *status == 429
            }

            ClientError::InvalidInput(_) => false,
            ClientError::Timeout { .. } => false,
            ClientError::Cancelled => false,
            ClientError::RetriesExhausted { .. } => false,
            ClientError::ConfigError(_) => false,
            ClientError::SerializationError(_) => false,
            ClientError::IoError(_) => false,
        }
    }

    /// Whether this error (or the last attempt it wraps) is a timeout
    pub fn is_timeout(&self) -> bool {
        match self {
            ClientError::Timeout { .. } => true,
            ClientError::RetriesExhausted { source, .. } => source.is_timeout(),
            _ => false,
        }
    }
}
