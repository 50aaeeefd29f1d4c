//! Error types for remote API and codec operations.

use thiserror::Error;

/// Errors surfaced by an [`ArtifactManager`](crate::ArtifactManager) implementation.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The request never produced a response (connection, DNS, timeout).
    #[error("transport error: {0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("request failed with status {status}: {message}")]
    Status {
        /// HTTP status code returned by the service
        status: u16,
        /// Message extracted from the error body
        message: String,
    },

    /// The response body could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Anything else.
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type for remote API operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors produced while encoding or decoding part payloads.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// The payload is not valid base64.
    #[error("invalid base64 payload: {0}")]
    InvalidBase64(String),

    /// The decoded bytes are not valid UTF-8 text.
    #[error("decoded payload is not valid UTF-8: {0}")]
    InvalidUtf8(String),
}

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;
