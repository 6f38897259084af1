//! Unified error types for the crate.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors produced while computing embeddings.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// Input bytes are not a decodable image.
    #[error("image decode error: {0}")]
    Decode(String),

    /// Empty text input.
    #[error("embedding input is empty")]
    EmptyInput,

    /// Transport/HTTP client error.
    #[error("embedding transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-successful HTTP status from the inference server.
    #[error("embedding server returned HTTP {status} from {url}: {snippet}")]
    HttpStatus {
        status: StatusCode,
        url: String,
        snippet: String,
    },

    /// Response body could not be parsed.
    #[error("invalid embedding response: {0}")]
    InvalidResponse(String),

    /// Returned vector has the wrong dimensionality.
    #[error("embedding dimension mismatch: got {got}, want {want}")]
    DimensionMismatch { got: usize, want: usize },

    /// Returned vector is zero or contains non-finite values.
    #[error("embedding vector is not normalizable: {0}")]
    InvalidVector(String),

    /// Invalid or unsupported configuration.
    #[error("embedding config error: {0}")]
    Config(String),

    /// Background task failure (panicked or cancelled preprocessing).
    #[error("internal: {0}")]
    Internal(String),
}

impl EmbeddingError {
    /// `true` when the failure is caused by the input itself rather than the
    /// service; such errors are never worth retrying.
    pub fn is_input_error(&self) -> bool {
        matches!(self, EmbeddingError::Decode(_) | EmbeddingError::EmptyInput)
    }
}
