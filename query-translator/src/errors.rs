use std::time::Duration;

use thiserror::Error;

/// Why a translation fell back to the raw query. Never surfaced as a failure.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TranslationUnavailable {
    #[error("translator disabled")]
    Disabled,

    #[error("model call timed out after {0:?}")]
    Timeout(Duration),

    #[error("model call failed: {0}")]
    Provider(String),

    #[error("malformed model output: {0}")]
    Malformed(String),

    #[error("model output introduced terms absent from the query: {0}")]
    Unfaithful(String),
}

/// Construction-time errors.
#[derive(Debug, Error)]
pub enum TranslatorError {
    #[error("config error: {0}")]
    Config(String),
}
