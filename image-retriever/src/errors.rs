use embedding_service::EmbeddingError;
use thiserror::Error;
use vector_index::IndexError;

#[derive(Debug, Error)]
pub enum RetrieverError {
    /// Query could not be embedded; includes undecodable query images.
    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("vector index error: {0}")]
    Index(#[from] IndexError),

    #[error("top_k must be a positive integer")]
    InvalidTopK,

    #[error("query text is empty")]
    EmptyQuery,

    #[error("config error: {0}")]
    Config(String),
}
