use ai_llm_service::AiLlmError;
use embedding_service::EmbeddingError;
use image_ingest::IngestError;
use image_retriever::RetrieverError;
use query_translator::TranslatorError;
use thiserror::Error;
use vector_index::IndexError;

/// Startup and entry-point failures of the backend.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("embedding: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("vector index: {0}")]
    Index(#[from] IndexError),

    #[error("llm: {0}")]
    Llm(#[from] AiLlmError),

    #[error("translator: {0}")]
    Translator(#[from] TranslatorError),

    #[error("ingestion: {0}")]
    Ingest(#[from] IngestError),

    #[error("search: {0}")]
    Retriever(#[from] RetrieverError),
}
