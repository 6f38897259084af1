//! Process state: every long-lived handle, created once and torn down once.

use std::path::Path;
use std::sync::Arc;

use ai_llm_service::LlmClient;
use embedding_service::{ClipHttpEmbedder, Embedder};
use image_ingest::{ImageIngestor, IngestionReport};
use image_retriever::{Retriever, SearchResult};
use query_translator::{QueryTranslator, Translation};
use tracing::info;
use vector_index::VectorIndex;

use crate::config::AppConfig;
use crate::errors::AppError;

/// Shared handles for ingestion and search.
pub struct AppState {
    cfg: AppConfig,
    index: Arc<dyn VectorIndex>,
    retriever: Retriever,
    ingestor: ImageIngestor,
}

impl AppState {
    /// Validates `cfg`, builds the embedder, connects the index (with the
    /// configured retry policy) and builds the translator.
    ///
    /// # Errors
    /// Fails on invalid config or when the index stays unreachable.
    pub async fn init(cfg: AppConfig) -> Result<Self, AppError> {
        cfg.validate()?;

        let embedder: Arc<dyn Embedder> = Arc::new(ClipHttpEmbedder::new(cfg.embedding.clone())?);
        let index = vector_index::open(cfg.index.clone()).await?;
        let translator = match (&cfg.llm, cfg.translator.enabled) {
            (Some(llm), true) => {
                let client = LlmClient::new(llm.clone())?;
                QueryTranslator::new(Arc::new(client), cfg.translator.clone())
            }
            _ => QueryTranslator::disabled(),
        };

        info!(
            embedding_model = %cfg.embedding.model,
            dim = embedder.dim(),
            collection = index.collection(),
            translator = cfg.llm.as_ref().map(|l| l.model.as_str()).unwrap_or("disabled"),
            "app state ready"
        );
        Ok(Self::from_parts(cfg, embedder, index, translator))
    }

    /// Wires already-built components; used with fakes in tests.
    pub fn from_parts(
        cfg: AppConfig,
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        translator: QueryTranslator,
    ) -> Self {
        let cfg = cfg.aligned();
        let retriever = Retriever::new(
            embedder.clone(),
            index.clone(),
            translator,
            cfg.retriever.clone(),
        );
        let ingestor = ImageIngestor::new(embedder, index.clone(), cfg.ingest.clone());
        Self {
            cfg,
            index,
            retriever,
            ingestor,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.cfg
    }

    pub fn index(&self) -> &Arc<dyn VectorIndex> {
        &self.index
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    /// Rewritten query text (raw query on fallback).
    pub async fn translate(&self, query: &str) -> String {
        self.retriever.translate(query).await.text
    }

    /// Rewritten query together with how it was produced.
    pub async fn translate_detailed(&self, query: &str) -> Translation {
        self.retriever.translate(query).await
    }

    pub async fn search_by_text(
        &self,
        query: &str,
        k: usize,
        category: Option<&str>,
    ) -> Result<Vec<SearchResult>, AppError> {
        Ok(self.retriever.search_by_text(query, k, category).await?)
    }

    pub async fn search_by_image(
        &self,
        image: &[u8],
        k: usize,
        category: Option<&str>,
    ) -> Result<Vec<SearchResult>, AppError> {
        Ok(self.retriever.search_by_image(image, k, category).await?)
    }

    pub async fn ingest(&self, folder: impl AsRef<Path>) -> Result<IngestionReport, AppError> {
        Ok(self.ingestor.ingest(folder).await?)
    }

    /// Releases the index connection.
    pub async fn shutdown(self) -> Result<(), AppError> {
        self.index.close().await?;
        info!("app state shut down");
        Ok(())
    }
}
