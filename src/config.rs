//! Process-wide configuration, assembled once at startup.

use ai_llm_service::LlmModelConfig;
use ai_llm_service::config::default_config::config_translator;
use embedding_service::EmbeddingConfig;
use image_ingest::IngestConfig;
use image_retriever::RetrieverConfig;
use query_translator::TranslatorConfig;
use tracing::warn;
use vector_index::IndexConfig;

use crate::errors::AppError;

/// Every component's settings in one place.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub embedding: EmbeddingConfig,
    pub index: IndexConfig,
    pub translator: TranslatorConfig,
    /// Model profile for the translator; `None` runs with translation disabled.
    pub llm: Option<LlmModelConfig>,
    pub ingest: IngestConfig,
    pub retriever: RetrieverConfig,
}

impl AppConfig {
    /// Loads all component configs from the environment.
    ///
    /// A missing or invalid LLM profile does not abort startup: it is logged
    /// and the translator falls back to raw queries.
    pub fn from_env() -> Result<Self, AppError> {
        let translator = TranslatorConfig::from_env()?;
        let llm = if translator.enabled {
            match config_translator() {
                Ok(c) => Some(c),
                Err(e) => {
                    warn!(error = %e, "translator model not configured, query translation disabled");
                    None
                }
            }
        } else {
            None
        };

        let cfg = Self {
            embedding: EmbeddingConfig::from_env()?,
            index: IndexConfig::from_env()?,
            translator,
            llm,
            ingest: IngestConfig::from_env()?,
            retriever: RetrieverConfig::from_env()?,
        };
        Ok(cfg.aligned())
    }

    /// Copies shared settings (metric, concurrency) into the components that
    /// need them.
    pub fn aligned(mut self) -> Self {
        self.ingest.distance = self.index.distance;
        self.ingest.concurrency = self.embedding.concurrency;
        self.retriever.distance = self.index.distance;
        self
    }

    pub fn validate(&self) -> Result<(), AppError> {
        self.embedding.validate()?;
        self.index.validate()?;
        self.translator.validate()?;
        if let Some(llm) = &self.llm {
            llm.validate()?;
        }
        self.ingest.validate()?;
        self.retriever.validate()?;
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            embedding: EmbeddingConfig::default(),
            index: IndexConfig::default(),
            translator: TranslatorConfig::default(),
            llm: None,
            ingest: IngestConfig::default(),
            retriever: RetrieverConfig::default(),
        }
        .aligned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vector_index::DistanceKind;

    #[test]
    fn aligned_propagates_metric_and_concurrency() {
        let mut cfg = AppConfig::default();
        cfg.index.distance = DistanceKind::Dot;
        cfg.embedding.concurrency = 9;
        let cfg = cfg.aligned();
        assert_eq!(cfg.ingest.distance, DistanceKind::Dot);
        assert_eq!(cfg.retriever.distance, DistanceKind::Dot);
        assert_eq!(cfg.ingest.concurrency, 9);
    }

    #[test]
    fn defaults_validate() {
        assert!(AppConfig::default().validate().is_ok());
    }
}
