//! One query end-to-end.

use std::sync::Arc;

use embedding_service::Embedder;
use query_translator::{QueryTranslator, Translation};
use tracing::{debug, info, instrument};
use vector_index::{CategoryFilter, IndexHit, VectorIndex};

use crate::config::RetrieverConfig;
use crate::errors::RetrieverError;
use crate::query::{SearchQuery, SearchResult};

/// Read-only search over the index. Holds shared handles only.
#[derive(Clone)]
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    translator: QueryTranslator,
    cfg: RetrieverConfig,
}

impl Retriever {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        translator: QueryTranslator,
        cfg: RetrieverConfig,
    ) -> Self {
        Self {
            embedder,
            index,
            translator,
            cfg,
        }
    }

    /// Rewrites a query without searching; never fails.
    pub async fn translate(&self, query: &str) -> Translation {
        self.translator.translate(query).await
    }

    /// Text search: translate, embed, search.
    ///
    /// A failed translation degrades to the raw query and is not an error.
    #[instrument(skip_all, fields(k = k, category = ?category))]
    pub async fn search_by_text(
        &self,
        query: &str,
        k: usize,
        category: Option<&str>,
    ) -> Result<Vec<SearchResult>, RetrieverError> {
        let k = self.check_k(k)?;
        if query.trim().is_empty() {
            return Err(RetrieverError::EmptyQuery);
        }
        let translation = self.translator.translate(query).await;
        debug!(text = %translation.text, fallback = translation.is_fallback(), "query text resolved");
        self.search_text_verbatim(&translation.text, k, category).await
    }

    /// Image search: embed the bytes and search. No translation step.
    ///
    /// Undecodable bytes fail with [`RetrieverError::Embedding`].
    #[instrument(skip_all, fields(k = k, category = ?category, bytes = image.len()))]
    pub async fn search_by_image(
        &self,
        image: &[u8],
        k: usize,
        category: Option<&str>,
    ) -> Result<Vec<SearchResult>, RetrieverError> {
        let k = self.check_k(k)?;
        let vector = self.embedder.embed_image(image).await?;
        self.search_vector(&vector, k, category).await
    }

    /// Dispatches on the query kind.
    pub async fn search(
        &self,
        query: &SearchQuery,
        k: usize,
        category: Option<&str>,
    ) -> Result<Vec<SearchResult>, RetrieverError> {
        match query {
            SearchQuery::Text(q) => self.search_by_text(q, k, category).await,
            SearchQuery::Translated(q) => {
                let k = self.check_k(k)?;
                self.search_text_verbatim(q, k, category).await
            }
            SearchQuery::Image(bytes) => self.search_by_image(bytes, k, category).await,
        }
    }

    async fn search_text_verbatim(
        &self,
        text: &str,
        k: usize,
        category: Option<&str>,
    ) -> Result<Vec<SearchResult>, RetrieverError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(RetrieverError::EmptyQuery);
        }
        let vector = self.embedder.embed_text(text).await?;
        self.search_vector(&vector, k, category).await
    }

    /// `k == 0` is rejected; larger values are clamped to `max_k`.
    fn check_k(&self, k: usize) -> Result<usize, RetrieverError> {
        if k == 0 {
            return Err(RetrieverError::InvalidTopK);
        }
        Ok(k.min(self.cfg.max_k))
    }

    async fn search_vector(
        &self,
        vector: &[f32],
        k: usize,
        category: Option<&str>,
    ) -> Result<Vec<SearchResult>, RetrieverError> {
        let filter = category.map(CategoryFilter::new);
        let hits = self.index.search(vector, k, filter.as_ref()).await?;
        let results = self.rank(hits, k);
        info!(
            collection = self.index.collection(),
            category = category.unwrap_or("*"),
            k,
            results = results.len(),
            "search completed"
        );
        Ok(results)
    }

    /// Applies the score cut-off, restores best-first order (stable, so the
    /// index's tie order survives) and assigns 1-based ranks.
    fn rank(&self, mut hits: Vec<IndexHit>, k: usize) -> Vec<SearchResult> {
        let higher_is_better = self.cfg.distance.higher_is_better();
        if let Some(cut) = self.cfg.score_cutoff() {
            hits.retain(|h| if higher_is_better { h.score >= cut } else { h.score <= cut });
        }
        hits.sort_by(|a, b| {
            if higher_is_better {
                b.score.total_cmp(&a.score)
            } else {
                a.score.total_cmp(&b.score)
            }
        });
        hits.truncate(k);

        hits.into_iter()
            .enumerate()
            .map(|(i, h)| SearchResult {
                id: h.id,
                filename: h.metadata.filename,
                path: h.metadata.path,
                category: h.metadata.category,
                score: h.score,
                rank: i + 1,
            })
            .collect()
    }
}
