//! CLIP inference server client.
//!
//! Endpoints, relative to `EmbeddingConfig::endpoint`:
//! - `POST /embed/text`  — JSON `{ "model", "input" }` → `{ "embedding": [f32] }`
//! - `POST /embed/image?model=<model>` — PNG body → `{ "embedding": [f32] }`
//!
//! The server is a black box: this client only enforces the output contract
//! (dimension, finiteness) and L2-normalizes what it receives.

use std::time::{Duration, Instant};

use futures::FutureExt;
use futures::future::BoxFuture;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::config::EmbeddingConfig;
use crate::embedder::Embedder;
use crate::errors::EmbeddingError;
use crate::preprocess::canonical_png;
use crate::vector_math::l2_normalize;

/// Max characters kept from an upstream error body.
const SNIPPET_MAX_CHARS: usize = 240;

/// HTTP-backed CLIP embedder.
#[derive(Clone, Debug)]
pub struct ClipHttpEmbedder {
    client: reqwest::Client,
    cfg: EmbeddingConfig,
    url_text: String,
    url_image: String,
}

impl ClipHttpEmbedder {
    /// Creates a new embedder from configuration.
    ///
    /// # Errors
    /// - [`EmbeddingError::Config`] if the config is invalid
    /// - [`EmbeddingError::Transport`] if the HTTP client cannot be built
    pub fn new(cfg: EmbeddingConfig) -> Result<Self, EmbeddingError> {
        cfg.validate()?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .gzip(true)
            .build()?;

        let base = cfg.endpoint.trim().trim_end_matches('/').to_string();
        Ok(Self {
            client,
            url_text: format!("{base}/embed/text"),
            url_image: format!("{base}/embed/image"),
            cfg,
        })
    }

    pub fn config(&self) -> &EmbeddingConfig {
        &self.cfg
    }

    #[instrument(skip_all, fields(model = %self.cfg.model))]
    async fn text_vector(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let input = text.trim();
        if input.is_empty() {
            return Err(EmbeddingError::EmptyInput);
        }

        let started = Instant::now();
        debug!(input_len = input.len(), "POST {}", self.url_text);
        let resp = self
            .client
            .post(&self.url_text)
            .json(&TextRequest {
                model: &self.cfg.model,
                input,
            })
            .send()
            .await?;

        let v = self.read_vector(resp, &self.url_text).await?;
        debug!(latency_ms = started.elapsed().as_millis(), "text embedding completed");
        Ok(v)
    }

    #[instrument(skip_all, fields(model = %self.cfg.model, bytes = bytes.len()))]
    async fn image_vector(&self, bytes: &[u8]) -> Result<Vec<f32>, EmbeddingError> {
        let owned = bytes.to_vec();
        let side = self.cfg.image_size;
        // Decoding and resizing are CPU-bound; keep them off the async workers.
        let png = tokio::task::spawn_blocking(move || canonical_png(&owned, side))
            .await
            .map_err(|e| EmbeddingError::Internal(format!("preprocess task: {e}")))??;

        let started = Instant::now();
        debug!(png_len = png.len(), "POST {}", self.url_image);
        let resp = self
            .client
            .post(&self.url_image)
            .query(&[("model", self.cfg.model.as_str())])
            .header(CONTENT_TYPE, "image/png")
            .body(png)
            .send()
            .await?;

        let v = self.read_vector(resp, &self.url_image).await?;
        debug!(latency_ms = started.elapsed().as_millis(), "image embedding completed");
        Ok(v)
    }

    /// Checks status, decodes the body, then enforces dimension and norm.
    async fn read_vector(
        &self,
        resp: reqwest::Response,
        url: &str,
    ) -> Result<Vec<f32>, EmbeddingError> {
        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(EmbeddingError::HttpStatus {
                status,
                url: url.to_string(),
                snippet: text.chars().take(SNIPPET_MAX_CHARS).collect(),
            });
        }

        let out: EmbeddingResponse = resp.json().await.map_err(|e| {
            EmbeddingError::InvalidResponse(format!(
                "serde error: {e}; expected `{{ embedding: number[] }}`"
            ))
        })?;

        finalize(out.embedding, self.cfg.dim)
    }
}

/// Dimension check + L2 normalization of a raw model output.
fn finalize(mut v: Vec<f32>, want: usize) -> Result<Vec<f32>, EmbeddingError> {
    if v.len() != want {
        return Err(EmbeddingError::DimensionMismatch { got: v.len(), want });
    }
    l2_normalize(&mut v)?;
    Ok(v)
}

impl Embedder for ClipHttpEmbedder {
    fn embed_text<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Vec<f32>, EmbeddingError>> {
        self.text_vector(text).boxed()
    }

    fn embed_image<'a>(
        &'a self,
        bytes: &'a [u8],
    ) -> BoxFuture<'a, Result<Vec<f32>, EmbeddingError>> {
        self.image_vector(bytes).boxed()
    }

    fn dim(&self) -> usize {
        self.cfg.dim
    }
}

/* ==========================
HTTP payloads
========================== */

#[derive(Debug, Serialize)]
struct TextRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    #[serde(alias = "vector")]
    embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finalize_checks_dimension() {
        let err = finalize(vec![1.0, 0.0], 3).unwrap_err();
        assert!(matches!(
            err,
            EmbeddingError::DimensionMismatch { got: 2, want: 3 }
        ));
    }

    #[test]
    fn finalize_normalizes() {
        let v = finalize(vec![0.0, 2.0, 0.0], 3).unwrap();
        assert_eq!(v, vec![0.0, 1.0, 0.0]);
    }

    #[test]
    fn response_accepts_vector_alias() {
        let r: EmbeddingResponse = serde_json::from_str(r#"{"vector":[0.5,0.5]}"#).unwrap();
        assert_eq!(r.embedding.len(), 2);
    }

    #[test]
    fn urls_are_derived_from_endpoint() {
        let e = ClipHttpEmbedder::new(EmbeddingConfig {
            endpoint: "http://clip:7997/".into(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(e.url_text, "http://clip:7997/embed/text");
        assert_eq!(e.url_image, "http://clip:7997/embed/image");
        assert_eq!(e.dim(), 512);
    }

    #[tokio::test]
    async fn corrupt_image_fails_before_any_request() {
        // Port 9 (discard) would fail on connect; a Decode error proves no
        // request was attempted.
        let e = ClipHttpEmbedder::new(EmbeddingConfig {
            endpoint: "http://127.0.0.1:9".into(),
            ..Default::default()
        })
        .unwrap();
        let err = e.embed_image(b"\x89PNG broken").await.unwrap_err();
        assert!(matches!(err, EmbeddingError::Decode(_)));
        assert!(err.is_input_error());
    }

    #[tokio::test]
    async fn blank_text_is_rejected_locally() {
        let e = ClipHttpEmbedder::new(EmbeddingConfig::default()).unwrap();
        assert!(matches!(
            e.embed_text("   ").await,
            Err(EmbeddingError::EmptyInput)
        ));
    }
}
