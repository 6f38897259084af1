//! Embedding backend configuration.

use crate::errors::EmbeddingError;

/// Settings for the CLIP inference endpoint.
#[derive(Clone, Debug, PartialEq)]
pub struct EmbeddingConfig {
    /// Base URL of the inference server, e.g. `http://localhost:7997`.
    pub endpoint: String,
    /// Model identifier forwarded to the server (e.g. `clip-vit-b-32`).
    pub model: String,
    /// Output dimensionality; every vector is checked against it.
    pub dim: usize,
    /// Longest image side (pixels) after preprocessing.
    pub image_size: u32,
    /// Per-request HTTP timeout.
    pub timeout_secs: u64,
    /// Max concurrent embedding calls during batch work.
    pub concurrency: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:7997".to_string(),
            model: "clip-vit-b-32".to_string(),
            dim: 512,
            image_size: 224,
            timeout_secs: 30,
            concurrency: 4,
        }
    }
}

impl EmbeddingConfig {
    /// Build from environment variables, falling back to [`Default`] values.
    ///
    /// - `EMBEDDING_URL`
    /// - `EMBEDDING_MODEL`
    /// - `EMBEDDING_DIM`
    /// - `EMBEDDING_IMAGE_SIZE`
    /// - `EMBEDDING_TIMEOUT_SECS`
    /// - `EMBEDDING_CONCURRENCY`
    ///
    /// # Errors
    /// Returns [`EmbeddingError::Config`] if a variable is set but unparsable,
    /// or if the resulting config fails [`EmbeddingConfig::validate`].
    pub fn from_env() -> Result<Self, EmbeddingError> {
        let d = Self::default();
        let cfg = Self {
            endpoint: env_or("EMBEDDING_URL", d.endpoint),
            model: env_or("EMBEDDING_MODEL", d.model),
            dim: parse_env("EMBEDDING_DIM", d.dim)?,
            image_size: parse_env("EMBEDDING_IMAGE_SIZE", d.image_size)?,
            timeout_secs: parse_env("EMBEDDING_TIMEOUT_SECS", d.timeout_secs)?,
            concurrency: parse_env("EMBEDDING_CONCURRENCY", d.concurrency)?,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validates config values.
    pub fn validate(&self) -> Result<(), EmbeddingError> {
        let ep = self.endpoint.trim();
        if !(ep.starts_with("http://") || ep.starts_with("https://")) {
            return Err(EmbeddingError::Config(format!(
                "EMBEDDING_URL must start with http:// or https://, got {ep:?}"
            )));
        }
        if self.model.trim().is_empty() {
            return Err(EmbeddingError::Config("EMBEDDING_MODEL is empty".into()));
        }
        if self.dim == 0 {
            return Err(EmbeddingError::Config("EMBEDDING_DIM must be > 0".into()));
        }
        if self.image_size < 16 {
            return Err(EmbeddingError::Config(
                "EMBEDDING_IMAGE_SIZE must be >= 16".into(),
            ));
        }
        if self.concurrency == 0 {
            return Err(EmbeddingError::Config(
                "EMBEDDING_CONCURRENCY must be > 0".into(),
            ));
        }
        Ok(())
    }
}

fn env_or(key: &str, dflt: String) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or(dflt)
}

fn parse_env<T: std::str::FromStr>(key: &str, dflt: T) -> Result<T, EmbeddingError> {
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => v
            .trim()
            .parse::<T>()
            .map_err(|_| EmbeddingError::Config(format!("{key} has invalid value {v:?}"))),
        _ => Ok(dflt),
    }
}
