//! Runtime and collection configuration.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::IndexError;

/// Distance function used for the vector space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DistanceKind {
    /// Cosine similarity (default; embeddings are L2-normalized).
    Cosine,
    /// Dot product.
    Dot,
    /// Euclidean distance (L2). Lower is closer.
    Euclid,
}

impl DistanceKind {
    /// Parse from env string (case-insensitive). Unknown values are an error
    /// so a typo never silently creates a collection with the wrong metric.
    pub fn parse(s: &str) -> Result<Self, IndexError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cosine" => Ok(DistanceKind::Cosine),
            "dot" | "dotproduct" => Ok(DistanceKind::Dot),
            "euclid" | "l2" => Ok(DistanceKind::Euclid),
            other => Err(IndexError::Config(format!("unknown distance {other:?}"))),
        }
    }

    /// `true` when larger scores mean closer vectors.
    pub fn higher_is_better(self) -> bool {
        !matches!(self, DistanceKind::Euclid)
    }
}

impl fmt::Display for DistanceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistanceKind::Cosine => f.write_str("Cosine"),
            DistanceKind::Dot => f.write_str("Dot"),
            DistanceKind::Euclid => f.write_str("Euclid"),
        }
    }
}

/// Describes the vector space of the collection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VectorSpace {
    /// Dimensionality of vectors.
    pub size: usize,
    /// Distance function.
    pub distance: DistanceKind,
}

impl fmt::Display for VectorSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "size={} distance={}", self.size, self.distance)
    }
}

/// Which store backs the index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndexBackend {
    Qdrant,
    Memory,
}

/// Configuration for the vector index.
#[derive(Clone, Debug)]
pub struct IndexConfig {
    /// Store implementation.
    pub backend: IndexBackend,
    /// Qdrant gRPC endpoint, e.g. `http://localhost:6334`.
    pub url: String,
    /// Optional API key for Qdrant Cloud.
    pub api_key: Option<String>,
    /// Target collection name.
    pub collection: String,
    /// Distance function (Cosine by default).
    pub distance: DistanceKind,
    /// Exact search flag (false = HNSW ANN).
    pub exact_search: bool,
    /// Health-check attempts before the store is declared unavailable.
    pub connect_retries: u32,
    /// Initial backoff between attempts; doubles after each failure.
    pub retry_backoff_ms: u64,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            backend: IndexBackend::Qdrant,
            url: "http://localhost:6334".to_string(),
            api_key: None,
            collection: "images".to_string(),
            distance: DistanceKind::Cosine,
            exact_search: false,
            connect_retries: 3,
            retry_backoff_ms: 250,
        }
    }
}

impl IndexConfig {
    /// Creates a default config for a given collection name and Qdrant endpoint.
    pub fn new_default(url: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            collection: collection.into(),
            ..Default::default()
        }
    }

    /// Build configuration from environment variables.
    ///
    /// - `VECTOR_BACKEND` (`qdrant` | `memory`, default `qdrant`)
    /// - `QDRANT_URL` (default: `http://localhost:6334`)
    /// - `QDRANT_API_KEY` (optional)
    /// - `QDRANT_COLLECTION` (default: `images`)
    /// - `QDRANT_DISTANCE` (`Cosine` | `Dot` | `Euclid`; default `Cosine`)
    /// - `QDRANT_EXACT_SEARCH` (default: false)
    /// - `QDRANT_CONNECT_RETRIES` (default: 3)
    /// - `QDRANT_RETRY_BACKOFF_MS` (default: 250)
    pub fn from_env() -> Result<Self, IndexError> {
        let d = Self::default();
        let backend = match env_opt("VECTOR_BACKEND").as_deref() {
            None => d.backend,
            Some(s) if s.eq_ignore_ascii_case("qdrant") => IndexBackend::Qdrant,
            Some(s) if s.eq_ignore_ascii_case("memory") => IndexBackend::Memory,
            Some(other) => {
                return Err(IndexError::Config(format!(
                    "VECTOR_BACKEND must be qdrant or memory, got {other:?}"
                )));
            }
        };
        let distance = match env_opt("QDRANT_DISTANCE") {
            Some(s) => DistanceKind::parse(&s)?,
            None => d.distance,
        };

        let cfg = Self {
            backend,
            url: env_opt("QDRANT_URL").unwrap_or(d.url),
            api_key: env_opt("QDRANT_API_KEY"),
            collection: env_opt("QDRANT_COLLECTION").unwrap_or(d.collection),
            distance,
            exact_search: parse_env("QDRANT_EXACT_SEARCH", d.exact_search)?,
            connect_retries: parse_env("QDRANT_CONNECT_RETRIES", d.connect_retries)?,
            retry_backoff_ms: parse_env("QDRANT_RETRY_BACKOFF_MS", d.retry_backoff_ms)?,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validates config values.
    pub fn validate(&self) -> Result<(), IndexError> {
        if self.backend == IndexBackend::Qdrant && self.url.trim().is_empty() {
            return Err(IndexError::Config("qdrant url is empty".into()));
        }
        if self.collection.trim().is_empty() {
            return Err(IndexError::Config("collection is empty".into()));
        }
        if self.connect_retries == 0 {
            return Err(IndexError::Config("connect_retries must be > 0".into()));
        }
        Ok(())
    }
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T: std::str::FromStr>(key: &str, dflt: T) -> Result<T, IndexError> {
    match env_opt(key) {
        Some(v) => v
            .trim()
            .parse::<T>()
            .map_err(|_| IndexError::Config(format!("{key} has invalid value {v:?}"))),
        None => Ok(dflt),
    }
}
