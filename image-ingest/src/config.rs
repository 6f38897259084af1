use vector_index::DistanceKind;

use crate::errors::IngestError;

/// Ingestion knobs.
#[derive(Clone, Debug)]
pub struct IngestConfig {
    /// Embedding calls in flight at once.
    pub concurrency: usize,
    /// Category for files placed directly in the root folder.
    pub root_category: String,
    /// Skip files whose stored content hash is unchanged.
    pub skip_unchanged: bool,
    /// Draw a progress bar on stderr.
    pub progress: bool,
    /// Metric used when the collection has to be created.
    pub distance: DistanceKind,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            root_category: "uncategorized".to_string(),
            skip_unchanged: true,
            progress: false,
            distance: DistanceKind::Cosine,
        }
    }
}

impl IngestConfig {
    /// Reads `EMBEDDING_CONCURRENCY`, `INGEST_ROOT_CATEGORY`,
    /// `INGEST_SKIP_UNCHANGED` and `INGEST_PROGRESS`.
    ///
    /// `distance` keeps its default; callers align it with the index config.
    pub fn from_env() -> Result<Self, IngestError> {
        let d = Self::default();
        let concurrency = match env_opt("EMBEDDING_CONCURRENCY") {
            Some(v) => v
                .trim()
                .parse::<usize>()
                .map_err(|_| IngestError::Config(format!("EMBEDDING_CONCURRENCY has invalid value {v:?}")))?,
            None => d.concurrency,
        };
        let cfg = Self {
            concurrency,
            root_category: env_opt("INGEST_ROOT_CATEGORY").unwrap_or(d.root_category),
            skip_unchanged: parse_bool("INGEST_SKIP_UNCHANGED", d.skip_unchanged)?,
            progress: parse_bool("INGEST_PROGRESS", d.progress)?,
            distance: d.distance,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), IngestError> {
        if self.concurrency == 0 {
            return Err(IngestError::Config("concurrency must be > 0".into()));
        }
        if self.root_category.trim().is_empty() {
            return Err(IngestError::Config("root category is empty".into()));
        }
        Ok(())
    }
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_bool(key: &str, dflt: bool) -> Result<bool, IngestError> {
    match env_opt(key).map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(dflt),
        Some(v) => match v.as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(IngestError::Config(format!("{key} must be a boolean, got {v:?}"))),
        },
    }
}
