use vector_index::DistanceKind;

use crate::errors::RetrieverError;

/// Cosine floor between a query and an image embedding. Unrelated CLIP
/// text/image pairs score below it, plain matches above.
pub const DEFAULT_MIN_SCORE: f32 = 0.2;

#[derive(Clone, Debug)]
pub struct RetrieverConfig {
    /// Requests above this `k` are clamped.
    pub max_k: usize,
    /// Relevance cut-off as a cosine similarity between unit vectors. `None`
    /// keeps every hit. For `Euclid` it is turned into the equivalent maximum
    /// distance.
    pub min_score: Option<f32>,
    /// Metric of the index; decides which direction of score is better.
    pub distance: DistanceKind,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            max_k: 100,
            min_score: Some(DEFAULT_MIN_SCORE),
            distance: DistanceKind::Cosine,
        }
    }
}

impl RetrieverConfig {
    /// Reads `RETRIEVER_MAX_K` and `RETRIEVER_MIN_SCORE`; `distance` keeps its
    /// default and is aligned with the index config by the caller.
    ///
    /// `RETRIEVER_MIN_SCORE=none` (or `off`) disables the floor.
    pub fn from_env() -> Result<Self, RetrieverError> {
        let d = Self::default();
        let max_k = match env_opt("RETRIEVER_MAX_K") {
            Some(v) => v
                .trim()
                .parse::<usize>()
                .map_err(|_| RetrieverError::Config(format!("RETRIEVER_MAX_K has invalid value {v:?}")))?,
            None => d.max_k,
        };
        let min_score = match env_opt("RETRIEVER_MIN_SCORE") {
            Some(v) => parse_min_score(&v)?,
            None => d.min_score,
        };
        let cfg = Self {
            max_k,
            min_score,
            distance: d.distance,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), RetrieverError> {
        if self.max_k == 0 {
            return Err(RetrieverError::Config("RETRIEVER_MAX_K must be > 0".into()));
        }
        if self.min_score.is_some_and(|s| !(-1.0..=1.0).contains(&s)) {
            return Err(RetrieverError::Config("RETRIEVER_MIN_SCORE must be within [-1, 1]".into()));
        }
        Ok(())
    }

    /// The floor in the index's own score unit: a similarity for `Cosine` and
    /// `Dot`, a maximum L2 distance for `Euclid`.
    pub fn score_cutoff(&self) -> Option<f32> {
        let floor = self.min_score?;
        Some(if self.distance.higher_is_better() {
            floor
        } else {
            (2.0 - 2.0 * floor).max(0.0).sqrt()
        })
    }
}

fn parse_min_score(v: &str) -> Result<Option<f32>, RetrieverError> {
    let v = v.trim();
    if matches!(v.to_ascii_lowercase().as_str(), "none" | "off") {
        return Ok(None);
    }
    v.parse::<f32>()
        .map(Some)
        .map_err(|_| RetrieverError::Config(format!("RETRIEVER_MIN_SCORE has invalid value {v:?}")))
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
