//! The vector index seam.

use futures::FutureExt;
use futures::future::BoxFuture;

use crate::config::VectorSpace;
use crate::errors::IndexError;
use crate::record::{CategoryFilter, ImageMetadata, IndexHit, IndexRecord};

/// Nearest-neighbor store holding the authoritative copy of all image records.
///
/// Implementations are shared behind `Arc` and must be safe for concurrent use.
pub trait VectorIndex: Send + Sync {
    /// Name of the collection this client is bound to.
    fn collection(&self) -> &str;

    /// Creates the collection if missing.
    ///
    /// No-op when it exists with the same `space`; fails with
    /// [`IndexError::SchemaMismatch`] when size or metric differ.
    fn ensure_collection<'a>(&'a self, space: &'a VectorSpace) -> BoxFuture<'a, Result<(), IndexError>>;

    /// Inserts or replaces the record with `record.id`.
    fn upsert(&self, record: IndexRecord) -> BoxFuture<'_, Result<(), IndexError>>;

    /// Upserts several records; returns how many were written.
    fn upsert_batch(&self, records: Vec<IndexRecord>) -> BoxFuture<'_, Result<usize, IndexError>> {
        async move {
            let n = records.len();
            for r in records {
                self.upsert(r).await?;
            }
            Ok(n)
        }
        .boxed()
    }

    /// Returns at most `k` hits, best first, ties in insertion order.
    fn search<'a>(
        &'a self,
        vector: &'a [f32],
        k: usize,
        filter: Option<&'a CategoryFilter>,
    ) -> BoxFuture<'a, Result<Vec<IndexHit>, IndexError>>;

    /// Metadata of the record with `id`, if present.
    fn get<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<Option<ImageMetadata>, IndexError>>;

    /// Number of records in the collection.
    fn count(&self) -> BoxFuture<'_, Result<u64, IndexError>>;

    /// Releases the connection; later calls fail with `Unavailable`.
    fn close(&self) -> BoxFuture<'_, Result<(), IndexError>>;
}

/// Orders hits best-first, breaking score ties by insertion sequence.
///
/// Records without a sequence sort after those with one.
pub(crate) fn rank_hits(hits: &mut [IndexHit], higher_is_better: bool) {
    hits.sort_by(|a, b| {
        let by_score = if higher_is_better {
            b.score.total_cmp(&a.score)
        } else {
            a.score.total_cmp(&b.score)
        };
        by_score.then_with(|| {
            let sa = a.metadata.indexed_seq.unwrap_or(u64::MAX);
            let sb = b.metadata.indexed_seq.unwrap_or(u64::MAX);
            sa.cmp(&sb)
        })
    });
}

/// `true` when the score at rank `k` equals the worst score of a batch that
/// filled its `limit`: further records with that score may exist past the
/// limit and one of them may have been inserted earlier.
///
/// `ranked` must already be ordered by [`rank_hits`]; `fetched` is the number
/// of points the backend returned before any were discarded.
pub(crate) fn tie_crosses_limit(ranked: &[IndexHit], k: usize, fetched: usize, limit: usize) -> bool {
    if fetched < limit || k == 0 {
        return false;
    }
    match (ranked.get(k - 1), ranked.last()) {
        (Some(kth), Some(last)) => kth.score.total_cmp(&last.score).is_eq(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(id: &str, score: f32, seq: Option<u64>) -> IndexHit {
        IndexHit {
            id: id.into(),
            score,
            metadata: ImageMetadata {
                filename: format!("{id}.jpg"),
                path: format!("/img/{id}.jpg"),
                category: "c".into(),
                content_hash: None,
                indexed_seq: seq,
            },
        }
    }

    #[test]
    fn ties_go_to_first_inserted() {
        let mut hits = vec![
            hit("late", 0.9, Some(7)),
            hit("best", 0.95, Some(9)),
            hit("early", 0.9, Some(2)),
            hit("unknown", 0.9, None),
        ];
        rank_hits(&mut hits, true);
        let ids: Vec<_> = hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, ["best", "early", "late", "unknown"]);
    }

    #[test]
    fn tie_at_the_cut_reaching_the_limit_needs_a_wider_fetch() {
        let mut hits = vec![
            hit("top", 0.99, Some(5)),
            hit("tie_b", 0.8, Some(9)),
            hit("tie_a", 0.8, Some(4)),
        ];
        rank_hits(&mut hits, true);
        assert!(tie_crosses_limit(&hits, 2, 3, 3));
        // Server returned fewer points than asked: nothing is hidden.
        assert!(!tie_crosses_limit(&hits, 2, 3, 4));
    }

    #[test]
    fn over_fetched_ties_are_trimmed_to_first_inserted() {
        // Backend cut happened to return the later record first.
        let mut hits = vec![
            hit("late", 0.7, Some(8)),
            hit("early", 0.7, Some(1)),
            hit("weaker", 0.2, Some(0)),
        ];
        rank_hits(&mut hits, true);
        assert!(!tie_crosses_limit(&hits, 1, 3, 3));
        hits.truncate(1);
        assert_eq!(hits[0].id, "early");
    }

    #[test]
    fn euclid_sorts_ascending() {
        let mut hits = vec![hit("far", 3.0, Some(1)), hit("near", 0.5, Some(2))];
        rank_hits(&mut hits, false);
        assert_eq!(hits[0].id, "near");
    }
}
