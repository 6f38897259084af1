//! Exact in-process index.
//!
//! Records live in insertion-ordered slots; replacing a record keeps its slot,
//! so the slot position doubles as the tie-break sequence.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::config::{DistanceKind, VectorSpace};
use crate::errors::IndexError;
use crate::index::{VectorIndex, rank_hits};
use crate::record::{CategoryFilter, ImageMetadata, IndexHit, IndexRecord};

#[derive(Default)]
struct State {
    space: Option<VectorSpace>,
    slots: Vec<IndexRecord>,
    by_id: HashMap<String, usize>,
}

/// Brute-force index kept in memory. Contents vanish with the value.
pub struct MemoryIndex {
    collection: String,
    state: RwLock<State>,
    closed: AtomicBool,
}

impl MemoryIndex {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            state: RwLock::new(State::default()),
            closed: AtomicBool::new(false),
        }
    }

    fn check_open(&self) -> Result<(), IndexError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(IndexError::Unavailable("index closed".into()));
        }
        Ok(())
    }

    async fn do_ensure(&self, space: &VectorSpace) -> Result<(), IndexError> {
        self.check_open()?;
        let mut st = self.state.write().await;
        match st.space {
            Some(existing) if existing == *space => Ok(()),
            Some(existing) => Err(IndexError::SchemaMismatch {
                collection: self.collection.clone(),
                expected: *space,
                found: existing.to_string(),
            }),
            None => {
                info!(collection = %self.collection, %space, "memory collection created");
                st.space = Some(*space);
                Ok(())
            }
        }
    }

    async fn do_upsert(&self, mut record: IndexRecord) -> Result<(), IndexError> {
        self.check_open()?;
        let mut st = self.state.write().await;
        let space = st
            .space
            .ok_or_else(|| IndexError::CollectionMissing(self.collection.clone()))?;
        if record.vector.len() != space.size {
            return Err(IndexError::VectorSizeMismatch {
                got: record.vector.len(),
                want: space.size,
            });
        }

        match st.by_id.get(&record.id).copied() {
            Some(slot) => {
                record.metadata.indexed_seq = Some(slot as u64);
                st.slots[slot] = record;
                debug!(slot, "memory record replaced");
            }
            None => {
                let slot = st.slots.len();
                record.metadata.indexed_seq = Some(slot as u64);
                st.by_id.insert(record.id.clone(), slot);
                st.slots.push(record);
            }
        }
        Ok(())
    }

    async fn do_search(
        &self,
        vector: &[f32],
        k: usize,
        filter: Option<&CategoryFilter>,
    ) -> Result<Vec<IndexHit>, IndexError> {
        self.check_open()?;
        let st = self.state.read().await;
        let space = st
            .space
            .ok_or_else(|| IndexError::CollectionMissing(self.collection.clone()))?;
        if vector.len() != space.size {
            return Err(IndexError::VectorSizeMismatch {
                got: vector.len(),
                want: space.size,
            });
        }
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut hits: Vec<IndexHit> = st
            .slots
            .iter()
            .filter(|r| filter.is_none_or(|f| f.matches(&r.metadata)))
            .map(|r| IndexHit {
                id: r.id.clone(),
                score: score(space.distance, vector, &r.vector),
                metadata: r.metadata.clone(),
            })
            .collect();

        rank_hits(&mut hits, space.distance.higher_is_better());
        hits.truncate(k);
        Ok(hits)
    }
}

impl VectorIndex for MemoryIndex {
    fn collection(&self) -> &str {
        &self.collection
    }

    fn ensure_collection<'a>(&'a self, space: &'a VectorSpace) -> BoxFuture<'a, Result<(), IndexError>> {
        self.do_ensure(space).boxed()
    }

    fn upsert(&self, record: IndexRecord) -> BoxFuture<'_, Result<(), IndexError>> {
        self.do_upsert(record).boxed()
    }

    fn search<'a>(
        &'a self,
        vector: &'a [f32],
        k: usize,
        filter: Option<&'a CategoryFilter>,
    ) -> BoxFuture<'a, Result<Vec<IndexHit>, IndexError>> {
        self.do_search(vector, k, filter).boxed()
    }

    fn get<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<Option<ImageMetadata>, IndexError>> {
        async move {
            self.check_open()?;
            let st = self.state.read().await;
            Ok(st.by_id.get(id).map(|&slot| st.slots[slot].metadata.clone()))
        }
        .boxed()
    }

    fn count(&self) -> BoxFuture<'_, Result<u64, IndexError>> {
        async move {
            self.check_open()?;
            Ok(self.state.read().await.slots.len() as u64)
        }
        .boxed()
    }

    fn close(&self) -> BoxFuture<'_, Result<(), IndexError>> {
        async move {
            self.closed.store(true, Ordering::Release);
            Ok(())
        }
        .boxed()
    }
}

/// Similarity under `distance`: cosine and dot are larger-is-closer, Euclid is
/// the plain L2 distance (smaller-is-closer), matching Qdrant's scores.
fn score(distance: DistanceKind, a: &[f32], b: &[f32]) -> f32 {
    match distance {
        DistanceKind::Dot => dot(a, b),
        DistanceKind::Cosine => {
            let na = dot(a, a).sqrt();
            let nb = dot(b, b).sqrt();
            if na == 0.0 || nb == 0.0 {
                0.0
            } else {
                dot(a, b) / (na * nb)
            }
        }
        DistanceKind::Euclid => a
            .iter()
            .zip(b)
            .map(|(x, y)| (x - y) * (x - y))
            .sum::<f32>()
            .sqrt(),
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn space(size: usize) -> VectorSpace {
        VectorSpace {
            size,
            distance: DistanceKind::Cosine,
        }
    }

    fn rec(id: &str, category: &str, vector: Vec<f32>) -> IndexRecord {
        IndexRecord {
            id: id.into(),
            vector,
            metadata: ImageMetadata {
                filename: format!("{id}.png"),
                path: format!("/data/{category}/{id}.png"),
                category: category.into(),
                content_hash: None,
                indexed_seq: None,
            },
        }
    }

    async fn seeded() -> MemoryIndex {
        let idx = MemoryIndex::new("test");
        idx.ensure_collection(&space(2)).await.unwrap();
        idx.upsert(rec("a", "cats", vec![1.0, 0.0])).await.unwrap();
        idx.upsert(rec("b", "dogs", vec![0.0, 1.0])).await.unwrap();
        idx.upsert(rec("c", "cats", vec![0.7, 0.7])).await.unwrap();
        idx
    }

    #[tokio::test]
    async fn ensure_collection_is_idempotent_and_checks_schema() {
        let idx = MemoryIndex::new("test");
        idx.ensure_collection(&space(4)).await.unwrap();
        idx.ensure_collection(&space(4)).await.unwrap();

        let err = idx.ensure_collection(&space(8)).await.unwrap_err();
        assert!(matches!(err, IndexError::SchemaMismatch { .. }));

        let dot = VectorSpace {
            size: 4,
            distance: DistanceKind::Dot,
        };
        assert!(matches!(
            idx.ensure_collection(&dot).await,
            Err(IndexError::SchemaMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn upsert_before_collection_fails() {
        let idx = MemoryIndex::new("test");
        let err = idx.upsert(rec("a", "cats", vec![1.0, 0.0])).await.unwrap_err();
        assert!(matches!(err, IndexError::CollectionMissing(_)));
    }

    #[tokio::test]
    async fn upsert_replaces_by_id() {
        let idx = seeded().await;
        assert_eq!(idx.count().await.unwrap(), 3);

        idx.upsert(rec("a", "birds", vec![0.0, 1.0])).await.unwrap();
        assert_eq!(idx.count().await.unwrap(), 3);

        let meta = idx.get("a").await.unwrap().unwrap();
        assert_eq!(meta.category, "birds");
        assert_eq!(meta.indexed_seq, Some(0));
    }

    #[tokio::test]
    async fn wrong_dimension_is_rejected() {
        let idx = seeded().await;
        let err = idx.upsert(rec("x", "cats", vec![1.0, 0.0, 0.0])).await.unwrap_err();
        assert!(matches!(err, IndexError::VectorSizeMismatch { got: 3, want: 2 }));
        assert!(idx.search(&[1.0], 3, None).await.is_err());
    }

    #[tokio::test]
    async fn search_orders_and_limits() {
        let idx = seeded().await;
        let hits = idx.search(&[1.0, 0.0], 2, None).await.unwrap();
        let ids: Vec<_> = hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, ["a", "c"]);
        assert!(hits[0].score >= hits[1].score);
        assert!((hits[0].score - 1.0).abs() < 1e-6);

        assert!(idx.search(&[1.0, 0.0], 0, None).await.unwrap().is_empty());
        assert_eq!(idx.search(&[1.0, 0.0], 50, None).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn category_filter_is_exact() {
        let idx = seeded().await;
        let f = CategoryFilter::new("dogs");
        let hits = idx.search(&[1.0, 0.0], 10, Some(&f)).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].metadata.category, "dogs");

        let none = CategoryFilter::new("Dogs");
        assert!(idx.search(&[1.0, 0.0], 10, Some(&none)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn equal_scores_keep_insertion_order() {
        let idx = MemoryIndex::new("test");
        idx.ensure_collection(&space(2)).await.unwrap();
        for id in ["first", "second", "third"] {
            idx.upsert(rec(id, "same", vec![0.0, 1.0])).await.unwrap();
        }
        // Re-upserting the first record must not move it behind the others.
        idx.upsert(rec("first", "same", vec![0.0, 1.0])).await.unwrap();

        let hits = idx.search(&[0.0, 1.0], 3, None).await.unwrap();
        let ids: Vec<_> = hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, ["first", "second", "third"]);
    }

    #[tokio::test]
    async fn euclid_returns_nearest_first() {
        let idx = MemoryIndex::new("test");
        let l2 = VectorSpace {
            size: 2,
            distance: DistanceKind::Euclid,
        };
        idx.ensure_collection(&l2).await.unwrap();
        idx.upsert(rec("far", "x", vec![5.0, 5.0])).await.unwrap();
        idx.upsert(rec("near", "x", vec![1.0, 1.0])).await.unwrap();

        let hits = idx.search(&[1.0, 1.0], 2, None).await.unwrap();
        assert_eq!(hits[0].id, "near");
        assert_eq!(hits[0].score, 0.0);
    }

    #[tokio::test]
    async fn closed_index_is_unavailable() {
        let idx = seeded().await;
        idx.close().await.unwrap();
        assert!(matches!(idx.count().await, Err(IndexError::Unavailable(_))));
        assert!(matches!(
            idx.search(&[1.0, 0.0], 1, None).await,
            Err(IndexError::Unavailable(_))
        ));
    }
}
