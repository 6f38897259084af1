//! Thin adapter around `qdrant-client` implementing [`VectorIndex`].
//!
//! All Qdrant interactions live here, hiding the verbose builder pattern and
//! keeping the rest of the pipeline decoupled from `qdrant-client`.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use futures::FutureExt;
use futures::future::BoxFuture;
use qdrant_client::qdrant::vectors_config::Config as VectorsConfigKind;
use qdrant_client::qdrant::{
    CountPointsBuilder, CreateCollectionBuilder, CreateFieldIndexCollectionBuilder, Distance,
    FieldType, GetCollectionInfoResponse, GetPointsBuilder, PointId, PointStruct,
    SearchParamsBuilder, SearchPointsBuilder, UpsertPointsBuilder, VectorParamsBuilder,
    point_id::PointIdOptions,
};
use qdrant_client::{Qdrant, QdrantError};
use tracing::{debug, info, instrument, warn};

use crate::config::{DistanceKind, IndexConfig, VectorSpace};
use crate::errors::IndexError;
use crate::filters::{CATEGORY_FIELD, to_qdrant_filter};
use crate::index::{VectorIndex, rank_hits, tie_crosses_limit};
use crate::payload::{from_payload, to_payload};
use crate::record::{CategoryFilter, ImageMetadata, IndexHit, IndexRecord};

/// Points requested past `k` on the first search round.
const TIE_MARGIN: usize = 16;
/// Upper bound on extra points scanned while widening for a boundary tie.
const MAX_TIE_SCAN: usize = 1024;

/// Qdrant-backed index bound to one collection.
pub struct QdrantIndex {
    client: Qdrant,
    cfg: IndexConfig,
    last_seq: AtomicU64,
    closed: AtomicBool,
}

impl QdrantIndex {
    /// Builds the client and waits for a healthy server.
    ///
    /// Health checks are attempted `cfg.connect_retries` times with doubling
    /// backoff starting at `cfg.retry_backoff_ms`.
    pub async fn connect(cfg: IndexConfig) -> Result<Self, IndexError> {
        cfg.validate()?;

        let mut builder = Qdrant::from_url(&cfg.url);
        if let Some(key) = &cfg.api_key {
            builder = builder.api_key(key.clone());
        }
        let client = builder
            .build()
            .map_err(|e| IndexError::Config(e.to_string()))?;

        let mut delay = Duration::from_millis(cfg.retry_backoff_ms);
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match client.health_check().await {
                Ok(reply) => {
                    info!(url = %cfg.url, version = %reply.version, "qdrant is healthy");
                    break;
                }
                Err(e) if attempt < cfg.connect_retries => {
                    warn!(url = %cfg.url, attempt, error = %e, backoff_ms = delay.as_millis() as u64, "qdrant health check failed, retrying");
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
                Err(e) => {
                    return Err(IndexError::Unavailable(format!(
                        "{} after {attempt} attempts: {e}",
                        cfg.url
                    )));
                }
            }
        }

        Ok(Self {
            client,
            cfg,
            last_seq: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        })
    }

    fn check_open(&self) -> Result<(), IndexError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(IndexError::Unavailable("client closed".into()));
        }
        Ok(())
    }

    /// Monotonic sequence derived from wall-clock micros; strictly increasing
    /// within this process even when the clock stalls.
    fn next_seq(&self) -> u64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_micros() as u64)
            .unwrap_or(0);
        let prev = self
            .last_seq
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or_else(|last| last);
        now.max(prev + 1)
    }

    fn to_point(&self, mut record: IndexRecord) -> Result<PointStruct, IndexError> {
        if record.metadata.indexed_seq.is_none() {
            record.metadata.indexed_seq = Some(self.next_seq());
        }
        let payload = to_payload(&record.metadata)?;
        Ok(PointStruct::new(record.id, record.vector, payload))
    }

    async fn existing_space(&self) -> Result<Option<Result<VectorSpace, String>>, IndexError> {
        let name = &self.cfg.collection;
        if !self.client.collection_exists(name.as_str()).await.map_err(classify)? {
            return Ok(None);
        }
        let info = self.client.collection_info(name).await.map_err(classify)?;
        Ok(Some(space_of(info)))
    }

    #[instrument(skip_all, fields(collection = %self.cfg.collection))]
    async fn do_ensure(&self, space: &VectorSpace) -> Result<(), IndexError> {
        self.check_open()?;
        let name = &self.cfg.collection;
        info!(collection = %name, %space, "ensuring collection");

        match self.existing_space().await? {
            Some(Ok(found)) if found == *space => {
                debug!(collection = %name, "collection exists with matching schema");
                return Ok(());
            }
            Some(Ok(found)) => {
                return Err(IndexError::SchemaMismatch {
                    collection: name.clone(),
                    expected: *space,
                    found: found.to_string(),
                });
            }
            Some(Err(found)) => {
                return Err(IndexError::SchemaMismatch {
                    collection: name.clone(),
                    expected: *space,
                    found,
                });
            }
            None => {}
        }

        self.client
            .create_collection(
                CreateCollectionBuilder::new(name).vectors_config(VectorParamsBuilder::new(
                    space.size as u64,
                    to_qdrant_distance(space.distance),
                )),
            )
            .await
            .map_err(classify)?;

        self.client
            .create_field_index(CreateFieldIndexCollectionBuilder::new(
                name,
                CATEGORY_FIELD,
                FieldType::Keyword,
            ))
            .await
            .map_err(classify)?;

        info!(collection = %name, "collection created with category index");
        Ok(())
    }

    async fn do_upsert_batch(&self, records: Vec<IndexRecord>) -> Result<usize, IndexError> {
        self.check_open()?;
        if records.is_empty() {
            debug!("no points provided for upsert");
            return Ok(0);
        }
        let n = records.len();
        let points = records
            .into_iter()
            .map(|r| self.to_point(r))
            .collect::<Result<Vec<_>, _>>()?;

        let res = self
            .client
            .upsert_points(UpsertPointsBuilder::new(&self.cfg.collection, points).wait(true))
            .await
            .map_err(|e| self.missing_or(e))?;

        debug!(points = n, status = ?res.result.map(|r| r.status), "upsert acknowledged");
        Ok(n)
    }

    /// Top-`k` search. Qdrant picks among equal scores arbitrarily, so the
    /// request is over-fetched and widened until the tie at rank `k` is fully
    /// visible, then ordered by [`rank_hits`] and cut.
    async fn do_search(
        &self,
        vector: &[f32],
        k: usize,
        filter: Option<&CategoryFilter>,
    ) -> Result<Vec<IndexHit>, IndexError> {
        self.check_open()?;
        if k == 0 {
            return Ok(Vec::new());
        }

        let higher_is_better = self.cfg.distance.higher_is_better();
        let cap = k.saturating_add(MAX_TIE_SCAN);
        let mut limit = k.saturating_add(TIE_MARGIN);
        loop {
            let (mut hits, fetched) = self.fetch_hits(vector, limit, filter).await?;
            rank_hits(&mut hits, higher_is_better);
            if limit < cap && tie_crosses_limit(&hits, k, fetched, limit) {
                debug!(limit, k, "score tie at the cut, widening search");
                limit = limit.saturating_mul(2).min(cap);
                continue;
            }
            hits.truncate(k);
            debug!(hits = hits.len(), k, limit, "search completed");
            return Ok(hits);
        }
    }

    /// One search round; returns the hits and the raw number of points.
    async fn fetch_hits(
        &self,
        vector: &[f32],
        limit: usize,
        filter: Option<&CategoryFilter>,
    ) -> Result<(Vec<IndexHit>, usize), IndexError> {
        let mut builder =
            SearchPointsBuilder::new(&self.cfg.collection, vector.to_vec(), limit as u64).with_payload(true);
        if let Some(f) = filter {
            builder = builder.filter(to_qdrant_filter(f));
        }
        if self.cfg.exact_search {
            builder = builder.params(SearchParamsBuilder::default().exact(true));
        }

        let res = self
            .client
            .search_points(builder)
            .await
            .map_err(|e| self.missing_or(e))?;

        let fetched = res.result.len();
        let mut hits = Vec::with_capacity(fetched);
        for p in res.result {
            let Some(id) = p.id.and_then(|id| id.point_id_options).map(point_id_string) else {
                warn!("search hit without id skipped");
                continue;
            };
            let metadata = from_payload(p.payload)?;
            hits.push(IndexHit {
                id,
                score: p.score,
                metadata,
            });
        }
        Ok((hits, fetched))
    }

    async fn do_get(&self, id: &str) -> Result<Option<ImageMetadata>, IndexError> {
        self.check_open()?;
        let res = self
            .client
            .get_points(
                GetPointsBuilder::new(&self.cfg.collection, vec![PointId::from(id.to_string())])
                    .with_payload(true)
                    .with_vectors(false),
            )
            .await
            .map_err(|e| self.missing_or(e))?;

        match res.result.into_iter().next() {
            Some(p) => Ok(Some(from_payload(p.payload)?)),
            None => Ok(None),
        }
    }

    async fn do_count(&self) -> Result<u64, IndexError> {
        self.check_open()?;
        let res = self
            .client
            .count(CountPointsBuilder::new(&self.cfg.collection).exact(true))
            .await
            .map_err(|e| self.missing_or(e))?;
        Ok(res.result.map(|r| r.count).unwrap_or(0))
    }

    /// Maps "collection not found" responses to [`IndexError::CollectionMissing`].
    fn missing_or(&self, e: QdrantError) -> IndexError {
        let msg = e.to_string();
        if msg.contains("Not found: Collection") || msg.contains("doesn't exist") {
            IndexError::CollectionMissing(self.cfg.collection.clone())
        } else {
            classify(e)
        }
    }
}

impl VectorIndex for QdrantIndex {
    fn collection(&self) -> &str {
        &self.cfg.collection
    }

    fn ensure_collection<'a>(&'a self, space: &'a VectorSpace) -> BoxFuture<'a, Result<(), IndexError>> {
        self.do_ensure(space).boxed()
    }

    fn upsert(&self, record: IndexRecord) -> BoxFuture<'_, Result<(), IndexError>> {
        async move { self.do_upsert_batch(vec![record]).await.map(|_| ()) }.boxed()
    }

    fn upsert_batch(&self, records: Vec<IndexRecord>) -> BoxFuture<'_, Result<usize, IndexError>> {
        self.do_upsert_batch(records).boxed()
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
        self.do_get(id).boxed()
    }

    fn count(&self) -> BoxFuture<'_, Result<u64, IndexError>> {
        self.do_count().boxed()
    }

    fn close(&self) -> BoxFuture<'_, Result<(), IndexError>> {
        async move {
            if !self.closed.swap(true, Ordering::AcqRel) {
                info!(collection = %self.cfg.collection, "qdrant client closed");
            }
            Ok(())
        }
        .boxed()
    }
}

fn to_qdrant_distance(d: DistanceKind) -> Distance {
    match d {
        DistanceKind::Cosine => Distance::Cosine,
        DistanceKind::Dot => Distance::Dot,
        DistanceKind::Euclid => Distance::Euclid,
    }
}

/// Extracts the single unnamed vector space of a collection.
/// `Err` carries a description of an unsupported layout.
fn space_of(info: GetCollectionInfoResponse) -> Result<VectorSpace, String> {
    let cfg = info
        .result
        .and_then(|r| r.config)
        .and_then(|c| c.params)
        .and_then(|p| p.vectors_config)
        .and_then(|v| v.config);

    match cfg {
        Some(VectorsConfigKind::Params(p)) => {
            let distance = match Distance::try_from(p.distance) {
                Ok(Distance::Cosine) => DistanceKind::Cosine,
                Ok(Distance::Dot) => DistanceKind::Dot,
                Ok(Distance::Euclid) => DistanceKind::Euclid,
                _ => return Err(format!("size={} distance=<unsupported {}>", p.size, p.distance)),
            };
            Ok(VectorSpace {
                size: p.size as usize,
                distance,
            })
        }
        Some(VectorsConfigKind::ParamsMap(_)) => Err("named vectors".to_string()),
        None => Err("no vector config".to_string()),
    }
}

fn point_id_string(id: PointIdOptions) -> String {
    match id {
        PointIdOptions::Uuid(s) => s,
        PointIdOptions::Num(n) => n.to_string(),
    }
}

/// Connectivity failures become `Unavailable`; everything else is `Backend`.
fn classify(e: QdrantError) -> IndexError {
    let msg = e.to_string();
    let lower = msg.to_ascii_lowercase();
    let unreachable = ["unavailable", "transport error", "connection refused", "deadline", "connect"]
        .iter()
        .any(|needle| lower.contains(needle));
    if unreachable {
        IndexError::Unavailable(msg)
    } else {
        IndexError::Backend(msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qdrant_client::qdrant::{CollectionConfig, CollectionInfo, CollectionParams, VectorParams, VectorsConfig};

    fn info_with(size: u64, distance: Distance) -> GetCollectionInfoResponse {
        GetCollectionInfoResponse {
            result: Some(CollectionInfo {
                config: Some(CollectionConfig {
                    params: Some(CollectionParams {
                        vectors_config: Some(VectorsConfig {
                            config: Some(VectorsConfigKind::Params(VectorParams {
                                size,
                                distance: distance as i32,
                                ..Default::default()
                            })),
                        }),
                        ..Default::default()
                    }),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn reads_existing_vector_space() {
        let space = space_of(info_with(512, Distance::Cosine)).unwrap();
        assert_eq!(
            space,
            VectorSpace {
                size: 512,
                distance: DistanceKind::Cosine
            }
        );
    }

    #[test]
    fn manhattan_is_reported_as_unsupported() {
        let err = space_of(info_with(512, Distance::Manhattan)).unwrap_err();
        assert!(err.contains("unsupported"));
    }

    #[test]
    fn missing_config_is_reported() {
        let err = space_of(GetCollectionInfoResponse::default()).unwrap_err();
        assert_eq!(err, "no vector config");
    }

    #[test]
    fn point_ids_render_as_strings() {
        assert_eq!(point_id_string(PointIdOptions::Num(7)), "7");
        assert_eq!(point_id_string(PointIdOptions::Uuid("abc".into())), "abc");
    }
}
