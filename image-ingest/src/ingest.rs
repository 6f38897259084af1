//! Ingestion runner: discovery -> read/hash -> embed (bounded) -> upsert (sequential).

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use embedding_service::{Embedder, EmbeddingError};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use services::{hash::content_hash, uuid::stable_uuid_bytes};
use tracing::{debug, info, instrument, warn};
use vector_index::{ImageMetadata, IndexError, IndexRecord, VectorIndex, VectorSpace};

use crate::config::IngestConfig;
use crate::discovery::{ImageFile, discover_images};
use crate::errors::IngestError;
use crate::report::{IngestFailure, IngestStage, IngestionReport};

/// Per-file result of the concurrent stage.
enum Prepared {
    Ready(IndexRecord),
    Unchanged(PathBuf),
    Failed(IngestFailure),
    /// Index became unusable; aborts the run.
    Fatal(IndexError),
}

/// Populates a vector index from an image folder.
///
/// Holds no state between runs; the index is the only owner of records.
pub struct ImageIngestor {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    cfg: IngestConfig,
}

impl ImageIngestor {
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>, cfg: IngestConfig) -> Self {
        Self { embedder, index, cfg }
    }

    /// Ingests every image below `root`.
    ///
    /// # Errors
    /// - [`IngestError::InvalidRoot`] when `root` is missing or not a directory.
    /// - [`IngestError::Index`] when the collection cannot be ensured or the
    ///   index becomes unavailable mid-run.
    ///
    /// Every other problem is recorded per file in the returned report.
    #[instrument(skip_all, fields(root = %root.as_ref().display()))]
    pub async fn ingest(&self, root: impl AsRef<Path>) -> Result<IngestionReport, IngestError> {
        let started = Instant::now();
        let root = canonical_root(root.as_ref()).await?;

        let space = VectorSpace {
            size: self.embedder.dim(),
            distance: self.cfg.distance,
        };
        self.index.ensure_collection(&space).await?;

        let discovery_root = root.clone();
        let category = self.cfg.root_category.clone();
        let (files, walk_failures) =
            tokio::task::spawn_blocking(move || discover_images(&discovery_root, &category))
                .await
                .map_err(|e| IngestError::InvalidRoot {
                    path: root.clone(),
                    reason: format!("directory walk aborted: {e}"),
                })?;

        info!(
            images = files.len(),
            collection = self.index.collection(),
            concurrency = self.cfg.concurrency,
            "ingestion started"
        );

        let mut report = IngestionReport::new(root.clone(), files.len());
        for f in walk_failures {
            warn!(path = %f.path.display(), reason = %f.reason, "unreadable entry");
            report.failures.push(f);
        }

        let pb = progress_bar(files.len() as u64, self.cfg.progress);

        let mut prepared = stream::iter(files)
            .map(|file| self.prepare(file))
            .buffered(self.cfg.concurrency.max(1));

        while let Some(step) = prepared.next().await {
            match step {
                Prepared::Ready(record) => {
                    let path = PathBuf::from(&record.metadata.path);
                    match self.index.upsert(record).await {
                        Ok(()) => report.succeeded += 1,
                        Err(e) if is_fatal(&e) => {
                            pb.abandon();
                            return Err(e.into());
                        }
                        Err(e) => {
                            warn!(path = %path.display(), error = %e, "upsert failed");
                            report.failures.push(IngestFailure {
                                path,
                                stage: IngestStage::Upsert,
                                reason: e.to_string(),
                            });
                        }
                    }
                }
                Prepared::Unchanged(path) => {
                    debug!(path = %path.display(), "unchanged, skipped");
                    report.unchanged += 1;
                    report.succeeded += 1;
                }
                Prepared::Failed(failure) => {
                    warn!(
                        path = %failure.path.display(),
                        stage = %failure.stage,
                        reason = %failure.reason,
                        "file skipped"
                    );
                    report.failures.push(failure);
                }
                Prepared::Fatal(e) => {
                    pb.abandon();
                    return Err(e.into());
                }
            }
            pb.inc(1);
        }

        pb.finish_and_clear();
        report.duration_ms = started.elapsed().as_millis() as u64;
        info!(
            discovered = report.discovered,
            succeeded = report.succeeded,
            unchanged = report.unchanged,
            failed = report.failed(),
            duration_ms = report.duration_ms,
            "ingestion finished"
        );
        Ok(report)
    }

    /// Reads, hashes and embeds one file. Runs concurrently with other files.
    async fn prepare(&self, file: ImageFile) -> Prepared {
        let bytes = match tokio::fs::read(&file.path).await {
            Ok(b) => b,
            Err(e) => return failed(&file.path, IngestStage::Read, e.to_string()),
        };

        let path_str = file.path.to_string_lossy().into_owned();
        let id = record_id(&file.path);
        let hash = content_hash(&bytes);

        let existing = match self.index.get(&id).await {
            Ok(m) => m,
            Err(e) if is_fatal(&e) => return Prepared::Fatal(e),
            Err(e) => {
                debug!(id = %id, error = %e, "lookup failed, re-embedding");
                None
            }
        };
        if self.cfg.skip_unchanged
            && existing.as_ref().and_then(|m| m.content_hash.as_deref()) == Some(hash.as_str())
        {
            return Prepared::Unchanged(file.path);
        }

        let vector = match self.embedder.embed_image(&bytes).await {
            Ok(v) => v,
            Err(e @ EmbeddingError::Decode(_)) => {
                return failed(&file.path, IngestStage::Decode, e.to_string());
            }
            Err(e) => return failed(&file.path, IngestStage::Embed, e.to_string()),
        };

        Prepared::Ready(IndexRecord {
            id,
            vector,
            metadata: ImageMetadata {
                filename: file.filename,
                path: path_str,
                category: file.category,
                content_hash: Some(hash),
                indexed_seq: existing.and_then(|m| m.indexed_seq),
            },
        })
    }
}

/// Id of the record for a canonical path. Built from the raw path bytes so
/// distinct non-UTF-8 paths never share an id.
fn record_id(path: &Path) -> String {
    stable_uuid_bytes(path.as_os_str().as_encoded_bytes()).to_string()
}

fn failed(path: &Path, stage: IngestStage, reason: String) -> Prepared {
    Prepared::Failed(IngestFailure {
        path: path.to_path_buf(),
        stage,
        reason,
    })
}

/// Errors that make every further index call pointless.
fn is_fatal(e: &IndexError) -> bool {
    matches!(
        e,
        IndexError::Unavailable(_) | IndexError::SchemaMismatch { .. } | IndexError::CollectionMissing(_)
    )
}

async fn canonical_root(root: &Path) -> Result<PathBuf, IngestError> {
    let canonical = tokio::fs::canonicalize(root)
        .await
        .map_err(|e| IngestError::InvalidRoot {
            path: root.to_path_buf(),
            reason: e.to_string(),
        })?;
    let meta = tokio::fs::metadata(&canonical)
        .await
        .map_err(|e| IngestError::InvalidRoot {
            path: canonical.clone(),
            reason: e.to_string(),
        })?;
    if !meta.is_dir() {
        return Err(IngestError::InvalidRoot {
            path: canonical,
            reason: "not a directory".into(),
        });
    }
    Ok(canonical)
}

fn progress_bar(len: u64, enabled: bool) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta})",
    ) {
        pb.set_style(style.progress_chars("##-"));
    }
    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf8_paths_keep_their_string_id() {
        let p = Path::new("/data/images/animals/cat.jpg");
        assert_eq!(record_id(p), services::uuid::stable_uuid("/data/images/animals/cat.jpg").to_string());
    }

    #[cfg(unix)]
    #[test]
    fn lossy_equal_paths_get_distinct_ids() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let a = Path::new(OsStr::from_bytes(b"/data/animals/\xffcat.jpg"));
        let b = Path::new(OsStr::from_bytes(b"/data/animals/\xfecat.jpg"));
        assert_eq!(a.to_string_lossy(), b.to_string_lossy());
        assert_ne!(record_id(a), record_id(b));
    }
}
