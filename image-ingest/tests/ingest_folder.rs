use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use embedding_service::{Embedder, EmbeddingError, l2_normalize, preprocess};
use futures::FutureExt;
use futures::future::BoxFuture;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use image_ingest::{ImageIngestor, IngestConfig, IngestError, IngestStage};
use vector_index::{MemoryIndex, VectorIndex};

/// Embeds an image as its normalized mean colour; counts image calls.
#[derive(Default)]
struct MeanColor {
    image_calls: AtomicUsize,
}

impl Embedder for MeanColor {
    fn embed_text<'a>(&'a self, _text: &'a str) -> BoxFuture<'a, Result<Vec<f32>, EmbeddingError>> {
        async { Err(EmbeddingError::EmptyInput) }.boxed()
    }

    fn embed_image<'a>(&'a self, bytes: &'a [u8]) -> BoxFuture<'a, Result<Vec<f32>, EmbeddingError>> {
        async move {
            self.image_calls.fetch_add(1, Ordering::SeqCst);
            let img = preprocess::decode(bytes)?.to_rgb8();
            let n = (img.width() * img.height()) as f32;
            let mut v = vec![0.05_f32; 3];
            for p in img.pixels() {
                for c in 0..3 {
                    v[c] += p.0[c] as f32 / 255.0 / n;
                }
            }
            l2_normalize(&mut v)?;
            Ok(v)
        }
        .boxed()
    }

    fn dim(&self) -> usize {
        3
    }
}

fn write_png(path: &Path, rgb: [u8; 3]) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let img = RgbImage::from_pixel(8, 8, Rgb(rgb));
    let mut out = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .unwrap();
    std::fs::write(path, out).unwrap();
}

fn setup() -> (Arc<MeanColor>, Arc<MemoryIndex>, ImageIngestor) {
    let embedder = Arc::new(MeanColor::default());
    let index = Arc::new(MemoryIndex::new("images"));
    let ingestor = ImageIngestor::new(embedder.clone(), index.clone(), IngestConfig::default());
    (embedder, index, ingestor)
}

#[tokio::test]
async fn corrupted_file_is_reported_and_valid_one_indexed() {
    let dir = tempfile::tempdir().unwrap();
    write_png(&dir.path().join("animals/cat.png"), [120, 90, 60]);
    std::fs::write(dir.path().join("animals/broken.jpg"), b"definitely not a jpeg").unwrap();

    let (_, index, ingestor) = setup();
    let report = ingestor.ingest(dir.path()).await.unwrap();

    assert_eq!(report.discovered, 2);
    assert_eq!(report.succeeded, 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].stage, IngestStage::Decode);
    assert!(report.failures[0].path.ends_with("animals/broken.jpg"));
    assert_eq!(index.count().await.unwrap(), 1);

    let hits = index.search(&[1.0, 0.75, 0.5], 5, None).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].metadata.filename, "cat.png");
    assert_eq!(hits[0].metadata.category, "animals");
}

#[tokio::test]
async fn rerun_is_idempotent_and_skips_unchanged_files() {
    let dir = tempfile::tempdir().unwrap();
    write_png(&dir.path().join("animals/cat.png"), [120, 90, 60]);
    write_png(&dir.path().join("flowers/rose.png"), [200, 10, 40]);
    write_png(&dir.path().join("objects/car.png"), [20, 20, 200]);

    let (embedder, index, ingestor) = setup();
    let first = ingestor.ingest(dir.path()).await.unwrap();
    assert_eq!(first.succeeded, 3);
    assert_eq!(first.unchanged, 0);
    assert_eq!(index.count().await.unwrap(), 3);

    let second = ingestor.ingest(dir.path()).await.unwrap();
    assert_eq!(second.succeeded, 3);
    assert_eq!(second.unchanged, 3);
    assert!(second.is_clean());
    assert_eq!(index.count().await.unwrap(), 3);
    assert_eq!(embedder.image_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn modified_file_replaces_only_its_record() {
    let dir = tempfile::tempdir().unwrap();
    let rose = dir.path().join("flowers/rose.png");
    write_png(&dir.path().join("animals/cat.png"), [120, 90, 60]);
    write_png(&rose, [200, 10, 40]);

    let (_, index, ingestor) = setup();
    ingestor.ingest(dir.path()).await.unwrap();

    let rose_id = services::uuid::stable_uuid(&rose.canonicalize().unwrap().to_string_lossy()).to_string();
    let before = index.get(&rose_id).await.unwrap().unwrap();

    write_png(&rose, [10, 200, 40]);
    let report = ingestor.ingest(dir.path()).await.unwrap();
    assert_eq!(report.unchanged, 1);
    assert_eq!(report.succeeded, 2);
    assert_eq!(index.count().await.unwrap(), 2);

    let after = index.get(&rose_id).await.unwrap().unwrap();
    assert_ne!(before.content_hash, after.content_hash);
    assert_eq!(before.indexed_seq, after.indexed_seq);
}

#[tokio::test]
async fn files_in_root_get_default_category() {
    let dir = tempfile::tempdir().unwrap();
    write_png(&dir.path().join("loose.png"), [1, 2, 3]);

    let (_, index, ingestor) = setup();
    ingestor.ingest(dir.path()).await.unwrap();

    let hits = index.search(&[1.0, 1.0, 1.0], 1, None).await.unwrap();
    assert_eq!(hits[0].metadata.category, "uncategorized");
}

#[tokio::test]
async fn missing_root_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let (_, _, ingestor) = setup();
    let err = ingestor.ingest(dir.path().join("nope")).await.unwrap_err();
    assert!(matches!(err, IngestError::InvalidRoot { .. }));

    let file = dir.path().join("file.png");
    write_png(&file, [0, 0, 0]);
    let err = ingestor.ingest(&file).await.unwrap_err();
    assert!(matches!(err, IngestError::InvalidRoot { .. }));
}

#[tokio::test]
async fn schema_mismatch_aborts_ingestion() {
    let dir = tempfile::tempdir().unwrap();
    write_png(&dir.path().join("animals/cat.png"), [120, 90, 60]);

    let (_, index, ingestor) = setup();
    index
        .ensure_collection(&vector_index::VectorSpace {
            size: 512,
            distance: vector_index::DistanceKind::Cosine,
        })
        .await
        .unwrap();

    let err = ingestor.ingest(dir.path()).await.unwrap_err();
    assert!(matches!(
        err,
        IngestError::Index(vector_index::IndexError::SchemaMismatch { .. })
    ));
}
