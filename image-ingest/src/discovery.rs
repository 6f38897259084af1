//! Image discovery and category derivation.

use std::path::{Path, PathBuf};

use tracing::{debug, trace};
use walkdir::{DirEntry, WalkDir};

use crate::report::{IngestFailure, IngestStage};

/// Lowercase extensions treated as images.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "webp", "tif", "tiff"];

/// One image found under the ingestion root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageFile {
    /// Absolute path (root is canonicalized, links are not followed).
    pub path: PathBuf,
    pub filename: String,
    pub category: String,
}

/// `true` when the extension is a supported image type (case-insensitive).
pub fn is_image_path(p: &Path) -> bool {
    p.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.iter().any(|x| e.eq_ignore_ascii_case(x)))
        .unwrap_or(false)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .map(|s| s.starts_with('.'))
            .unwrap_or(false)
}

/// Category = name of the immediate parent directory; files directly under
/// `root` get `root_category`.
fn category_of(root: &Path, path: &Path, root_category: &str) -> String {
    match path.parent() {
        Some(parent) if parent != root => parent
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| root_category.to_string()),
        _ => root_category.to_string(),
    }
}

/// Recursively lists images under `root`, sorted by path.
///
/// Hidden entries are skipped and symlinks are not followed. Entries the walk
/// cannot read are returned as [`IngestStage::Read`] failures.
pub fn discover_images(root: &Path, root_category: &str) -> (Vec<ImageFile>, Vec<IngestFailure>) {
    let mut files = Vec::new();
    let mut failures = Vec::new();

    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden(e));

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
                failures.push(IngestFailure {
                    path,
                    stage: IngestStage::Read,
                    reason: e.to_string(),
                });
                continue;
            }
        };
        if !entry.file_type().is_file() || !is_image_path(entry.path()) {
            trace!(path = %entry.path().display(), "skipped");
            continue;
        }
        let path = entry.path().to_path_buf();
        files.push(ImageFile {
            filename: entry.file_name().to_string_lossy().into_owned(),
            category: category_of(root, &path, root_category),
            path,
        });
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    debug!(root = %root.display(), images = files.len(), errors = failures.len(), "discovery finished");
    (files, failures)
}
