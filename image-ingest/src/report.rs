//! Ingestion outcome summary.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

/// Pipeline stage where a file failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestStage {
    /// Directory traversal or file read.
    Read,
    /// Bytes are not a decodable image.
    Decode,
    /// Embedding backend failure.
    Embed,
    /// Index rejected the record.
    Upsert,
}

impl fmt::Display for IngestStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IngestStage::Read => "read",
            IngestStage::Decode => "decode",
            IngestStage::Embed => "embed",
            IngestStage::Upsert => "upsert",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct IngestFailure {
    pub path: PathBuf,
    pub stage: IngestStage,
    pub reason: String,
}

/// Result of one ingestion run.
///
/// `succeeded` includes `unchanged` files; `discovered` counts image files
/// found by the walk, so `succeeded + failures` may exceed it only when the
/// walk itself reported unreadable entries.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct IngestionReport {
    pub root: PathBuf,
    pub discovered: usize,
    pub succeeded: usize,
    pub unchanged: usize,
    pub failures: Vec<IngestFailure>,
    pub duration_ms: u64,
}

impl IngestionReport {
    pub(crate) fn new(root: PathBuf, discovered: usize) -> Self {
        Self {
            root,
            discovered,
            succeeded: 0,
            unchanged: 0,
            failures: Vec::new(),
            duration_ms: 0,
        }
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Display for IngestionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: discovered={} succeeded={} unchanged={} failed={} in {}ms",
            self.root.display(),
            self.discovered,
            self.succeeded,
            self.unchanged,
            self.failed(),
            self.duration_ms
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_serializes_lowercase() {
        let f = IngestFailure {
            path: PathBuf::from("/x/a.png"),
            stage: IngestStage::Decode,
            reason: "bad".into(),
        };
        let json = serde_json::to_value(&f).unwrap();
        assert_eq!(json["stage"], "decode");
    }
}
