//! Per-file progress records and overall aggregation.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::format::format_bytes;
use crate::tree::{FileNode, ShareTree};

/// Well-known status labels. Backends may report any other string.
pub mod status {
    pub const QUEUED: &str = "queued";
    pub const DOWNLOADING: &str = "downloading";
    pub const RETRYING: &str = "retrying";
    pub const DONE: &str = "done";
    pub const FAILED: &str = "failed";
}

/// Live status of one file's transfer, as delivered by a progress event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    /// Id of the file node this record refers to.
    pub file_path: String,
    pub downloaded: u64,
    /// Expected byte count, unknown until the backend reports it.
    #[serde(default)]
    pub total: Option<u64>,
    pub status: String,
    #[serde(default)]
    pub error: Option<String>,
}

impl ProgressRecord {
    /// A fresh record for a file about to be downloaded.
    #[must_use]
    pub fn queued(node: &FileNode) -> Self {
        Self {
            file_path: node.id.clone(),
            downloaded: 0,
            total: Some(node.size),
            status: status::QUEUED.to_string(),
            error: None,
        }
    }

    /// Decodes an event payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload is not a valid record.
    pub fn from_json(payload: &str) -> Result<Self> {
        Ok(serde_json::from_str(payload)?)
    }

    /// "downloaded / total", or just the downloaded amount while the total
    /// is unknown or zero.
    #[must_use]
    pub fn amount_label(&self) -> String {
        match self.total {
            Some(total) if total > 0 => {
                format!("{} / {}", format_bytes(self.downloaded), format_bytes(total))
            }
            _ => format_bytes(self.downloaded),
        }
    }
}

/// Aggregate figures across all active files.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverallProgress {
    pub downloaded: u64,
    pub total: u64,
    /// Always within `[0, 100]`.
    pub percent: f64,
}

impl OverallProgress {
    #[allow(clippy::cast_precision_loss)]
    fn new(downloaded: u64, total: u64) -> Self {
        let percent = if total == 0 {
            0.0
        } else {
            (downloaded as f64 / total as f64 * 100.0).min(100.0)
        };
        Self {
            downloaded,
            total,
            percent,
        }
    }

    #[must_use]
    pub fn label(&self) -> String {
        format!(
            "{} / {} ({:.1}%)",
            format_bytes(self.downloaded),
            format_bytes(self.total),
            self.percent
        )
    }
}

/// Latest progress record per file. Records are only ever replaced.
#[derive(Debug, Clone, Default)]
pub struct ProgressTracker {
    records: BTreeMap<String, ProgressRecord>,
}

impl ProgressTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `record`, replacing any previous record for the same file.
    pub fn apply(&mut self, record: ProgressRecord) {
        log::debug!(
            "Progress {}: {} ({})",
            record.file_path,
            record.amount_label(),
            record.status
        );
        self.records.insert(record.file_path.clone(), record);
    }

    /// Seeds a queued record for every file of a batch.
    pub fn seed_queued<'a>(&mut self, files: impl IntoIterator<Item = &'a FileNode>) {
        for node in files {
            self.records
                .insert(node.id.clone(), ProgressRecord::queued(node));
        }
    }

    #[must_use]
    pub fn get(&self, file_path: &str) -> Option<&ProgressRecord> {
        self.records.get(file_path)
    }

    /// Records sorted by file path.
    pub fn records(&self) -> impl Iterator<Item = &ProgressRecord> {
        self.records.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Recomputes the overall figures from the current records.
    ///
    /// Active files are the selected ones plus every file with a record.
    /// Each file contributes `max(known total, downloaded)` to the total,
    /// where the known total prefers the reported value over the static
    /// size from the tree.
    #[must_use]
    pub fn overall<'a>(
        &self,
        tree: &ShareTree,
        selected: impl IntoIterator<Item = &'a FileNode>,
    ) -> OverallProgress {
        let mut active: HashSet<&str> = selected.into_iter().map(|n| n.id.as_str()).collect();
        active.extend(self.records.keys().map(String::as_str));

        let mut downloaded = 0u64;
        let mut total = 0u64;
        for id in active {
            let record = self.records.get(id);
            let seen = record.map_or(0, |r| r.downloaded);
            let known = record
                .and_then(|r| r.total)
                .or_else(|| tree.size_of(id))
                .unwrap_or(0);
            downloaded = downloaded.saturating_add(seen);
            total = total.saturating_add(known.max(seen));
        }

        OverallProgress::new(downloaded, total)
    }
}
