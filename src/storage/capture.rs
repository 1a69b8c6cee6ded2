//! Capture sink: one immutable JSON record per captured page

use crate::crawler::PageContent;
use crate::state::PageMetadataEntry;
use crate::storage::traits::{StorageError, StorageResult};
use crate::storage::write_json_atomic_async;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// The persisted form of one captured page
///
/// `html` holds the full rendered markup as a fallback extraction source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureRecord {
    pub id: u64,
    pub url: String,
    pub timestamp: DateTime<Utc>,
    pub content: PageContent,
    pub html: String,
}

/// File name of the capture record with the given id
pub fn capture_filename(id: u64) -> String {
    format!("page-{}.json", id)
}

/// Parses the id out of a `page-<id>.json` file name
fn parse_capture_id(file_name: &str) -> Option<u64> {
    file_name
        .strip_prefix("page-")?
        .strip_suffix(".json")?
        .parse()
        .ok()
}

/// Writes capture records and hands out their ids
///
/// Ids are unique and strictly increasing for the lifetime of the crawl:
/// on open the counter starts past every id known to the run index and
/// every `page-<id>.json` already present in the directory.
#[derive(Debug)]
pub struct CaptureSink {
    dir: PathBuf,
    next_id: AtomicU64,
}

impl CaptureSink {
    /// Opens (creating if needed) the capture directory
    ///
    /// # Arguments
    ///
    /// * `dir` - Directory receiving capture records
    /// * `index_next_id` - Next id according to the loaded run index
    pub async fn open(dir: impl Into<PathBuf>, index_next_id: u64) -> StorageResult<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| StorageError::io(&dir, e))?;

        let on_disk_next = Self::scan_next_id(&dir).await?;
        if on_disk_next > index_next_id {
            tracing::warn!(
                "Found captures up to id {} not recorded in the run index; continuing after them",
                on_disk_next - 1
            );
        }

        Ok(Self {
            dir,
            next_id: AtomicU64::new(index_next_id.max(on_disk_next)),
        })
    }

    async fn scan_next_id(dir: &Path) -> StorageResult<u64> {
        let mut entries = tokio::fs::read_dir(dir)
            .await
            .map_err(|e| StorageError::io(dir, e))?;

        let mut next = 0;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StorageError::io(dir, e))?
        {
            if let Some(id) = entry.file_name().to_str().and_then(parse_capture_id) {
                next = next.max(id.saturating_add(1));
            }
        }

        Ok(next)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Id the next persisted capture will receive
    pub fn next_id(&self) -> u64 {
        self.next_id.load(Ordering::Acquire)
    }

    /// Persists one capture and returns its index entry
    ///
    /// The record is written to a temporary file and renamed into place, so
    /// a `page-<id>.json` file is either complete or absent.
    pub async fn persist(
        &self,
        url: &str,
        depth: u32,
        content: PageContent,
        html: String,
    ) -> StorageResult<PageMetadataEntry> {
        let id = self.next_id.fetch_add(1, Ordering::AcqRel);
        let filename = capture_filename(id);
        let timestamp = Utc::now();

        let record = CaptureRecord {
            id,
            url: url.to_string(),
            timestamp,
            content,
            html,
        };

        write_json_atomic_async(&self.dir.join(&filename), &record).await?;

        Ok(PageMetadataEntry {
            id,
            url: url.to_string(),
            depth,
            filename,
            timestamp,
        })
    }
}
