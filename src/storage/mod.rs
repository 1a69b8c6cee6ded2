//! Storage module for persisting crawl data
//!
//! This module handles everything written to disk by the crawler:
//! - One immutable JSON capture record per page (`CaptureSink`)
//! - Crash-resumable checkpoints of the crawl state (`JsonCheckpointStore`)
//! - The run index consumed by downstream processing

mod capture;
mod checkpoint;
mod traits;

pub use capture::{capture_filename, CaptureRecord, CaptureSink};
pub use checkpoint::{JsonCheckpointStore, LEGACY_METADATA, LEGACY_QUEUE, LEGACY_VISITED};
pub use traits::{CheckpointStore, StorageError, StorageResult};

use crate::state::{FrontierTask, RunMetadata};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Current checkpoint format version
pub const SNAPSHOT_VERSION: u32 = 1;

/// Full crawl state at one point in time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckpointSnapshot {
    #[serde(default)]
    pub version: u32,

    /// Hash of the configuration file the state was produced with
    #[serde(default)]
    pub config_hash: Option<String>,

    #[serde(default)]
    pub visited_urls: Vec<String>,

    #[serde(default)]
    pub pending_queue: Vec<FrontierTask>,

    #[serde(default)]
    pub metadata: RunMetadata,
}

/// Path of the temporary sibling used while replacing `path`
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Serializes `value` as pretty JSON and atomically replaces `path` with it
///
/// The data is written and synced to a temporary sibling first, then renamed
/// over the destination, so readers see either the old or the new file.
pub(crate) fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> StorageResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
    }

    let tmp = temp_path(path);
    let result = (|| -> StorageResult<()> {
        let file = File::create(&tmp).map_err(|e| StorageError::io(&tmp, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, value).map_err(|e| StorageError::json(&tmp, e))?;
        writer.flush().map_err(|e| StorageError::io(&tmp, e))?;
        writer
            .get_ref()
            .sync_all()
            .map_err(|e| StorageError::io(&tmp, e))?;
        std::fs::rename(&tmp, path).map_err(|e| StorageError::io(path, e))
    })();

    if result.is_err() && tmp.exists() {
        let _ = std::fs::remove_file(&tmp);
    }

    result
}

/// Async variant of [`write_json_atomic`] for use inside fetch tasks
pub(crate) async fn write_json_atomic_async<T: Serialize>(
    path: &Path,
    value: &T,
) -> StorageResult<()> {
    let bytes = serde_json::to_vec_pretty(value).map_err(|e| StorageError::json(path, e))?;
    let tmp = temp_path(path);

    let result = async {
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| StorageError::io(&tmp, e))?;
        tokio::fs::rename(&tmp, path)
            .await
            .map_err(|e| StorageError::io(path, e))
    }
    .await;

    if result.is_err() {
        let _ = tokio::fs::remove_file(&tmp).await;
    }

    result
}

/// Reads and parses a JSON file
pub(crate) fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> StorageResult<T> {
    let content = std::fs::read_to_string(path).map_err(|e| StorageError::io(path, e))?;
    serde_json::from_str(&content).map_err(|e| StorageError::json(path, e))
}
