//! JSON checkpoint store
//!
//! The whole crawl state lives in one snapshot file replaced by rename, so a
//! crash mid-save never leaves the visited set, queue, and metadata out of
//! step with each other. After every save the run index is also exported as
//! `metadata.json` next to the captures.

use crate::state::{FrontierTask, RunMetadata};
use crate::storage::traits::{CheckpointStore, StorageError, StorageResult};
use crate::storage::{read_json, write_json_atomic, CheckpointSnapshot, SNAPSHOT_VERSION};
use std::path::{Path, PathBuf};

/// Visited-URL list of the three-file checkpoint layout
pub const LEGACY_VISITED: &str = "visited-urls.json";
/// Pending-queue list of the three-file checkpoint layout
pub const LEGACY_QUEUE: &str = "page-queue.json";
/// Run index (`{stats, pages}`) of the three-file checkpoint layout
pub const LEGACY_METADATA: &str = "metadata.json";

/// Checkpoint store backed by a single JSON snapshot file
#[derive(Debug, Clone)]
pub struct JsonCheckpointStore {
    path: PathBuf,
    capture_dir: Option<PathBuf>,
}

impl JsonCheckpointStore {
    /// Creates a store writing its snapshot to `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            capture_dir: None,
        }
    }

    /// Exports the run index into `dir` after each save, and imports the
    /// three-file layout from `dir` when no snapshot exists yet
    pub fn with_capture_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.capture_dir = Some(dir.into());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the exported run index, if any
    pub fn index_path(&self) -> Option<PathBuf> {
        self.capture_dir.as_ref().map(|dir| dir.join(LEGACY_METADATA))
    }

    fn load_snapshot(&self) -> StorageResult<CheckpointSnapshot> {
        let snapshot: CheckpointSnapshot = read_json(&self.path)?;

        if snapshot.version > SNAPSHOT_VERSION {
            return Err(StorageError::InvalidSnapshot {
                path: self.path.clone(),
                message: format!(
                    "snapshot version {} is newer than supported version {}",
                    snapshot.version, SNAPSHOT_VERSION
                ),
            });
        }

        Ok(snapshot)
    }

    /// Hydrates state from the three independently written files
    ///
    /// Each file is optional; the three may disagree slightly (they were never
    /// written together), which the frontier tolerates.
    fn load_legacy(&self, dir: &Path) -> StorageResult<Option<CheckpointSnapshot>> {
        let visited = dir.join(LEGACY_VISITED);
        let queue = dir.join(LEGACY_QUEUE);
        let metadata = dir.join(LEGACY_METADATA);

        if !visited.exists() && !queue.exists() && !metadata.exists() {
            return Ok(None);
        }

        let mut snapshot = CheckpointSnapshot {
            version: SNAPSHOT_VERSION,
            ..Default::default()
        };

        if visited.exists() {
            snapshot.visited_urls = read_json::<Vec<String>>(&visited)?;
        }
        if queue.exists() {
            snapshot.pending_queue = read_json::<Vec<FrontierTask>>(&queue)?;
        }
        if metadata.exists() {
            snapshot.metadata = read_json::<RunMetadata>(&metadata)?;
        }

        tracing::info!(
            "Imported three-file checkpoint from {} ({} visited, {} pending, {} pages)",
            dir.display(),
            snapshot.visited_urls.len(),
            snapshot.pending_queue.len(),
            snapshot.metadata.pages.len()
        );

        Ok(Some(snapshot))
    }
}

impl CheckpointStore for JsonCheckpointStore {
    fn load(&self) -> StorageResult<Option<CheckpointSnapshot>> {
        if self.path.exists() {
            return self.load_snapshot().map(Some);
        }

        match &self.capture_dir {
            Some(dir) => self.load_legacy(dir),
            None => Ok(None),
        }
    }

    fn save(&self, snapshot: &CheckpointSnapshot) -> StorageResult<()> {
        write_json_atomic(&self.path, snapshot)?;

        if let Some(index) = self.index_path() {
            write_json_atomic(&index, &snapshot.metadata)?;
        }

        tracing::debug!(
            "Checkpoint saved to {} ({} visited, {} pending)",
            self.path.display(),
            snapshot.visited_urls.len(),
            snapshot.pending_queue.len()
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::PageMetadataEntry;
    use chrono::Utc;
    use tempfile::TempDir;

    fn sample_snapshot() -> CheckpointSnapshot {
        let mut metadata = RunMetadata::default();
        metadata.stats.record_success();
        metadata.stats.mark_started();
        metadata.pages.push(PageMetadataEntry {
            id: 0,
            url: "https://example.com/".to_string(),
            depth: 0,
            filename: "page-0.json".to_string(),
            timestamp: Utc::now(),
        });

        CheckpointSnapshot {
            version: SNAPSHOT_VERSION,
            config_hash: Some("abc".to_string()),
            visited_urls: vec!["https://example.com/".to_string()],
            pending_queue: vec![FrontierTask::new("https://example.com/next", 1)],
            metadata,
        }
    }

    #[test]
    fn test_load_without_state() {
        let dir = TempDir::new().unwrap();
        let store = JsonCheckpointStore::new(dir.path().join("checkpoint.json"))
            .with_capture_dir(dir.path());
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let store = JsonCheckpointStore::new(dir.path().join("checkpoint.json"));
        let snapshot = sample_snapshot();

        store.save(&snapshot).unwrap();
        let loaded = store.load().unwrap().unwrap();

        assert_eq!(loaded, snapshot);
    }

    #[test]
    fn test_save_overwrites_previous_snapshot() {
        let dir = TempDir::new().unwrap();
        let store = JsonCheckpointStore::new(dir.path().join("checkpoint.json"));

        store.save(&sample_snapshot()).unwrap();
        store.save(&CheckpointSnapshot::default()).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert!(loaded.visited_urls.is_empty());
        assert!(loaded.pending_queue.is_empty());
    }

    #[test]
    fn test_save_exports_run_index() {
        let dir = TempDir::new().unwrap();
        let store = JsonCheckpointStore::new(dir.path().join("state").join("checkpoint.json"))
            .with_capture_dir(dir.path());

        store.save(&sample_snapshot()).unwrap();

        let index: serde_json::Value = read_json(&dir.path().join(LEGACY_METADATA)).unwrap();
        assert_eq!(index["stats"]["pagesProcessed"], 1);
        assert_eq!(index["pages"][0]["filename"], "page-0.json");
    }

    #[test]
    fn test_corrupt_snapshot_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("checkpoint.json");
        std::fs::write(&path, "{\"visitedUrls\": [").unwrap();

        let store = JsonCheckpointStore::new(&path);
        assert!(store.load().is_err());
    }

    #[test]
    fn test_newer_version_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("checkpoint.json");
        std::fs::write(&path, r#"{"version": 99}"#).unwrap();

        let store = JsonCheckpointStore::new(&path);
        assert!(matches!(
            store.load().unwrap_err(),
            StorageError::InvalidSnapshot { .. }
        ));
    }

    #[test]
    fn test_import_three_file_layout() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(LEGACY_VISITED),
            r#"["https://example.com/a", "https://example.com/b"]"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join(LEGACY_QUEUE),
            r#"[{"url": "https://example.com/c", "depth": 2}]"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join(LEGACY_METADATA),
            r#"{"stats": {"pagesProcessed": 2, "pagesSuccessful": 2, "pagesFailed": 0,
                "startTime": "2024-05-01T10:00:00.000Z", "endTime": null},
               "pages": [{"id": 0, "url": "https://example.com/a", "depth": 0,
                          "filename": "page-0.json", "timestamp": "2024-05-01T10:00:05.000Z"},
                         {"id": 1, "url": "https://example.com/b", "depth": 1,
                          "filename": "page-1.json", "timestamp": "2024-05-01T10:00:09.000Z"}]}"#,
        )
        .unwrap();

        let store = JsonCheckpointStore::new(dir.path().join("checkpoint.json"))
            .with_capture_dir(dir.path());
        let snapshot = store.load().unwrap().unwrap();

        assert_eq!(snapshot.visited_urls.len(), 2);
        assert_eq!(
            snapshot.pending_queue,
            vec![FrontierTask::new("https://example.com/c", 2)]
        );
        assert_eq!(snapshot.metadata.stats.pages_processed, 2);
        assert_eq!(snapshot.metadata.next_capture_id(), 2);
    }

    #[test]
    fn test_import_partial_three_file_layout() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(LEGACY_VISITED), r#"["https://example.com/a"]"#).unwrap();

        let store = JsonCheckpointStore::new(dir.path().join("checkpoint.json"))
            .with_capture_dir(dir.path());
        let snapshot = store.load().unwrap().unwrap();

        assert_eq!(snapshot.visited_urls, vec!["https://example.com/a".to_string()]);
        assert!(snapshot.pending_queue.is_empty());
        assert_eq!(snapshot.metadata, RunMetadata::default());
    }
}
