//! Storage traits and error types
//!
//! This module defines the trait interface for checkpoint backends and
//! associated error types.

use crate::storage::CheckpointSnapshot;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Serialization error for {path}: {source}")]
    Serialization {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid snapshot {path}: {message}")]
    InvalidSnapshot { path: PathBuf, message: String },
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Serialization {
            path: path.into(),
            source,
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for checkpoint backend implementations
///
/// A checkpoint is the full crawl state (visited set, pending queue, run
/// metadata). Saving replaces the previous snapshot as a whole.
pub trait CheckpointStore {
    /// Loads the most recent snapshot
    ///
    /// # Returns
    ///
    /// * `Ok(Some(snapshot))` - A snapshot was found and parsed
    /// * `Ok(None)` - No prior state exists
    /// * `Err(StorageError)` - State exists but could not be read
    fn load(&self) -> StorageResult<Option<CheckpointSnapshot>>;

    /// Replaces the stored snapshot with `snapshot`
    fn save(&self, snapshot: &CheckpointSnapshot) -> StorageResult<()>;
}
