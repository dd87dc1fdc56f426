//! JSON loading for schema snapshots.

use std::fs;
use std::path::{Path, PathBuf};

use super::SchemaSnapshot;

/// Errors raised while loading a snapshot.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("Snapshot file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read snapshot: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse snapshot: {0}")]
    ParseError(#[from] serde_json::Error),
}

pub type SnapshotResult<T> = Result<T, SnapshotError>;

impl SchemaSnapshot {
    /// Load a snapshot from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> SnapshotResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SnapshotError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Parse a snapshot from a JSON string.
    pub fn from_json_str(content: &str) -> SnapshotResult<Self> {
        let snapshot: SchemaSnapshot = serde_json::from_str(content)?;
        log::debug!(
            "loaded snapshot with {} tables and {} relationships",
            snapshot.table_count(),
            snapshot.relationship_count()
        );
        Ok(snapshot)
    }
}
