//! Staging area for in-flight uploads
//!
//! Uploaded payloads land here under collision-proof names before a share
//! token exists. A successful upload moves them into the token's partition;
//! a failed one discards them.

use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::names::validate_filename;
use crate::traits::{StoreError, StoreResult};

/// A payload written to the staging area, waiting to be committed.
#[derive(Debug, Clone)]
pub struct StagedFile {
    pub staged_path: PathBuf,
    pub original_name: String,
}

/// Shared landing zone for uploads that do not yet have a token.
#[derive(Clone)]
pub struct StagingArea {
    root: PathBuf,
}

impl StagingArea {
    /// Create a staging area rooted at `root`, creating the directory if needed.
    pub async fn new(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();

        fs::create_dir_all(&root).await.map_err(|e| {
            StoreError::Config(format!(
                "Failed to create staging root {}: {}",
                root.display(),
                e
            ))
        })?;

        Ok(StagingArea { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write one payload under a unique staged name.
    pub async fn stage(&self, original_name: &str, data: &[u8]) -> StoreResult<StagedFile> {
        validate_filename(original_name)?;

        // Millis plus a uuid keep concurrent uploads of the same filename apart.
        let staged_name = format!(
            "{}-{}-{}",
            Utc::now().timestamp_millis(),
            Uuid::new_v4().simple(),
            original_name
        );
        let path = self.root.join(staged_name);
        let size = data.len();
        let start = std::time::Instant::now();

        let mut file = fs::File::create(&path).await.map_err(|e| {
            StoreError::StageFailed(format!(
                "Failed to create staged file {}: {}",
                path.display(),
                e
            ))
        })?;

        file.write_all(data).await.map_err(|e| {
            StoreError::StageFailed(format!(
                "Failed to write staged file {}: {}",
                path.display(),
                e
            ))
        })?;

        file.sync_all().await.map_err(|e| {
            StoreError::StageFailed(format!(
                "Failed to sync staged file {}: {}",
                path.display(),
                e
            ))
        })?;

        tracing::debug!(
            path = %path.display(),
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Upload staged"
        );

        Ok(StagedFile {
            staged_path: path,
            original_name: original_name.to_string(),
        })
    }

    /// Best-effort removal of a staged file that will not be committed.
    pub async fn discard(&self, staged: &StagedFile) {
        if let Err(e) = fs::remove_file(&staged.staged_path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(
                    path = %staged.staged_path.display(),
                    error = %e,
                    "Failed to discard staged file"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_stage_writes_unique_names() {
        let dir = tempdir().unwrap();
        let staging = StagingArea::new(dir.path()).await.unwrap();

        let first = staging.stage("a.txt", b"one").await.unwrap();
        let second = staging.stage("a.txt", b"two").await.unwrap();

        assert_ne!(first.staged_path, second.staged_path);
        assert_eq!(first.original_name, "a.txt");
        assert_eq!(fs::read(&first.staged_path).await.unwrap(), b"one");
        assert_eq!(fs::read(&second.staged_path).await.unwrap(), b"two");
    }

    #[tokio::test]
    async fn test_stage_rejects_traversal_names() {
        let dir = tempdir().unwrap();
        let staging = StagingArea::new(dir.path()).await.unwrap();

        let result = staging.stage("../evil.txt", b"data").await;
        assert!(matches!(result, Err(StoreError::InvalidFilename(_))));
    }

    #[tokio::test]
    async fn test_discard_is_idempotent() {
        let dir = tempdir().unwrap();
        let staging = StagingArea::new(dir.path()).await.unwrap();

        let staged = staging.stage("a.txt", b"data").await.unwrap();
        staging.discard(&staged).await;
        assert!(!staged.staged_path.exists());

        // discarding again must not panic or log spuriously
        staging.discard(&staged).await;
    }
}
