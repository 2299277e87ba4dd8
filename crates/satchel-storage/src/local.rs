use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use crate::names::{validate_candidate_name, validate_filename, validate_token_name};
use crate::staging::StagedFile;
use crate::traits::{PartitionStore, StoreError, StoreResult};

/// Partition store backed by a local directory tree.
#[derive(Clone)]
pub struct LocalPartitionStore {
    partitions_root: PathBuf,
}

impl LocalPartitionStore {
    /// Create a store rooted at `partitions_root`, creating the directory if
    /// needed.
    pub async fn new(partitions_root: impl Into<PathBuf>) -> StoreResult<Self> {
        let partitions_root = partitions_root.into();

        fs::create_dir_all(&partitions_root).await.map_err(|e| {
            StoreError::Config(format!(
                "Failed to create partitions root {}: {}",
                partitions_root.display(),
                e
            ))
        })?;

        Ok(LocalPartitionStore { partitions_root })
    }

    pub fn root(&self) -> &Path {
        &self.partitions_root
    }

    /// Validate the token and join it under the root. Validation comes first
    /// so a hostile name never reaches the filesystem.
    fn partition_path(&self, token: &str) -> StoreResult<PathBuf> {
        validate_token_name(token)?;
        Ok(self.partitions_root.join(token))
    }
}

#[async_trait]
impl PartitionStore for LocalPartitionStore {
    async fn create_partition(&self, token: &str) -> StoreResult<PathBuf> {
        let path = self.partition_path(token)?;

        // create_dir_all succeeds when the directory already exists, which is
        // exactly the idempotence contract; concurrent creators cannot race.
        fs::create_dir_all(&path).await.map_err(|e| {
            StoreError::CreateFailed(format!("Failed to create partition: {}", e))
        })?;

        Ok(path)
    }

    async fn commit_files(&self, token: &str, staged: &[StagedFile]) -> StoreResult<()> {
        let partition = self.partition_path(token)?;
        let start = std::time::Instant::now();

        if !fs::try_exists(&partition).await.unwrap_or(false) {
            return Err(StoreError::PartitionNotFound(token.to_string()));
        }

        for file in staged {
            validate_filename(&file.original_name)?;
            let dest = partition.join(&file.original_name);

            move_file(&file.staged_path, &dest).await.map_err(|e| {
                StoreError::CommitFailed(format!(
                    "Failed to move staged file {}: {}",
                    file.staged_path.display(),
                    e
                ))
            })?;
        }

        tracing::debug!(
            file_count = staged.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Staged files committed to partition"
        );

        Ok(())
    }

    async fn list_files(&self, token: &str) -> StoreResult<Vec<String>> {
        let partition = self.partition_path(token)?;

        let mut entries = match fs::read_dir(&partition).await {
            Ok(entries) => entries,
            // The routine shape of an expired share: the collector already
            // reclaimed the directory.
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::PartitionNotFound(token.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                files.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        files.sort();

        Ok(files)
    }

    async fn resolve_file(&self, token: &str, filename: &str) -> StoreResult<PathBuf> {
        let partition = self.partition_path(token)?;
        validate_filename(filename)?;

        let path = partition.join(filename);
        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(path),
            Ok(_) => Err(StoreError::FileNotFound(filename.to_string())),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                if fs::try_exists(&partition).await.unwrap_or(false) {
                    Err(StoreError::FileNotFound(filename.to_string()))
                } else {
                    Err(StoreError::PartitionNotFound(token.to_string()))
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn list_partitions(&self) -> StoreResult<Vec<String>> {
        let mut entries = fs::read_dir(&self.partitions_root).await?;

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();

        Ok(names)
    }

    async fn remove_partition(&self, name: &str) -> StoreResult<()> {
        // Removal takes the candidate gate, not the token gate: the sweep
        // must be able to reclaim any directory a listing reports.
        validate_candidate_name(name)?;
        let path = self.partitions_root.join(name);
        let start = std::time::Instant::now();

        match fs::remove_dir_all(&path).await {
            Ok(()) => {
                tracing::info!(
                    partition = %name,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Partition removed"
                );
                Ok(())
            }
            // Removing an absent partition is a no-op, like deleting a
            // missing file.
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::RemoveFailed(format!(
                "Failed to remove partition: {}",
                e
            ))),
        }
    }
}

/// Move one file, falling back to copy + fsync + delete when the rename
/// crosses filesystems.
async fn move_file(from: &Path, to: &Path) -> std::io::Result<()> {
    match fs::rename(from, to).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::CrossesDevices => {
            if let Err(copy_err) = copy_then_sync(from, to).await {
                // The staged copy stays authoritative; drop the partial
                // destination.
                let _ = fs::remove_file(to).await;
                return Err(copy_err);
            }
            fs::remove_file(from).await
        }
        Err(e) => Err(e),
    }
}

async fn copy_then_sync(from: &Path, to: &Path) -> std::io::Result<()> {
    fs::copy(from, to).await?;
    let dest = fs::File::open(to).await?;
    dest.sync_all().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::staging::StagingArea;
    use tempfile::tempdir;

    async fn setup() -> (tempfile::TempDir, LocalPartitionStore, StagingArea) {
        let dir = tempdir().unwrap();
        let store = LocalPartitionStore::new(dir.path().join("uploads"))
            .await
            .unwrap();
        let staging = StagingArea::new(dir.path().join("uploads").join("temp"))
            .await
            .unwrap();
        (dir, store, staging)
    }

    #[tokio::test]
    async fn test_create_partition_is_idempotent() {
        let (_dir, store, _staging) = setup().await;

        let first = store.create_partition("token-a").await.unwrap();
        let second = store.create_partition("token-a").await.unwrap();

        assert_eq!(first, second);
        assert!(first.is_dir());
    }

    #[tokio::test]
    async fn test_commit_then_list_files() {
        let (_dir, store, staging) = setup().await;

        let staged = vec![
            staging.stage("b.txt", b"bee").await.unwrap(),
            staging.stage("a.txt", b"ay").await.unwrap(),
        ];

        store.create_partition("token-a").await.unwrap();
        store.commit_files("token-a", &staged).await.unwrap();

        let files = store.list_files("token-a").await.unwrap();
        assert_eq!(files, vec!["a.txt", "b.txt"]);

        // nothing left behind in staging
        for file in &staged {
            assert!(!file.staged_path.exists());
        }

        let path = store.resolve_file("token-a", "b.txt").await.unwrap();
        assert_eq!(fs::read(&path).await.unwrap(), b"bee");
    }

    #[tokio::test]
    async fn test_commit_requires_partition() {
        let (_dir, store, staging) = setup().await;

        let staged = vec![staging.stage("a.txt", b"data").await.unwrap()];
        let result = store.commit_files("token-a", &staged).await;

        assert!(matches!(result, Err(StoreError::PartitionNotFound(_))));
        // the staged file is untouched on a failed commit
        assert!(staged[0].staged_path.exists());
    }

    #[tokio::test]
    async fn test_resolve_file_rejects_traversal_before_fs_access() {
        let (_dir, store, _staging) = setup().await;

        // no partition exists, yet traversal must fail on the filename, not
        // on the missing directory
        let result = store.resolve_file("missing-token", "../../etc/passwd").await;
        assert!(matches!(result, Err(StoreError::InvalidFilename(_))));

        let result = store.resolve_file("missing-token", "nested/file.txt").await;
        assert!(matches!(result, Err(StoreError::InvalidFilename(_))));

        let result = store.resolve_file("../outside", "a.txt").await;
        assert!(matches!(result, Err(StoreError::InvalidToken(_))));
    }

    #[tokio::test]
    async fn test_resolve_missing_file_vs_missing_partition() {
        let (_dir, store, staging) = setup().await;

        let staged = vec![staging.stage("a.txt", b"data").await.unwrap()];
        store.create_partition("token-a").await.unwrap();
        store.commit_files("token-a", &staged).await.unwrap();

        let result = store.resolve_file("token-a", "b.txt").await;
        assert!(matches!(result, Err(StoreError::FileNotFound(_))));

        let result = store.resolve_file("token-b", "a.txt").await;
        assert!(matches!(result, Err(StoreError::PartitionNotFound(_))));
    }

    #[tokio::test]
    async fn test_list_files_missing_partition() {
        let (_dir, store, _staging) = setup().await;

        let result = store.list_files("token-a").await;
        assert!(matches!(result, Err(StoreError::PartitionNotFound(_))));
    }

    #[tokio::test]
    async fn test_list_partitions_reports_directories_only() {
        let (_dir, store, _staging) = setup().await;

        store.create_partition("token-b").await.unwrap();
        store.create_partition("token-a").await.unwrap();
        fs::write(store.root().join("loose-file"), b"x").await.unwrap();

        let partitions = store.list_partitions().await.unwrap();
        assert_eq!(partitions, vec!["temp", "token-a", "token-b"]);
    }

    #[tokio::test]
    async fn test_remove_partition() {
        let (_dir, store, staging) = setup().await;

        let staged = vec![staging.stage("a.txt", b"data").await.unwrap()];
        store.create_partition("token-a").await.unwrap();
        store.commit_files("token-a", &staged).await.unwrap();

        store.remove_partition("token-a").await.unwrap();
        assert!(!store.root().join("token-a").exists());

        // absent partition is a no-op
        store.remove_partition("token-a").await.unwrap();
    }

    #[tokio::test]
    async fn test_remove_partition_refuses_staging_name() {
        let (_dir, store, staging) = setup().await;

        let result = store.remove_partition("temp").await;
        assert!(matches!(result, Err(StoreError::InvalidToken(_))));
        assert!(staging.root().exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_remove_partition_accepts_any_listed_name() {
        let (_dir, store, _staging) = setup().await;

        // A backslash is an ordinary byte in a unix directory name. Such a
        // directory can never be created through the token gate but must
        // still be removable.
        fs::create_dir(store.root().join("stray\\dir")).await.unwrap();
        assert!(matches!(
            store.create_partition("stray\\dir").await,
            Err(StoreError::InvalidToken(_))
        ));

        store.remove_partition("stray\\dir").await.unwrap();
        assert!(!store.root().join("stray\\dir").exists());
    }
}
