//! Partition store abstraction
//!
//! This module defines the PartitionStore trait that partition backends must
//! implement.

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

use crate::staging::StagedFile;

/// Partition store operation errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Partition not found: {0}")]
    PartitionNotFound(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Invalid token name: {0}")]
    InvalidToken(String),

    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    #[error("Staging failed: {0}")]
    StageFailed(String),

    #[error("Partition creation failed: {0}")]
    CreateFailed(String),

    #[error("Commit failed: {0}")]
    CommitFailed(String),

    #[error("Partition removal failed: {0}")]
    RemoveFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for partition store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Partition store abstraction
///
/// The filesystem is the only index: a partition is a directory named by the
/// literal share token, and listing the partitions root is how the garbage
/// collector discovers candidates. Implementations validate every name before
/// touching the filesystem.
#[async_trait]
pub trait PartitionStore: Send + Sync {
    /// Create the partition for a token if it does not already exist.
    ///
    /// Idempotent: a second call with the same token is a no-op, and
    /// concurrent creators of the same token must not observe an error.
    async fn create_partition(&self, token: &str) -> StoreResult<PathBuf>;

    /// Move staged files into the token's partition.
    ///
    /// Any failure aborts the commit; no partial success is reported and the
    /// caller must not present a usable token afterwards.
    async fn commit_files(&self, token: &str, staged: &[StagedFile]) -> StoreResult<()>;

    /// List the filenames in the token's partition, sorted.
    ///
    /// `PartitionNotFound` is the routine shape of a share whose partition
    /// was already reclaimed, not an exceptional condition.
    async fn list_files(&self, token: &str) -> StoreResult<Vec<String>>;

    /// Resolve a filename inside the token's partition to a full path.
    ///
    /// Traversal attempts are rejected before any filesystem access.
    async fn resolve_file(&self, token: &str, filename: &str) -> StoreResult<PathBuf>;

    /// Names of the immediate subdirectories of the partitions root, sorted.
    /// The staging directory is included; candidate filtering is the
    /// caller's policy.
    async fn list_partitions(&self) -> StoreResult<Vec<String>>;

    /// Recursively delete one partition. Accepts any directory name a
    /// listing can report, so the sweep can reclaim entries that were never
    /// valid tokens. Removing an absent partition is not an error; the
    /// reserved staging name is refused.
    async fn remove_partition(&self, name: &str) -> StoreResult<()>;
}
