//! Satchel Storage Library
//!
//! This crate provides the partition store abstraction and its local
//! filesystem implementation, plus the staging area for in-flight uploads.
//!
//! # Partition layout
//!
//! A partition is a directory directly under the partitions root, named by
//! the literal share token, holding the batch's files under their original
//! names. The reserved `temp` subdirectory (the default staging area) is
//! never a partition. Name validation is centralized in the `names` module
//! so every operation applies the same rules before touching the filesystem.

pub mod local;
pub(crate) mod names;
pub mod staging;
pub mod traits;

// Re-export commonly used types
pub use local::LocalPartitionStore;
pub use staging::{StagedFile, StagingArea};
pub use traits::{PartitionStore, StoreError, StoreResult};
