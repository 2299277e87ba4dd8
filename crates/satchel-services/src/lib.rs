//! Satchel Services Layer
//!
//! This crate is the **business service layer**: it hosts the garbage
//! collector that reconciles the partitions directory against token
//! validity. Keep lifecycle coordination here; keep thin HTTP handling in
//! satchel-api.

pub mod cleanup;

pub use cleanup::{CleanupService, SweepSummary};
