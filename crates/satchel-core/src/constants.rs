//! Shared constants used across Satchel crates.

/// Name of the staging directory that lives under the partitions root.
///
/// Uploads are written here before they are committed into a token-named
/// partition, so the sweeper must never treat it as a share partition.
pub const STAGING_DIR_NAME: &str = "temp";
