//! Shared name validation for partition operations.
//!
//! Partition names are literal share tokens and file entries keep their
//! original upload names. Both are used as a single path component under the
//! partitions root, so anything that could escape one directory level is
//! rejected here, before any filesystem access. Removal takes a looser gate:
//! the sweep must be able to reclaim any directory a listing reports,
//! including names that were never valid tokens.

use std::path::{Component, Path};

use satchel_core::constants::STAGING_DIR_NAME;

use crate::traits::{StoreError, StoreResult};

/// Upper bound on filename bytes. Leaves room for the staging prefix within
/// the common 255-byte filesystem name limit.
const MAX_FILENAME_BYTES: usize = 200;

/// Validate a token used as a partition name.
pub(crate) fn validate_token_name(token: &str) -> StoreResult<()> {
    if token.is_empty() {
        return Err(StoreError::InvalidToken("token is empty".to_string()));
    }
    if token == STAGING_DIR_NAME {
        return Err(StoreError::InvalidToken(
            "token collides with the reserved staging directory".to_string(),
        ));
    }
    if !is_single_component(token) {
        return Err(StoreError::InvalidToken(
            "token contains path separators or traversal sequences".to_string(),
        ));
    }
    Ok(())
}

/// Validate an original upload filename used as a partition entry.
pub(crate) fn validate_filename(filename: &str) -> StoreResult<()> {
    if filename.is_empty() {
        return Err(StoreError::InvalidFilename("filename is empty".to_string()));
    }
    if filename.len() > MAX_FILENAME_BYTES {
        return Err(StoreError::InvalidFilename(format!(
            "filename exceeds {} bytes",
            MAX_FILENAME_BYTES
        )));
    }
    if filename.chars().any(|c| c.is_control()) {
        return Err(StoreError::InvalidFilename(
            "filename contains control characters".to_string(),
        ));
    }
    if !is_single_component(filename) {
        return Err(StoreError::InvalidFilename(
            "filename contains path separators or traversal sequences".to_string(),
        ));
    }
    Ok(())
}

/// Validate a directory name for removal.
///
/// Candidates come straight from a directory listing and may carry names
/// that could never have been issued as tokens. Containment is the only
/// requirement here: one normal path component, never the reserved staging
/// directory. `Path::components` keeps the check platform-correct; a
/// backslash is an ordinary byte in a unix directory name and must not
/// block reclamation.
pub(crate) fn validate_candidate_name(name: &str) -> StoreResult<()> {
    if name == STAGING_DIR_NAME {
        return Err(StoreError::InvalidToken(
            "refusing the reserved staging directory".to_string(),
        ));
    }

    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(StoreError::InvalidToken(
            "name is not a single path component".to_string(),
        )),
    }
}

/// True when `name` parses as exactly one normal path component.
fn is_single_component(name: &str) -> bool {
    if name.contains('/') || name.contains('\\') || name.contains('\0') {
        return false;
    }

    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
