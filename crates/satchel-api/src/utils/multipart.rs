//! Common utilities for file upload handlers

use axum::extract::multipart::MultipartError;
use axum::extract::Multipart;
use axum::http::StatusCode;
use satchel_core::AppError;

/// A file extracted from a multipart form, buffered in memory.
pub struct UploadedFile {
    pub original_name: String,
    pub data: Vec<u8>,
}

/// Extract every file from a multipart form.
///
/// Any field carrying a filename counts as a file, whatever the field is
/// named; fields without one (plain text inputs, or a file input the user
/// left empty) are skipped. A form with no files at all is rejected.
pub async fn extract_multipart_files(
    mut multipart: Multipart,
) -> Result<Vec<UploadedFile>, AppError> {
    let mut files = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_app_error)? {
        let Some(original_name) = field.file_name().map(|s| s.to_string()) else {
            continue;
        };
        if original_name.is_empty() {
            continue;
        }

        let data = field.bytes().await.map_err(multipart_app_error)?;

        files.push(UploadedFile {
            original_name,
            data: data.to_vec(),
        });
    }

    if files.is_empty() {
        return Err(AppError::InvalidInput(
            "You did not select any files".to_string(),
        ));
    }

    Ok(files)
}

/// The body limit layer surfaces as a multipart read error mid-stream; keep
/// the 413 status instead of flattening everything to 400.
fn multipart_app_error(err: MultipartError) -> AppError {
    let message = format!("Failed to read multipart form: {}", err.body_text());
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(message)
    } else {
        AppError::InvalidInput(message)
    }
}
