use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, Response, StatusCode},
    response::IntoResponse,
};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use satchel_core::AppError;
use tokio_util::io::ReaderStream;

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/v0/shares/{token}/files/{filename}",
    tag = "shares",
    params(
        ("token" = String, Path, description = "Share token"),
        ("filename" = String, Path, description = "Name of a file inside the share")
    ),
    responses(
        (status = 200, description = "File contents", content_type = "application/octet-stream"),
        (status = 404, description = "Share or file not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip_all, fields(operation = "download_share_file"))]
pub async fn download_share_file(
    State(state): State<Arc<AppState>>,
    Path((token, filename)): Path<(String, String)>,
) -> Result<impl IntoResponse, HttpAppError> {
    state.tokens.verify(&token)?;

    let path = state.store.resolve_file(&token, &filename).await?;

    let file = match tokio::fs::File::open(&path).await {
        Ok(file) => file,
        // The sweeper can reclaim the partition between resolve and open.
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(HttpAppError(AppError::NotFound(
                "File not found".to_string(),
            )));
        }
        Err(e) => {
            return Err(HttpAppError(AppError::Storage(format!(
                "Failed to open committed file: {}",
                e
            ))));
        }
    };

    tracing::debug!(file = %filename, "Streaming share file");

    let stream = ReaderStream::new(file);

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition(&filename).as_str(),
        )
        .header(header::CACHE_CONTROL, "no-store")
        .body(Body::from_stream(stream))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {}", e)))?;

    Ok(response)
}

/// Attachment disposition with an ASCII fallback name plus the RFC 5987
/// `filename*` form so non-ASCII names survive as header values.
fn content_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let encoded = utf8_percent_encode(filename, NON_ALPHANUMERIC);

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback, encoded
    )
}
