use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use satchel_core::models::ShareCreatedResponse;
use satchel_core::AppError;
use satchel_storage::{StagedFile, StoreError};

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use crate::utils::multipart::{extract_multipart_files, UploadedFile};

/// Upload handler
///
/// Stages every file part, then publishes the batch under a freshly issued
/// share token: issue -> create partition -> commit. The token is returned
/// only after every file landed; any failure along the way discards the
/// staged remnants and the partial partition so no usable token escapes.
#[utoipa::path(
    post,
    path = "/api/v0/shares",
    tag = "shares",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Share created", body = ShareCreatedResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 413, description = "Upload too large", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(operation = "create_share"))]
pub async fn create_share(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ShareCreatedResponse>), HttpAppError> {
    let start = std::time::Instant::now();

    let files = extract_multipart_files(multipart).await?;
    let staged = stage_files(&state, &files).await?;
    let file_names: Vec<String> = staged.iter().map(|s| s.original_name.clone()).collect();

    let issued = match state.tokens.issue(file_names.clone()) {
        Ok(issued) => issued,
        Err(e) => {
            abandon_upload(&state, staged, None);
            return Err(HttpAppError(AppError::from(e)));
        }
    };

    if let Err(e) = state.store.create_partition(&issued.token).await {
        abandon_upload(&state, staged, None);
        return Err(e.into());
    }

    if let Err(e) = state.store.commit_files(&issued.token, &staged).await {
        // A half-filled partition must not stay reachable under a live token.
        abandon_upload(&state, staged, Some(issued.token));
        return Err(e.into());
    }

    tracing::debug!(
        file_count = file_names.len(),
        duration_ms = start.elapsed().as_secs_f64() * 1000.0,
        "Share created"
    );

    let response = ShareCreatedResponse {
        url: state.share_url(&issued.token),
        token: issued.token,
        files: file_names,
        expires_at: issued.expires_at,
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// Write every upload into the staging area; on failure nothing staged here
/// survives.
async fn stage_files(
    state: &Arc<AppState>,
    files: &[UploadedFile],
) -> Result<Vec<StagedFile>, HttpAppError> {
    let mut staged = Vec::with_capacity(files.len());

    for file in files {
        match state.staging.stage(&file.original_name, &file.data).await {
            Ok(s) => staged.push(s),
            Err(e) => {
                abandon_upload(state, staged, None);
                return Err(match e {
                    // On upload a hostile filename is the client's mistake,
                    // not a missing resource.
                    StoreError::InvalidFilename(msg) => {
                        HttpAppError(AppError::InvalidInput(format!("Invalid filename: {}", msg)))
                    }
                    other => other.into(),
                });
            }
        }
    }

    Ok(staged)
}

/// Best-effort cleanup after a failed upload, off the request path. Failures
/// are logged and the response is not delayed.
fn abandon_upload(state: &Arc<AppState>, staged: Vec<StagedFile>, token: Option<String>) {
    let state = state.clone();
    tokio::spawn(async move {
        for file in &staged {
            state.staging.discard(file).await;
        }
        if let Some(token) = token {
            if let Err(e) = state.store.remove_partition(&token).await {
                tracing::error!(error = %e, "Failed to remove partition after failed upload");
            }
        }
    });
}
