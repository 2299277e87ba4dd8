use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use satchel_core::models::ShareResponse;
use satchel_core::AppError;

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

/// Share view: the signed token is the only credential. A verified token
/// lists whatever the partition currently holds.
#[utoipa::path(
    get,
    path = "/api/v0/shares/{token}",
    tag = "shares",
    params(
        ("token" = String, Path, description = "Share token")
    ),
    responses(
        (status = 200, description = "Files available under this share", body = ShareResponse),
        (status = 404, description = "Share link is invalid or expired", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip_all, fields(operation = "get_share"))]
pub async fn get_share(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<Json<ShareResponse>, HttpAppError> {
    let claims = state.tokens.verify(&token)?;

    // A verified token whose partition is already gone reads as expired too.
    let files = state.store.list_files(&token).await?;

    let expires_at = claims.expires_at().ok_or_else(|| {
        AppError::Internal(format!(
            "Token expiry out of datetime range: {}",
            claims.exp
        ))
    })?;

    Ok(Json(ShareResponse { files, expires_at }))
}
