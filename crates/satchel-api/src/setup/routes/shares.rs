//! Share route group.

use crate::constants::API_PREFIX;
use crate::handlers;
use crate::state::AppState;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

pub fn share_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            &format!("{}/shares", API_PREFIX),
            post(handlers::share_upload::create_share),
        )
        .route(
            &format!("{}/shares/{{token}}", API_PREFIX),
            get(handlers::share_get::get_share),
        )
        .route(
            &format!("{}/shares/{{token}}/files/{{filename}}", API_PREFIX),
            get(handlers::share_download::download_share_file),
        )
        .with_state(state)
}
