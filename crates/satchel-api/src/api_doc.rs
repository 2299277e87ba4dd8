//! OpenAPI documentation.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use satchel_core::models;

/// Returns the OpenAPI spec served at `/api/openapi.json`.
pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Satchel API",
        version = "0.1.0",
        description = "Ephemeral file sharing API (v0). Files are uploaded as a batch and addressed by a signed, self-expiring share token; expired shares are reclaimed in the background. All endpoints are versioned under /api/v0/."
    ),
    paths(
        handlers::share_upload::create_share,
        handlers::share_get::get_share,
        handlers::share_download::download_share_file,
    ),
    components(schemas(
        models::ShareCreatedResponse,
        models::ShareResponse,
        error::ErrorResponse,
    )),
    tags(
        (name = "shares", description = "Create and fetch ephemeral file shares")
    )
)]
pub struct ApiDoc;
