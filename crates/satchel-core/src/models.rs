use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Response returned after a successful upload
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ShareCreatedResponse {
    /// Share token; also the final path segment of `url`
    pub token: String,
    /// Absolute link to the share view
    pub url: String,
    /// Original filenames of the batch
    pub files: Vec<String>,
    pub expires_at: DateTime<Utc>,
}

/// Share view response (files behind a valid token)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ShareResponse {
    pub files: Vec<String>,
    pub expires_at: DateTime<Utc>,
}
