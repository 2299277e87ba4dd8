//! Application state shared across HTTP handlers.

use std::sync::Arc;

use satchel_core::{Config, TokenService};
use satchel_storage::{PartitionStore, StagingArea};

use crate::constants::API_PREFIX;

/// Shared application state, handed to handlers as `State<Arc<AppState>>`.
pub struct AppState {
    pub config: Config,
    pub tokens: Arc<TokenService>,
    pub store: Arc<dyn PartitionStore>,
    pub staging: StagingArea,
}

impl AppState {
    /// Absolute URL a client can use to view the share.
    pub fn share_url(&self, token: &str) -> String {
        format!(
            "{}{}/shares/{}",
            self.config.public_base_url.trim_end_matches('/'),
            API_PREFIX,
            token
        )
    }
}
