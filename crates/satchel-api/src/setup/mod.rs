//! Application setup and initialization
//!
//! This module contains all application initialization logic extracted from main.rs
//! for better organization and testability.

pub mod routes;
pub mod server;

use crate::state::AppState;
use anyhow::{Context, Result};
use satchel_core::{Config, TokenService};
use satchel_services::CleanupService;
use satchel_storage::{LocalPartitionStore, PartitionStore, StagingArea};
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Validate configuration first - fail fast on misconfiguration
    config
        .validate()
        .context("Configuration validation failed")?;

    // Telemetry next so the bootstrap steps below are logged
    crate::telemetry::init_telemetry();

    tracing::info!("Configuration loaded and validated successfully");

    // Bootstrap the storage roots; an unwritable root is a fatal startup error
    let store = LocalPartitionStore::new(&config.partitions_root)
        .await
        .context("Failed to prepare partitions root")?;
    let store: Arc<dyn PartitionStore> = Arc::new(store);

    let staging = StagingArea::new(&config.staging_root)
        .await
        .context("Failed to prepare staging root")?;

    let tokens = Arc::new(TokenService::new(&config.jwt_secret, config.token_ttl()));

    // The sweeper runs for the life of the process; its handle is not awaited
    let cleanup = Arc::new(CleanupService::new(
        tokens.clone(),
        store.clone(),
        config.sweep_interval(),
        config.sweep_concurrency,
    ));
    let _sweeper = cleanup.start();

    let state = Arc::new(AppState {
        tokens,
        store,
        staging,
        config: config.clone(),
    });

    // Setup routes
    let router = routes::setup_routes(&config, state.clone()).await?;

    Ok((state, router))
}
