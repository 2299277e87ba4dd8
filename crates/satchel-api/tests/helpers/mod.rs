//! Test helpers: build AppState and router for integration tests.
//!
//! Run from workspace root: `cargo test -p satchel-api --test shares_test` or
//! `cargo test -p satchel-api`. Everything runs on temp directories; no
//! external services are required.

use axum_test::TestServer;
use satchel_api::setup::routes::setup_routes;
use satchel_api::state::AppState;
use satchel_core::{Config, TokenService};
use satchel_storage::{LocalPartitionStore, PartitionStore, StagingArea};
use std::sync::Arc;
use tempfile::TempDir;

/// Signing secret used by every test app (32+ characters).
pub const TEST_JWT_SECRET: &str = "integration-test-secret-0123456789abcdef";

/// Test application: server plus the state backing it.
pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    pub _temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }
}

/// Setup a test app on temp directories with default configuration.
pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(|_| {}).await
}

/// Setup a test app, letting the caller tweak the config first.
pub async fn setup_test_app_with(adjust: impl FnOnce(&mut Config)) -> TestApp {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let partitions_root = temp_dir.path().join("uploads");
    let staging_root = partitions_root.join("temp");

    let mut config = Config {
        server_port: 0,
        public_base_url: "http://localhost:3000".to_string(),
        cors_origins: vec!["*".to_string()],
        environment: "test".to_string(),
        jwt_secret: TEST_JWT_SECRET.to_string(),
        token_ttl_seconds: 3600,
        sweep_interval_seconds: 7200,
        sweep_concurrency: 4,
        partitions_root: partitions_root.to_string_lossy().into_owned(),
        staging_root: staging_root.to_string_lossy().into_owned(),
        max_upload_size_mb: 50,
    };
    adjust(&mut config);

    let store: Arc<dyn PartitionStore> = Arc::new(
        LocalPartitionStore::new(&config.partitions_root)
            .await
            .expect("Failed to create partition store"),
    );
    let staging = StagingArea::new(&config.staging_root)
        .await
        .expect("Failed to create staging area");
    let tokens = Arc::new(TokenService::new(&config.jwt_secret, config.token_ttl()));

    let state = Arc::new(AppState {
        tokens,
        store,
        staging,
        config: config.clone(),
    });

    let router = setup_routes(&config, state.clone())
        .await
        .expect("Failed to build router");

    let server = TestServer::new(router).expect("Failed to start test server");

    TestApp {
        server,
        state,
        _temp_dir: temp_dir,
    }
}
