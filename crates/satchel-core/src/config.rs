//! Configuration module
//!
//! This module provides the application configuration, loaded from the
//! environment with sensible defaults for everything except the signing
//! secret, which is required.

use std::env;
use std::path::Path;

use crate::constants::STAGING_DIR_NAME;

// Common constants
const SERVER_PORT: u16 = 3000;
const TOKEN_TTL_SECONDS: u64 = 3600;
const SWEEP_INTERVAL_SECONDS: u64 = 7200;
const SWEEP_CONCURRENCY: usize = 8;
const MAX_UPLOAD_SIZE_MB: usize = 50;
const PARTITIONS_ROOT: &str = "uploads";

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub public_base_url: String,
    pub cors_origins: Vec<String>,
    pub environment: String,
    pub jwt_secret: String,
    pub token_ttl_seconds: u64,
    pub sweep_interval_seconds: u64,
    pub sweep_concurrency: usize,
    pub partitions_root: String,
    pub staging_root: String,
    pub max_upload_size_mb: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        let is_production =
            environment.to_lowercase() == "production" || environment.to_lowercase() == "prod";
        if is_production && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        let server_port: u16 = env::var("PORT")
            .unwrap_or_else(|_| SERVER_PORT.to_string())
            .parse()
            .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?;

        let partitions_root =
            env::var("PARTITIONS_ROOT").unwrap_or_else(|_| PARTITIONS_ROOT.to_string());

        // The staging area defaults to a reserved subdirectory of the
        // partitions root; the sweeper skips it by name.
        let staging_root = env::var("STAGING_ROOT").unwrap_or_else(|_| {
            Path::new(&partitions_root)
                .join(STAGING_DIR_NAME)
                .to_string_lossy()
                .into_owned()
        });

        let config = Config {
            server_port,
            public_base_url: env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| format!("http://localhost:{server_port}")),
            cors_origins,
            environment,
            jwt_secret: env::var("JWT_SECRET")
                .map_err(|_| anyhow::anyhow!("JWT_SECRET must be set for token signing"))?,
            token_ttl_seconds: env::var("TOKEN_TTL_SECONDS")
                .unwrap_or_else(|_| TOKEN_TTL_SECONDS.to_string())
                .parse()
                .unwrap_or(TOKEN_TTL_SECONDS),
            sweep_interval_seconds: env::var("SWEEP_INTERVAL_SECONDS")
                .unwrap_or_else(|_| SWEEP_INTERVAL_SECONDS.to_string())
                .parse()
                .unwrap_or(SWEEP_INTERVAL_SECONDS),
            sweep_concurrency: env::var("SWEEP_CONCURRENCY")
                .unwrap_or_else(|_| SWEEP_CONCURRENCY.to_string())
                .parse()
                .unwrap_or(SWEEP_CONCURRENCY),
            partitions_root,
            staging_root,
            max_upload_size_mb: env::var("MAX_UPLOAD_SIZE_MB")
                .unwrap_or_else(|_| MAX_UPLOAD_SIZE_MB.to_string())
                .parse()
                .unwrap_or(MAX_UPLOAD_SIZE_MB),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.jwt_secret.len() < 32 {
            return Err(anyhow::anyhow!(
                "JWT_SECRET must be at least 32 characters long"
            ));
        }

        if self.token_ttl_seconds == 0 {
            return Err(anyhow::anyhow!(
                "TOKEN_TTL_SECONDS must be greater than zero"
            ));
        }

        if self.sweep_interval_seconds == 0 {
            return Err(anyhow::anyhow!(
                "SWEEP_INTERVAL_SECONDS must be greater than zero"
            ));
        }

        if self.sweep_concurrency == 0 {
            return Err(anyhow::anyhow!(
                "SWEEP_CONCURRENCY must be greater than zero"
            ));
        }

        Ok(())
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase().eq("production")
            || self.environment.to_lowercase().eq("prod")
    }

    pub fn max_upload_size_bytes(&self) -> usize {
        self.max_upload_size_mb * 1024 * 1024
    }

    /// Default lifetime applied to newly issued share tokens.
    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.token_ttl_seconds as i64)
    }

    /// Period between garbage collection sweeps.
    pub fn sweep_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.sweep_interval_seconds)
    }
}
