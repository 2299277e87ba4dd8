//! Satchel Core Library
//!
//! This crate provides the share token service, error types, configuration, and
//! response models that are shared across all Satchel components.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod token;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use token::{IssuedToken, ShareClaims, TokenError, TokenService};
