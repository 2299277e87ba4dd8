//! Shared helpers for HTTP handlers.

pub mod multipart;
