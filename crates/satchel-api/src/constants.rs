//! API-level constants.

/// Prefix for all versioned API routes (currently v0).
pub const API_PREFIX: &str = "/api/v0";
