//! HTTP handlers for the share endpoints.

pub mod share_download;
pub mod share_get;
pub mod share_upload;
