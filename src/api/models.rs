//! Response bodies of the HTTP API that are not part of the manifest.

use serde::Serialize;

use crate::observability::MetricsSnapshot;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub teams_version: u8,
    pub thumbnails_generated: u64,
    pub metrics: MetricsSnapshot,
}
