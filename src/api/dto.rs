//! Data Transfer Objects
//!
//! Request and response types for the API endpoints that are not already
//! defined by the query layer.

use serde::{Deserialize, Serialize};

/// Body of `POST /search`
#[derive(Debug, Default, Deserialize)]
pub struct SearchRequest {
    /// Free text, or `<app>::<path>` for metric names
    #[serde(default)]
    pub target: String,
}

/// Query string of the autocomplete endpoints
#[derive(Debug, Default, Deserialize)]
pub struct NameQuery {
    #[serde(default)]
    pub query: String,
}

/// Response of `GET /health`
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_seconds: u64,
    pub version: String,
}
