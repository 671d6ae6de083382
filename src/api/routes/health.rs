//! Health Routes
//!
//! - GET / - Controller connection test, as the dashboard host calls it
//! - GET /health/live - Liveness probe (process is alive)
//! - GET /health - Process status

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::api::dto::HealthResponse;
use crate::api::state::AppState;
use crate::datasource::TestResult;

/// GET /
///
/// Pings the controller. Always 200; the outcome is in the body.
pub async fn test_connection(State(state): State<Arc<AppState>>) -> Json<TestResult> {
    Json(state.datasource.test_datasource().await)
}

/// GET /health/live
///
/// Kubernetes liveness probe.
/// Returns 200 if the process is alive, no dependency checks.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// GET /health
pub async fn full_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_seconds: state.uptime_seconds(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
