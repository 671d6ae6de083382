//! Query Routes
//!
//! - POST /query - Run dashboard query targets against the controller

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::api::error::ApiResult;
use crate::api::state::AppState;
use crate::query::{QueryOptions, QueryResponse};

/// POST /query
///
/// Per-target failures are returned in `errors` alongside the series of the
/// targets that succeeded.
pub async fn execute_query(
    State(state): State<Arc<AppState>>,
    Json(options): Json<QueryOptions>,
) -> ApiResult<Json<QueryResponse>> {
    let response = state.datasource.query(&options).await?;

    if response.is_partial() {
        tracing::info!(
            failed = response.errors.len(),
            series = response.data.len(),
            "Query completed with failed targets"
        );
    }

    Ok(Json(response))
}
