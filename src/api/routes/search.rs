//! Search Routes
//!
//! Name lookups for the query editor and template variables. These never
//! fail: controller problems produce an empty list.
//!
//! - POST /search - Template variable lookup
//! - GET /applications?query= - Application names
//! - GET /applications/:app/metrics?query= - Metric tree completions

use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::sync::Arc;

use crate::api::dto::{NameQuery, SearchRequest};
use crate::api::state::AppState;

/// POST /search
pub async fn search(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SearchRequest>,
) -> Json<Vec<String>> {
    Json(state.datasource.metric_find_query(&req.target).await)
}

/// GET /applications
pub async fn application_names(
    State(state): State<Arc<AppState>>,
    Query(params): Query<NameQuery>,
) -> Json<Vec<String>> {
    Json(state.datasource.application_names(&params.query).await)
}

/// GET /applications/:app/metrics
pub async fn metric_names(
    State(state): State<Arc<AppState>>,
    Path(application): Path<String>,
    Query(params): Query<NameQuery>,
) -> Json<Vec<String>> {
    Json(state.datasource.metric_names(&application, &params.query).await)
}
