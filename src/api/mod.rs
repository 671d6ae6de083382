//! Data Source HTTP API
//!
//! Exposes the data source to a dashboard host over the JSON data source
//! protocol, built with Axum.
//!
//! # Endpoints
//!
//! ## Data source
//! - `GET /` - Controller connection test
//! - `POST /query` - Run query targets
//! - `POST /search` - Template variable lookup
//!
//! ## Query editor
//! - `GET /applications?query=` - Application name completions
//! - `GET /applications/:app/metrics?query=` - Metric path completions
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health` - Process status
//!
//! # Example
//!
//! ```rust,ignore
//! use appd_datasource::api::{serve, AppState};
//! use appd_datasource::{AppDynamicsDatasource, Config};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env();
//!     let datasource = Arc::new(AppDynamicsDatasource::from_config(&config)?);
//!
//!     let state = AppState::new(datasource, config.api.clone());
//!     serve(state, &config.api).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::AppState;

use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::ApiConfig;

/// Build the API router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    let datasource_routes = Router::new()
        .route("/", get(routes::health::test_connection))
        .route("/query", post(routes::query::execute_query))
        .route("/search", post(routes::search::search))
        .route("/applications", get(routes::search::application_names))
        .route(
            "/applications/:app/metrics",
            get(routes::search::metric_names),
        );

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/", get(routes::health::full_health));

    // Create shared state
    let shared_state = Arc::new(state);

    datasource_routes
        .nest("/health", health_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(shared_state)
}

fn cors_layer(config: &ApiConfig) -> CorsLayer {
    if config.cors_origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Start the API server
pub async fn serve(state: AppState, config: &ApiConfig) -> Result<(), ApiError> {
    let router = build_router(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Data source API listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("Data source API shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::fake::{entry, FakeController};
    use crate::controller::{CatalogEntry, ControllerApi};
    use crate::datasource::AppDynamicsDatasource;
    use crate::query::PatternLimits;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::util::ServiceExt;

    const CALLS: &str = "Overall Application Performance|Calls per Minute";
    const ERRORS: &str = "Overall Application Performance|Errors per Minute";

    fn create_test_app(controller: FakeController) -> Router {
        create_test_app_with(controller, ApiConfig::default())
    }

    fn create_test_app_with(controller: FakeController, config: ApiConfig) -> Router {
        let client: Arc<dyn ControllerApi> = Arc::new(controller);
        let datasource = Arc::new(AppDynamicsDatasource::new(client, PatternLimits::default()));
        build_router(AppState::new(datasource, config))
    }

    fn with_origin(uri: &str, origin: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header("Origin", origin)
            .body(Body::empty())
            .unwrap()
    }

    fn allow_origin(response: &axum::response::Response) -> Option<&str> {
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok())
    }

    fn controller() -> FakeController {
        FakeController::new()
            .with_series(CALLS, vec![entry(CALLS, &[(10.0, 1_000), (12.0, 2_000)])])
            .failing(ERRORS)
            .with_applications(&["Orders", "Billing"])
            .with_metrics(
                "Overall Application Performance",
                vec![
                    CatalogEntry::new("Calls per Minute", Some("leaf")),
                    CatalogEntry::new("Errors per Minute", Some("leaf")),
                ],
            )
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health_live() {
        let app = create_test_app(controller());
        let response = app.oneshot(get("/health/live")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_full() {
        let app = create_test_app(controller());
        let response = app.oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_connection_test_reports_failure_in_body() {
        let app = create_test_app(controller().ping_status(503));
        let response = app.oneshot(get("/")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "failure");
        assert_eq!(json["title"], "Failure");
    }

    #[tokio::test]
    async fn test_query_partial_success() {
        let app = create_test_app(controller());
        let body = serde_json::json!({
            "range": {"from": "2024-03-31T11:00:00Z", "to": "2024-03-31T12:00:00Z"},
            "targets": [
                {"refId": "A", "application": "Orders", "metric": CALLS},
                {"refId": "B", "application": "Orders", "metric": ERRORS}
            ]
        });

        let response = app.oneshot(post_json("/query", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(
            json["data"],
            serde_json::json!([{"target": CALLS, "datapoints": [[10.0, 1000], [12.0, 2000]]}])
        );
        assert_eq!(json["errors"][0]["refId"], "B");
        assert_eq!(json["errors"][0]["index"], 1);
    }

    #[tokio::test]
    async fn test_query_bad_range() {
        let app = create_test_app(controller());
        let body = serde_json::json!({
            "range": {"from": "now", "to": "now-1h"},
            "targets": [{"application": "Orders", "metric": CALLS}]
        });

        let response = app.oneshot(post_json("/query", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_query_invalid_json() {
        let app = create_test_app(controller());
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/query")
                    .header("Content-Type", "application/json")
                    .body(Body::from("not json"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_search_applications() {
        let app = create_test_app(controller());
        let response = app
            .oneshot(post_json("/search", serde_json::json!({"target": "ord"})))
            .await
            .unwrap();

        assert_eq!(body_json(response).await, serde_json::json!(["Orders"]));
    }

    #[tokio::test]
    async fn test_application_names_route() {
        let app = create_test_app(controller());
        let response = app.oneshot(get("/applications?query=b")).await.unwrap();
        assert_eq!(body_json(response).await, serde_json::json!(["Billing"]));
    }

    #[tokio::test]
    async fn test_metric_names_route() {
        let app = create_test_app(controller());
        let response = app
            .oneshot(get(
                "/applications/Orders/metrics?query=Overall%20Application%20Performance%7Cerr",
            ))
            .await
            .unwrap();

        assert_eq!(
            body_json(response).await,
            serde_json::json!(["Overall Application Performance|Errors per Minute"])
        );
    }

    #[tokio::test]
    async fn test_catalog_outage_is_empty_list() {
        let app = create_test_app(controller().catalog_down());
        let response = app.oneshot(get("/applications")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_cors_permissive_by_default() {
        let app = create_test_app(controller());
        let response = app
            .oneshot(with_origin("/health/live", "https://dash.example.com"))
            .await
            .unwrap();

        assert_eq!(allow_origin(&response), Some("*"));
    }

    #[tokio::test]
    async fn test_cors_origin_allow_list() {
        let config = ApiConfig {
            cors_origins: vec![
                "https://dash.example.com".to_string(),
                "bad\norigin".to_string(),
            ],
            ..ApiConfig::default()
        };

        let app = create_test_app_with(controller(), config);

        let response = app
            .clone()
            .oneshot(with_origin("/health/live", "https://dash.example.com"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(allow_origin(&response), Some("https://dash.example.com"));

        let response = app
            .oneshot(with_origin("/health/live", "https://other.example.com"))
            .await
            .unwrap();
        assert_eq!(allow_origin(&response), None);
    }
}
