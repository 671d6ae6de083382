//! AppDynamics Data Source
//!
//! The entry points a dashboard host calls: time-series queries, the
//! connection test, and name lookups for the query editor. Holds the
//! controller client and the planner; keeps no per-query state.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::Config;
use crate::controller::{ControllerApi, ControllerError, HttpControllerClient};
use crate::query::names::upstream_metric_path;
use crate::query::{
    aggregate, filter_names, MetricQueryPlanner, PatternLimits, QueryOptions, QueryResponse,
    QueryResult, QueryTarget, TimeRange,
};

/// Separates application from metric path in a template variable query
pub const FIND_QUERY_SEPARATOR: &str = "::";

/// Outcome of the connection test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    Success,
    Failure,
}

/// Connection test result shown in the data source settings page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResult {
    pub status: TestStatus,
    pub message: String,
    pub title: String,
}

impl TestResult {
    fn success() -> Self {
        Self {
            status: TestStatus::Success,
            message: "Data source is working".to_string(),
            title: "Success".to_string(),
        }
    }

    fn failure(error: &ControllerError) -> Self {
        Self {
            status: TestStatus::Failure,
            message: format!("Data source is not working: {}", error),
            title: "Failure".to_string(),
        }
    }
}

/// Data source bound to one controller
pub struct AppDynamicsDatasource {
    client: Arc<dyn ControllerApi>,
    planner: MetricQueryPlanner,
}

impl AppDynamicsDatasource {
    pub fn new(client: Arc<dyn ControllerApi>, limits: PatternLimits) -> Self {
        Self {
            client,
            planner: MetricQueryPlanner::new(limits),
        }
    }

    /// Build a data source talking HTTP to the configured controller
    pub fn from_config(config: &Config) -> Result<Self, ControllerError> {
        let client = HttpControllerClient::new(config.controller.client_config())?;
        Ok(Self::new(Arc::new(client), config.query.pattern_limits()))
    }

    /// Run a dashboard query. Only an unresolvable time range fails the whole
    /// request; target failures are reported in the response.
    pub async fn query(&self, options: &QueryOptions) -> QueryResult<QueryResponse> {
        let range = TimeRange::resolve(&options.range.from, &options.range.to, Utc::now())?;
        Ok(self.query_range(&options.targets, &range).await)
    }

    /// Run targets over an already resolved range
    pub async fn query_range(&self, targets: &[QueryTarget], range: &TimeRange) -> QueryResponse {
        tracing::debug!(
            targets = targets.len(),
            start = range.start_ms,
            end = range.end_ms,
            "Running query"
        );
        aggregate(&self.planner, targets, range, self.client.as_ref()).await
    }

    /// Ping the controller. Never fails; problems become a `failure` result.
    pub async fn test_datasource(&self) -> TestResult {
        match self.client.ping().await {
            Ok(()) => TestResult::success(),
            Err(e) => {
                tracing::warn!(error = %e, "Controller connection test failed");
                TestResult::failure(&e)
            }
        }
    }

    /// Application names containing `query`. Empty on any controller error.
    pub async fn application_names(&self, query: &str) -> Vec<String> {
        match self.client.applications().await {
            Ok(entries) => filter_names(query, &entries),
            Err(e) => {
                tracing::warn!(error = %e, "Listing applications failed");
                Vec::new()
            }
        }
    }

    /// Metric tree completions under `application` for a partially typed
    /// path. Empty on any controller error.
    pub async fn metric_names(&self, application: &str, query: &str) -> Vec<String> {
        let folder = upstream_metric_path(query);

        match self.client.metrics(application, folder).await {
            Ok(entries) => filter_names(query, &entries),
            Err(e) => {
                tracing::warn!(
                    application = %application,
                    folder = folder.unwrap_or(""),
                    error = %e,
                    "Listing metrics failed"
                );
                Vec::new()
            }
        }
    }

    /// Template variable lookup: `<app>::<path query>` completes metric
    /// paths, anything else completes application names.
    pub async fn metric_find_query(&self, query: &str) -> Vec<String> {
        match query.split_once(FIND_QUERY_SEPARATOR) {
            Some((application, path)) => self.metric_names(application.trim(), path).await,
            None => self.application_names(query.trim()).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::fake::{entry, FakeController};
    use crate::controller::CatalogEntry;
    use crate::query::{RangeBound, RangeSpec};

    fn datasource(controller: FakeController) -> (AppDynamicsDatasource, Arc<FakeController>) {
        let controller = Arc::new(controller);
        let client: Arc<dyn ControllerApi> = controller.clone();
        (
            AppDynamicsDatasource::new(client, PatternLimits::default()),
            controller,
        )
    }

    fn metric_tree() -> FakeController {
        FakeController::new()
            .with_metrics(
                "",
                vec![
                    CatalogEntry::new("Business Transaction Performance", Some("folder")),
                    CatalogEntry::new("Overall Application Performance", Some("folder")),
                ],
            )
            .with_metrics(
                "Business Transaction Performance",
                vec![
                    CatalogEntry::new("Business Transactions", Some("folder")),
                    CatalogEntry::new("Business Transaction Groups", Some("folder")),
                ],
            )
    }

    #[tokio::test]
    async fn test_query_end_to_end() {
        let generalized = "Business Transaction Performance|*|Java|*";
        let (ds, controller) = datasource(FakeController::new().with_series(
            generalized,
            vec![
                entry(
                    "Business Transaction Performance|OrdersApp|Java|/product/indoor|Calls per Minute",
                    &[(7.0, 1_000)],
                ),
                entry(
                    "Business Transaction Performance|Billing|Java|/invoice|Calls per Minute",
                    &[(1.0, 1_000)],
                ),
            ],
        ));

        let options = QueryOptions {
            range: RangeSpec {
                from: RangeBound::Millis(999.5),
                to: RangeBound::Expr("5000".into()),
            },
            targets: vec![QueryTarget::new(
                "Orders",
                "Business Transaction Performance|Orders.*|Java|*",
            )],
        };

        let response = ds.query(&options).await.unwrap();
        assert_eq!(response.data.len(), 1);
        assert_eq!(response.data[0].label, "/product/indoor");
        assert_eq!(response.data[0].points, vec![(7.0, 1_000)]);

        let requests = controller.requests();
        assert_eq!(requests[0].metric_path, generalized);
        assert_eq!(requests[0].start_time, 1_000);
        assert_eq!(requests[0].end_time, 5_000);
    }

    #[tokio::test]
    async fn test_query_rejects_bad_range() {
        let (ds, _) = datasource(FakeController::new());
        let options = QueryOptions {
            range: RangeSpec {
                from: RangeBound::Expr("last tuesday".into()),
                to: RangeBound::Expr("now".into()),
            },
            targets: vec![],
        };
        assert!(ds.query(&options).await.is_err());
    }

    #[tokio::test]
    async fn test_datasource_success() {
        let (ds, _) = datasource(FakeController::new());
        let result = ds.test_datasource().await;
        assert_eq!(result.status, TestStatus::Success);
        assert_eq!(result.title, "Success");
        assert_eq!(result.message, "Data source is working");
    }

    #[tokio::test]
    async fn test_datasource_failure_is_structured() {
        let (ds, _) = datasource(FakeController::new().ping_status(401));
        let result = ds.test_datasource().await;
        assert_eq!(result.status, TestStatus::Failure);
        assert_eq!(result.title, "Failure");
        assert!(result.message.contains("401"));

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "failure");
    }

    #[tokio::test]
    async fn test_application_names() {
        let (ds, _) = datasource(FakeController::new().with_applications(&["Orders", "Billing", "OrderHistory"]));
        assert_eq!(ds.application_names("order").await, vec!["Orders", "OrderHistory"]);
        assert_eq!(ds.application_names("").await.len(), 3);
    }

    #[tokio::test]
    async fn test_catalog_failures_yield_empty() {
        let (ds, _) = datasource(FakeController::new().with_applications(&["Orders"]).catalog_down());
        assert!(ds.application_names("").await.is_empty());
        assert!(ds.metric_names("Orders", "Business").await.is_empty());
    }

    #[tokio::test]
    async fn test_metric_names_at_root() {
        let (ds, controller) = datasource(metric_tree());
        let names = ds.metric_names("Orders", "business").await;
        assert_eq!(names, vec!["Business Transaction Performance|"]);
        assert_eq!(controller.metric_paths(), vec![None]);
    }

    #[tokio::test]
    async fn test_metric_names_below_folder() {
        let (ds, controller) = datasource(metric_tree());
        let names = ds
            .metric_names("Orders", "Business Transaction Performance|Business Transactions")
            .await;
        assert_eq!(
            names,
            vec!["Business Transaction Performance|Business Transactions|"]
        );
        assert_eq!(
            controller.metric_paths(),
            vec![Some("Business Transaction Performance".to_string())]
        );
    }

    #[tokio::test]
    async fn test_metric_find_query() {
        let (ds, _) = datasource(metric_tree().with_applications(&["Orders", "Billing"]));
        assert_eq!(ds.metric_find_query("bill").await, vec!["Billing"]);
        assert_eq!(
            ds.metric_find_query("Orders::Overall").await,
            vec!["Overall Application Performance|"]
        );
    }
}
