//! Result Aggregation
//!
//! Runs every target of a dashboard query concurrently and joins the results.
//! Targets fail independently: an error in one is recorded against that
//! target and the others still contribute their series.

use futures_util::future::join_all;

use crate::controller::ControllerApi;
use crate::query::model::{QueryResponse, QueryTarget, TargetError};
use crate::query::planner::MetricQueryPlanner;
use crate::query::time::TimeRange;

/// Execute all visible targets and combine them in submission order.
///
/// The per-target futures are polled together on the calling task; nothing
/// is spawned and no state is shared between them.
pub async fn aggregate(
    planner: &MetricQueryPlanner,
    targets: &[QueryTarget],
    range: &TimeRange,
    client: &dyn ControllerApi,
) -> QueryResponse {
    let runs = targets
        .iter()
        .enumerate()
        .filter(|(_, target)| !target.hide)
        .map(|(index, target)| async move {
            let outcome = planner.plan_and_execute(target, range, client).await;
            (index, target, outcome)
        });

    // join_all yields in input order regardless of completion order
    let outcomes = join_all(runs).await;

    let mut response = QueryResponse::default();
    for (index, target, outcome) in outcomes {
        match outcome {
            Ok(series) => response.data.extend(series),
            Err(e) => {
                tracing::warn!(
                    index,
                    ref_id = target.ref_id.as_deref().unwrap_or("-"),
                    application = %target.application,
                    error = %e,
                    "Query target failed"
                );
                response.errors.push(TargetError {
                    ref_id: target.ref_id.clone(),
                    index,
                    message: e.to_string(),
                });
            }
        }
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::fake::{entry, FakeController};
    use std::time::Duration;

    const CALLS: &str = "Overall Application Performance|Calls per Minute";
    const ERRORS: &str = "Overall Application Performance|Errors per Minute";
    const RESPONSE: &str = "Overall Application Performance|Average Response Time (ms)";

    fn controller() -> FakeController {
        FakeController::new()
            .with_series(CALLS, vec![entry(CALLS, &[(10.0, 1_000)])])
            .with_series(ERRORS, vec![entry(ERRORS, &[(2.0, 1_000)])])
            .with_series(RESPONSE, vec![entry(RESPONSE, &[(250.0, 1_000)])])
    }

    fn range() -> TimeRange {
        TimeRange::new(0, 10_000).unwrap()
    }

    fn targets() -> Vec<QueryTarget> {
        vec![
            QueryTarget::new("Orders", CALLS).ref_id("A"),
            QueryTarget::new("Orders", ERRORS).ref_id("B"),
            QueryTarget::new("Orders", RESPONSE).ref_id("C"),
        ]
    }

    fn labels(response: &QueryResponse) -> Vec<&str> {
        response.data.iter().map(|s| s.label.as_str()).collect()
    }

    #[tokio::test]
    async fn test_all_targets_succeed() {
        let response =
            aggregate(&MetricQueryPlanner::default(), &targets(), &range(), &controller()).await;

        assert_eq!(labels(&response), vec![CALLS, ERRORS, RESPONSE]);
        assert!(!response.is_partial());
    }

    #[tokio::test]
    async fn test_one_failure_does_not_poison_siblings() {
        let controller = controller().failing(ERRORS);
        let response =
            aggregate(&MetricQueryPlanner::default(), &targets(), &range(), &controller).await;

        assert_eq!(labels(&response), vec![CALLS, RESPONSE]);
        assert_eq!(response.errors.len(), 1);
        assert_eq!(response.errors[0].index, 1);
        assert_eq!(response.errors[0].ref_id.as_deref(), Some("B"));
        assert!(response.errors[0].message.contains("500"));
        assert_eq!(controller.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_pattern_error_is_per_target() {
        let mut targets = targets();
        targets[0].metric = "Overall Application Performance|[calls".into();

        let response =
            aggregate(&MetricQueryPlanner::default(), &targets, &range(), &controller()).await;

        assert_eq!(labels(&response), vec![ERRORS, RESPONSE]);
        assert_eq!(response.errors[0].index, 0);
    }

    #[tokio::test]
    async fn test_output_follows_submission_order() {
        let controller = controller()
            .delayed(CALLS, Duration::from_millis(60))
            .delayed(ERRORS, Duration::from_millis(30));

        let response =
            aggregate(&MetricQueryPlanner::default(), &targets(), &range(), &controller).await;

        assert_eq!(labels(&response), vec![CALLS, ERRORS, RESPONSE]);
    }

    #[tokio::test]
    async fn test_targets_run_concurrently() {
        let controller = controller()
            .delayed(CALLS, Duration::from_millis(100))
            .delayed(ERRORS, Duration::from_millis(100))
            .delayed(RESPONSE, Duration::from_millis(100));

        let started = std::time::Instant::now();
        aggregate(&MetricQueryPlanner::default(), &targets(), &range(), &controller).await;

        assert!(started.elapsed() < Duration::from_millis(250));
    }

    #[tokio::test]
    async fn test_hidden_targets_are_skipped() {
        let mut targets = targets();
        targets[1].hide = true;
        let controller = controller();

        let response =
            aggregate(&MetricQueryPlanner::default(), &targets, &range(), &controller).await;

        assert_eq!(labels(&response), vec![CALLS, RESPONSE]);
        assert_eq!(controller.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_no_targets() {
        let response =
            aggregate(&MetricQueryPlanner::default(), &[], &range(), &controller()).await;
        assert_eq!(response, QueryResponse::default());
    }
}
