//! Metric Query Planner
//!
//! Runs one query target against the controller:
//!
//! 1. compile the target's metric path pattern;
//! 2. issue a single metric-data call with the generalized path;
//! 3. keep only the returned series whose concrete path satisfies the
//!    per-segment matchers, and label them for the legend.

use crate::controller::{ControllerApi, MetricDataRequest, RawSeriesEntry};
use crate::query::error::{QueryError, QueryResult};
use crate::query::model::{QueryTarget, ResolvedSeries};
use crate::query::pattern::{compile_with, CompiledPattern, PatternLimits, PATH_DELIMITER};
use crate::query::time::TimeRange;

/// Path position used as the legend label when a path is deep enough
const LABEL_SEGMENT: usize = 3;

/// A compiled target, ready to send
#[derive(Debug, Clone)]
pub struct QueryPlan {
    pub pattern: CompiledPattern,
    pub request: MetricDataRequest,
}

/// Plans and executes single query targets
#[derive(Debug, Clone, Default)]
pub struct MetricQueryPlanner {
    limits: PatternLimits,
}

impl MetricQueryPlanner {
    pub fn new(limits: PatternLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &PatternLimits {
        &self.limits
    }

    /// Compile a target and build its controller request
    pub fn plan(&self, target: &QueryTarget, range: &TimeRange) -> QueryResult<QueryPlan> {
        if target.application.trim().is_empty() {
            return Err(QueryError::InvalidTarget("application is required".into()));
        }
        if target.metric.is_empty() {
            return Err(QueryError::InvalidTarget("metric path is required".into()));
        }

        let pattern = compile_with(&target.metric, &self.limits)?;
        let request = MetricDataRequest {
            application: target.application.clone(),
            metric_path: pattern.generalized_path(),
            start_time: range.start_ms,
            end_time: range.end_ms,
        };

        Ok(QueryPlan { pattern, request })
    }

    /// Run one target. Failures affect only this target.
    pub async fn plan_and_execute(
        &self,
        target: &QueryTarget,
        range: &TimeRange,
        client: &dyn ControllerApi,
    ) -> QueryResult<Vec<ResolvedSeries>> {
        let plan = self.plan(target, range)?;

        tracing::debug!(
            application = %plan.request.application,
            metric_path = %plan.request.metric_path,
            filtered = plan.pattern.has_patterns(),
            "Querying controller"
        );

        let entries = client.metric_data(&plan.request).await?;
        let returned = entries.len();
        let series = resolve_series(&plan.pattern, entries);

        tracing::debug!(
            returned,
            kept = series.len(),
            "Filtered controller series"
        );

        Ok(series)
    }
}

/// Keep the entries whose path satisfies `pattern`, in response order
pub fn resolve_series(pattern: &CompiledPattern, entries: Vec<RawSeriesEntry>) -> Vec<ResolvedSeries> {
    entries
        .into_iter()
        .filter_map(|entry| {
            let segments: Vec<&str> = entry.metric_path.split(PATH_DELIMITER).collect();
            if !pattern.matches(&segments) {
                tracing::trace!(path = %entry.metric_path, "Dropping unmatched series");
                return None;
            }

            let label = series_label(&entry.metric_path).to_string();
            let points = entry
                .metric_values
                .iter()
                .map(|v| (v.current, v.start_time_in_millis))
                .collect();

            Some(ResolvedSeries { label, points })
        })
        .collect()
}

/// Legend label: the fourth path segment when there are more than three,
/// otherwise the whole path
pub fn series_label(path: &str) -> &str {
    path.split(PATH_DELIMITER)
        .nth(LABEL_SEGMENT)
        .unwrap_or(path)
}
