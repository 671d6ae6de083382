//! Controller wire types
//!
//! JSON shapes returned by the controller with `output=json`, plus the
//! parameters of a metric-data request.

use serde::{Deserialize, Serialize};

use crate::query::names::FOLDER_TYPE;

/// One series returned by a metric-data call
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSeriesEntry {
    /// Concrete, fully expanded metric path
    pub metric_path: String,
    #[serde(default)]
    pub metric_name: String,
    #[serde(default)]
    pub metric_id: i64,
    /// Sampling resolution, e.g. `ONE_MIN`
    #[serde(default)]
    pub frequency: Option<String>,
    #[serde(default)]
    pub metric_values: Vec<MetricValue>,
}

/// One sample of a series
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricValue {
    pub start_time_in_millis: i64,
    pub current: f64,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(default)]
    pub count: Option<i64>,
    #[serde(default)]
    pub sum: Option<f64>,
    #[serde(default)]
    pub occurrences: Option<i64>,
    #[serde(default)]
    pub standard_deviation: Option<f64>,
}

/// Application or metric tree node from a catalog listing
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CatalogEntry {
    pub name: String,
    /// `folder` or `leaf` for metric tree nodes; absent for applications
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl CatalogEntry {
    pub fn new(name: impl Into<String>, kind: Option<&str>) -> Self {
        Self {
            name: name.into(),
            kind: kind.map(str::to_string),
        }
    }

    pub fn is_folder(&self) -> bool {
        self.kind.as_deref() == Some(FOLDER_TYPE)
    }
}

/// Parameters of a single metric-data call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricDataRequest {
    pub application: String,
    /// Generalized metric path; may contain `*` segments
    pub metric_path: String,
    /// Epoch milliseconds, inclusive
    pub start_time: i64,
    /// Epoch milliseconds
    pub end_time: i64,
}

impl MetricDataRequest {
    /// Query string for the metric-data endpoint. Rollup is always disabled so
    /// the controller returns every sample.
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("metric-path", self.metric_path.clone()),
            ("time-range-type", "BETWEEN_TIMES".to_string()),
            ("start-time", self.start_time.to_string()),
            ("end-time", self.end_time.to_string()),
            ("rollup", "false".to_string()),
            ("output", "json".to_string()),
        ]
    }
}
