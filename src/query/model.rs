//! Query request and response types
//!
//! These mirror the JSON the dashboard host exchanges with a data source.

use serde::{Deserialize, Serialize};

use crate::query::time::RangeBound;

/// One series the user asked for in the query editor
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryTarget {
    /// Host-assigned identifier (A, B, C...)
    #[serde(default)]
    pub ref_id: Option<String>,
    /// Controller application name
    #[serde(default)]
    pub application: String,
    /// Metric path pattern
    #[serde(default)]
    pub metric: String,
    /// Editor text mode; does not change execution
    #[serde(default)]
    pub raw_query: bool,
    /// Disabled in the editor
    #[serde(default)]
    pub hide: bool,
}

impl QueryTarget {
    pub fn new(application: impl Into<String>, metric: impl Into<String>) -> Self {
        Self {
            application: application.into(),
            metric: metric.into(),
            ..Self::default()
        }
    }

    pub fn ref_id(mut self, ref_id: impl Into<String>) -> Self {
        self.ref_id = Some(ref_id.into());
        self
    }
}

/// `from`/`to` as sent by the host
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RangeSpec {
    pub from: RangeBound,
    pub to: RangeBound,
}

/// A full query request
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct QueryOptions {
    pub range: RangeSpec,
    #[serde(default)]
    pub targets: Vec<QueryTarget>,
}

/// A labelled series ready for rendering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedSeries {
    /// Legend label
    #[serde(rename = "target")]
    pub label: String,
    /// `(value, timestamp_ms)` in controller order
    #[serde(rename = "datapoints")]
    pub points: Vec<(f64, i64)>,
}

/// Why one target contributed nothing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetError {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ref_id: Option<String>,
    /// Position of the target in the request
    pub index: usize,
    pub message: String,
}

/// Combined result of all targets
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub data: Vec<ResolvedSeries>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<TargetError>,
}

impl QueryResponse {
    pub fn is_partial(&self) -> bool {
        !self.errors.is_empty()
    }
}
