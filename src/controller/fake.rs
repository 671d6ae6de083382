//! In-memory controller used by unit tests

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use super::{CatalogEntry, ControllerApi, ControllerError, MetricDataRequest, MetricValue, RawSeriesEntry};

/// Build a series entry with `(current, start_time)` samples
pub fn entry(path: &str, samples: &[(f64, i64)]) -> RawSeriesEntry {
    RawSeriesEntry {
        metric_path: path.to_string(),
        metric_name: path.rsplit('|').next().unwrap_or_default().to_string(),
        metric_id: 1,
        frequency: Some("ONE_MIN".to_string()),
        metric_values: samples
            .iter()
            .map(|&(current, start)| MetricValue {
                start_time_in_millis: start,
                current,
                value: Some(current),
                min: None,
                max: None,
                count: None,
                sum: None,
                occurrences: None,
                standard_deviation: None,
            })
            .collect(),
    }
}

/// Controller serving canned responses keyed by the requested metric path
#[derive(Default)]
pub struct FakeController {
    series: HashMap<String, Vec<RawSeriesEntry>>,
    failing: HashSet<String>,
    delays: HashMap<String, Duration>,
    applications: Vec<CatalogEntry>,
    metrics: HashMap<String, Vec<CatalogEntry>>,
    catalog_down: bool,
    ping_status: Option<u16>,
    requests: Mutex<Vec<MetricDataRequest>>,
    metric_paths: Mutex<Vec<Option<String>>>,
}

impl FakeController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_series(mut self, metric_path: &str, entries: Vec<RawSeriesEntry>) -> Self {
        self.series.insert(metric_path.to_string(), entries);
        self
    }

    /// Metric-data calls for this path return a 500
    pub fn failing(mut self, metric_path: &str) -> Self {
        self.failing.insert(metric_path.to_string());
        self
    }

    /// Metric-data calls for this path take `delay` to answer
    pub fn delayed(mut self, metric_path: &str, delay: Duration) -> Self {
        self.delays.insert(metric_path.to_string(), delay);
        self
    }

    pub fn with_applications(mut self, names: &[&str]) -> Self {
        self.applications = names.iter().map(|n| CatalogEntry::new(*n, None)).collect();
        self
    }

    /// Catalog entries listed below `folder` ("" for the tree root)
    pub fn with_metrics(mut self, folder: &str, entries: Vec<CatalogEntry>) -> Self {
        self.metrics.insert(folder.to_string(), entries);
        self
    }

    pub fn catalog_down(mut self) -> Self {
        self.catalog_down = true;
        self
    }

    pub fn ping_status(mut self, status: u16) -> Self {
        self.ping_status = Some(status);
        self
    }

    pub fn requests(&self) -> Vec<MetricDataRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn metric_paths(&self) -> Vec<Option<String>> {
        self.metric_paths.lock().unwrap().clone()
    }
}

#[async_trait]
impl ControllerApi for FakeController {
    async fn metric_data(
        &self,
        request: &MetricDataRequest,
    ) -> Result<Vec<RawSeriesEntry>, ControllerError> {
        self.requests.lock().unwrap().push(request.clone());

        if let Some(delay) = self.delays.get(&request.metric_path) {
            tokio::time::sleep(*delay).await;
        }

        if self.failing.contains(&request.metric_path) {
            return Err(ControllerError::Api {
                status: 500,
                message: "internal error".to_string(),
            });
        }

        Ok(self
            .series
            .get(&request.metric_path)
            .cloned()
            .unwrap_or_default())
    }

    async fn applications(&self) -> Result<Vec<CatalogEntry>, ControllerError> {
        if self.catalog_down {
            return Err(ControllerError::Unavailable);
        }
        Ok(self.applications.clone())
    }

    async fn metrics(
        &self,
        _application: &str,
        metric_path: Option<&str>,
    ) -> Result<Vec<CatalogEntry>, ControllerError> {
        self.metric_paths
            .lock()
            .unwrap()
            .push(metric_path.map(str::to_string));

        if self.catalog_down {
            return Err(ControllerError::Timeout);
        }

        Ok(self
            .metrics
            .get(metric_path.unwrap_or(""))
            .cloned()
            .unwrap_or_default())
    }

    async fn ping(&self) -> Result<(), ControllerError> {
        match self.ping_status {
            None => Ok(()),
            Some(status) if (200..300).contains(&status) => Ok(()),
            Some(status) => Err(ControllerError::Api {
                status,
                message: String::new(),
            }),
        }
    }
}
