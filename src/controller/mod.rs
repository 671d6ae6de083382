//! Controller REST API
//!
//! Everything that talks to the AppDynamics controller lives behind the
//! [`ControllerApi`] trait, so the query layer can be driven by the real HTTP
//! client or by an in-memory fake.
//!
//! ## Endpoints
//!
//! - `GET /controller/rest/applications` - list applications
//! - `GET /controller/rest/applications/{app}/metrics` - browse the metric tree
//! - `GET /controller/rest/applications/{app}/metric-data` - time-series data
//! - `GET /api/controllerflags` - liveness probe

mod client;
mod models;

#[cfg(test)]
pub(crate) mod fake;

pub use client::{ControllerConfig, ControllerError, HttpControllerClient};
pub use models::{CatalogEntry, MetricDataRequest, MetricValue, RawSeriesEntry};

use async_trait::async_trait;

/// Operations the data source needs from a controller
#[async_trait]
pub trait ControllerApi: Send + Sync {
    /// Fetch time-series for a (possibly wildcarded) metric path
    async fn metric_data(
        &self,
        request: &MetricDataRequest,
    ) -> Result<Vec<RawSeriesEntry>, ControllerError>;

    /// List all applications
    async fn applications(&self) -> Result<Vec<CatalogEntry>, ControllerError>;

    /// List the metric tree under an application, optionally below a folder path
    async fn metrics(
        &self,
        application: &str,
        metric_path: Option<&str>,
    ) -> Result<Vec<CatalogEntry>, ControllerError>;

    /// Liveness probe; `Ok` on any 2xx
    async fn ping(&self) -> Result<(), ControllerError>;
}
