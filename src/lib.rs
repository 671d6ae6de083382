//! # appd-datasource
//!
//! AppDynamics data source adapter - translates dashboard queries written as
//! metric-path patterns into AppDynamics controller REST calls and returns the
//! results as labelled time-series.
//!
//! ## Features
//!
//! - **Pattern paths**: regex segments in metric paths, generalized to `*` for
//!   the controller and filtered client-side
//! - **One call per target**: wildcards and regexes never fan out into extra
//!   controller requests
//! - **Fail-independent queries**: a broken target is reported, its siblings
//!   still return data
//! - **Autocomplete**: application and metric tree name lookups
//!
//! ## Modules
//!
//! - [`query`]: Pattern compiler, planner, aggregator and name filtering
//! - [`controller`]: Controller REST client behind the [`ControllerApi`] trait
//! - [`datasource`]: Entry points a dashboard host calls
//! - [`api`]: JSON data source server with Axum
//! - [`config`]: TOML configuration with environment overrides
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use appd_datasource::{AppDynamicsDatasource, Config, QueryTarget, TimeRange};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env();
//!     let datasource = AppDynamicsDatasource::from_config(&config)?;
//!
//!     let targets = vec![QueryTarget::new(
//!         "Orders",
//!         "Business Transaction Performance|Business Transactions|.*|*|Calls per Minute",
//!     )];
//!     let response = datasource.query_range(&targets, &TimeRange::last_hours(1)).await;
//!
//!     for series in &response.data {
//!         println!("{}: {} points", series.label, series.points.len());
//!     }
//!     for error in &response.errors {
//!         eprintln!("target {} failed: {}", error.index, error.message);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod controller;
pub mod datasource;
pub mod query;

// Re-export top-level types for convenience
pub use query::{
    aggregate, compile, filter_names, CompiledPattern, MetricQueryPlanner, PatternError,
    PatternLimits, QueryError, QueryOptions, QueryResponse, QueryResult, QueryTarget, RangeBound,
    RangeSpec, ResolvedSeries, SegmentMatcher, TargetError, TimeRange,
};

pub use controller::{
    CatalogEntry, ControllerApi, ControllerConfig, ControllerError, HttpControllerClient,
    MetricDataRequest, RawSeriesEntry,
};

pub use datasource::{AppDynamicsDatasource, TestResult, TestStatus};

pub use api::{build_router, serve, ApiError, AppState};

pub use config::{Config, ConfigError, LoggingConfig};
