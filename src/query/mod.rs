//! Query Translation
//!
//! Turns dashboard query targets into controller calls and controller
//! responses back into labelled series:
//!
//! - **Pattern**: compile metric path patterns into a generalized path plus
//!   per-segment matchers
//! - **Planner**: execute one target with a single controller call
//! - **Aggregator**: run all targets concurrently, failing independently
//! - **Names**: autocomplete filtering over catalog listings
//! - **Time**: resolve `from`/`to` bounds to epoch milliseconds
//!
//! # Metric Path Patterns
//!
//! ```text
//! Business Transaction Performance|Business Transactions|Java|*|Calls per Minute
//! Overall Application Performance|web-.*|Errors per Minute
//! Business Transaction Performance|.*|Java|*
//! ```
//!
//! Segments containing any of `^ [ ] \ { } $ ? * .` (other than a bare `*`)
//! are regular expressions evaluated client-side; the controller only sees `*`
//! in their place.
//!
//! # Example
//!
//! ```rust,ignore
//! use appd_datasource::query::{aggregate, MetricQueryPlanner, QueryTarget, TimeRange};
//!
//! let targets = vec![QueryTarget::new("Orders", "Overall Application Performance|.*")];
//! let response = aggregate(&MetricQueryPlanner::default(), &targets, &TimeRange::last_hours(1), &client).await;
//! ```

mod aggregator;
mod error;
mod model;
pub mod names;
pub mod pattern;
mod planner;
mod time;

pub use aggregator::aggregate;
pub use error::{PatternError, QueryError, QueryResult};
pub use model::{QueryOptions, QueryResponse, QueryTarget, RangeSpec, ResolvedSeries, TargetError};
pub use names::filter_names;
pub use pattern::{compile, compile_with, CompiledPattern, PatternLimits, SegmentMatcher};
pub use planner::{resolve_series, series_label, MetricQueryPlanner, QueryPlan};
pub use time::{resolve_bound, RangeBound, TimeRange};
