//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use std::sync::Arc;
use std::time::Instant;

use crate::config::ApiConfig;
use crate::datasource::AppDynamicsDatasource;

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Data source bound to the configured controller
    pub datasource: Arc<AppDynamicsDatasource>,
    /// API configuration
    pub config: Arc<ApiConfig>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl AppState {
    pub fn new(datasource: Arc<AppDynamicsDatasource>, config: ApiConfig) -> Self {
        Self {
            datasource,
            config: Arc::new(config),
            start_time: Instant::now(),
        }
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
