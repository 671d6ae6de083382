//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::controller::ControllerConfig;
use crate::query::PatternLimits;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub controller: ControllerSettings,

    #[serde(default)]
    pub query: QuerySettings,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Controller connection settings
#[derive(Clone, Deserialize)]
pub struct ControllerSettings {
    #[serde(default = "default_controller_url")]
    pub url: String,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,

    #[serde(default = "default_tenant")]
    pub tenant: String,

    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_controller_url() -> String {
    ControllerConfig::default().base_url
}

fn default_tenant() -> String {
    ControllerConfig::default().tenant
}

fn default_request_timeout_ms() -> u64 {
    ControllerConfig::default().request_timeout_ms
}

impl Default for ControllerSettings {
    fn default() -> Self {
        let defaults = ControllerConfig::default();
        Self {
            url: defaults.base_url,
            username: defaults.username,
            password: defaults.password,
            tenant: defaults.tenant,
            request_timeout_ms: defaults.request_timeout_ms,
        }
    }
}

impl fmt::Debug for ControllerSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerSettings")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("tenant", &self.tenant)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .finish()
    }
}

impl ControllerSettings {
    /// Client configuration for these settings
    pub fn client_config(&self) -> ControllerConfig {
        ControllerConfig {
            base_url: self.url.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            tenant: self.tenant.clone(),
            request_timeout_ms: self.request_timeout_ms,
        }
    }
}

/// Bounds on user-supplied metric path patterns
#[derive(Debug, Clone, Deserialize)]
pub struct QuerySettings {
    #[serde(default = "default_max_segment_len")]
    pub max_segment_len: usize,

    #[serde(default = "default_regex_size_limit")]
    pub regex_size_limit: usize,
}

fn default_max_segment_len() -> usize {
    256
}

fn default_regex_size_limit() -> usize {
    1024 * 1024 // 1 MiB
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            max_segment_len: default_max_segment_len(),
            regex_size_limit: default_regex_size_limit(),
        }
    }
}

impl QuerySettings {
    pub fn pattern_limits(&self) -> PatternLimits {
        PatternLimits {
            max_segment_len: self.max_segment_len,
            regex_size_limit: self.regex_size_limit,
        }
    }
}

/// API server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Empty allows any origin
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3001
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
        }
    }
}

impl ApiConfig {
    /// Socket address to bind
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl LoggingConfig {
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|error| ConfigError::Parse {
            path: path.to_path_buf(),
            error,
        })
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_overrides_from(process_env);
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_overrides_from(process_env);
        Ok(config)
    }

    /// Load from an explicit path, or from the first default location that
    /// exists, or from the environment alone.
    ///
    /// A file that exists but cannot be read or parsed is an error.
    pub fn load_default(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_first(explicit, &default_config_paths(), process_env)
    }

    fn load_first<F>(
        explicit: Option<&Path>,
        candidates: &[PathBuf],
        lookup: F,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let found = explicit
            .map(Path::to_path_buf)
            .or_else(|| candidates.iter().find(|path| path.exists()).cloned());

        let mut config = match found {
            Some(path) => {
                let config = Self::load(&path)?;
                tracing::info!("Loaded config from {:?}", path);
                config
            }
            None => {
                tracing::info!("Using default config with environment overrides");
                Self::default()
            }
        };

        config.apply_overrides_from(lookup);
        Ok(config)
    }

    /// Apply `APPD_*` overrides; unparsable numbers are ignored
    fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        // Controller overrides
        if let Some(url) = lookup("APPD_CONTROLLER_URL") {
            self.controller.url = url;
        }
        if let Some(username) = lookup("APPD_USERNAME") {
            self.controller.username = username;
        }
        if let Some(password) = lookup("APPD_PASSWORD") {
            self.controller.password = password;
        }
        if let Some(tenant) = lookup("APPD_TENANT") {
            self.controller.tenant = tenant;
        }
        if let Some(ms) = lookup("APPD_REQUEST_TIMEOUT_MS").and_then(|v| v.parse().ok()) {
            self.controller.request_timeout_ms = ms;
        }

        // API overrides
        if let Some(host) = lookup("APPD_API_HOST") {
            self.api.host = host;
        }
        if let Some(port) = lookup("APPD_API_PORT").and_then(|v| v.parse().ok()) {
            self.api.port = port;
        }

        // Logging overrides
        if let Some(level) = lookup("APPD_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("APPD_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn default_config_paths() -> Vec<PathBuf> {
    [
        dirs::config_dir().map(|p| p.join("appd-datasource").join("config.toml")),
        Some(PathBuf::from("/etc/appd-datasource/config.toml")),
        Some(PathBuf::from("./config.toml")),
    ]
    .into_iter()
    .flatten()
    .collect()
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# appd-datasource Configuration
#
# Environment variables override these settings:
# - APPD_CONTROLLER_URL
# - APPD_USERNAME
# - APPD_PASSWORD
# - APPD_TENANT
# - APPD_REQUEST_TIMEOUT_MS
# - APPD_API_HOST
# - APPD_API_PORT
# - APPD_LOG_LEVEL
# - APPD_LOG_FORMAT

[controller]
# Controller base URL
url = "http://localhost:8090"

# API user; sent as username@tenant
username = ""
password = ""

# Controller account name
tenant = "customer1"

# Per-request timeout (ms)
request_timeout_ms = 30000

[query]
# Longest accepted regex segment in a metric path (characters)
max_segment_len = 256

# Compiled size limit for one regex segment (bytes)
regex_size_limit = 1048576

[api]
# Data source server host
host = "0.0.0.0"

# Data source server port
port = 3001

# Allowed CORS origins (empty allows any)
cors_origins = []

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
