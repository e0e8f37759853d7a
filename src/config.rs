//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::dashboard::{ControllerSettings, SessionConfig};
use crate::store::{RealtimeConfig, RestStoreConfig};
use crate::websocket::HubConfig;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub realtime: RealtimeSettings,

    #[serde(default)]
    pub dashboard: DashboardConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Hosted report backend
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    /// Project base URL
    #[serde(default)]
    pub url: String,

    /// Anon or service key
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_table")]
    pub table: String,

    /// No timeout when absent
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    /// Serve sample data from memory instead of the backend
    #[serde(default)]
    pub demo: bool,
}

fn default_table() -> String {
    "reports".to_string()
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: String::new(),
            table: default_table(),
            request_timeout_secs: None,
            demo: false,
        }
    }
}

/// Change feed settings
#[derive(Debug, Clone, Deserialize)]
pub struct RealtimeSettings {
    #[serde(default = "default_channel")]
    pub channel: String,

    #[serde(default = "default_schema")]
    pub schema: String,

    #[serde(default = "default_heartbeat")]
    pub heartbeat_secs: u64,

    #[serde(default = "default_join_timeout")]
    pub join_timeout_secs: u64,

    #[serde(default = "default_resubscribe_delay")]
    pub resubscribe_delay_secs: u64,
}

fn default_channel() -> String {
    "reports-changes".to_string()
}

fn default_schema() -> String {
    "public".to_string()
}

fn default_heartbeat() -> u64 {
    25
}

fn default_join_timeout() -> u64 {
    10
}

fn default_resubscribe_delay() -> u64 {
    5
}

impl Default for RealtimeSettings {
    fn default() -> Self {
        Self {
            channel: default_channel(),
            schema: default_schema(),
            heartbeat_secs: default_heartbeat(),
            join_timeout_secs: default_join_timeout(),
            resubscribe_delay_secs: default_resubscribe_delay(),
        }
    }
}

/// Dashboard behaviour
#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    /// Clock refresh period
    #[serde(default = "default_tick")]
    pub tick_secs: u64,

    #[serde(default = "default_refetch_after_resolve")]
    pub refetch_after_resolve: bool,

    /// Display-only value for the Avg Response Time card
    #[serde(default = "default_avg_response_time")]
    pub avg_response_time: String,
}

fn default_tick() -> u64 {
    60
}

fn default_refetch_after_resolve() -> bool {
    true
}

fn default_avg_response_time() -> String {
    "3.2 hours".to_string()
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            tick_secs: default_tick(),
            refetch_after_resolve: default_refetch_after_resolve(),
            avg_response_time: default_avg_response_time(),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_max_ws_connections")]
    pub max_ws_connections: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_max_ws_connections() -> usize {
    256
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_ws_connections: default_max_ws_connections(),
        }
    }
}

impl ApiConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// "pretty" or "json"
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

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from the first readable default location, else the environment.
    ///
    /// Nothing is logged here since logging is configured from the result;
    /// the caller reports `source` and `skipped` once a subscriber exists.
    pub fn discover() -> LoadedConfig {
        let config_paths: Vec<PathBuf> = [
            dirs::config_dir().map(|p| p.join("leakwatch").join("config.toml")),
            Some(PathBuf::from("/etc/leakwatch/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ]
        .into_iter()
        .flatten()
        .collect();

        Self::discover_in(&config_paths)
    }

    fn discover_in(paths: &[PathBuf]) -> LoadedConfig {
        let mut skipped = Vec::new();

        for path in paths.iter().filter(|p| p.exists()) {
            match Self::load_with_env(path) {
                Ok(config) => {
                    return LoadedConfig {
                        config,
                        source: Some(path.clone()),
                        skipped,
                    }
                }
                Err(e) => skipped.push(e),
            }
        }

        LoadedConfig {
            config: Self::from_env(),
            source: None,
            skipped,
        }
    }

    /// Apply `LEAKWATCH_*` environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        // Backend overrides
        if let Some(url) = var("LEAKWATCH_BACKEND_URL") {
            self.backend.url = url;
        }
        if let Some(key) = var("LEAKWATCH_BACKEND_KEY") {
            self.backend.api_key = key;
        }
        if let Some(table) = var("LEAKWATCH_TABLE") {
            self.backend.table = table;
        }

        // API overrides
        if let Some(host) = var("LEAKWATCH_API_HOST") {
            self.api.host = host;
        }
        if let Some(port) = var("LEAKWATCH_API_PORT") {
            match port.parse() {
                Ok(p) => self.api.port = p,
                Err(_) => tracing::warn!(value = %port, "Ignoring invalid LEAKWATCH_API_PORT"),
            }
        }

        // Logging overrides
        if let Some(level) = var("LEAKWATCH_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("LEAKWATCH_LOG_FORMAT") {
            self.logging.format = format;
        }
    }

    /// Reject settings the server cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.backend.demo {
            if self.backend.url.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "backend.url is required (or set LEAKWATCH_BACKEND_URL, or run in demo mode)"
                        .to_string(),
                ));
            }
            if self.backend.api_key.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "backend.api_key is required (or set LEAKWATCH_BACKEND_KEY)".to_string(),
                ));
            }
        }
        if self.backend.table.trim().is_empty() {
            return Err(ConfigError::Invalid("backend.table must not be empty".to_string()));
        }
        if self.dashboard.tick_secs == 0 {
            return Err(ConfigError::Invalid(
                "dashboard.tick_secs must be greater than zero".to_string(),
            ));
        }
        if self.realtime.heartbeat_secs == 0 {
            return Err(ConfigError::Invalid(
                "realtime.heartbeat_secs must be greater than zero".to_string(),
            ));
        }
        match self.logging.format.as_str() {
            "pretty" | "json" => Ok(()),
            other => Err(ConfigError::Invalid(format!(
                "logging.format must be \"pretty\" or \"json\", got {:?}",
                other
            ))),
        }
    }

    pub fn rest_store_config(&self) -> RestStoreConfig {
        RestStoreConfig {
            url: self.backend.url.clone(),
            api_key: self.backend.api_key.clone(),
            table: self.backend.table.clone(),
            request_timeout: self.backend.request_timeout_secs.map(Duration::from_secs),
        }
    }

    pub fn realtime_config(&self) -> RealtimeConfig {
        let mut realtime = RealtimeConfig::from_rest(&self.rest_store_config(), &self.realtime.channel);
        realtime.schema = self.realtime.schema.clone();
        realtime.heartbeat = Duration::from_secs(self.realtime.heartbeat_secs);
        realtime.join_timeout = Duration::from_secs(self.realtime.join_timeout_secs);
        realtime
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            tick_period: Duration::from_secs(self.dashboard.tick_secs),
            resubscribe_delay: Duration::from_secs(self.realtime.resubscribe_delay_secs),
        }
    }

    pub fn controller_settings(&self) -> ControllerSettings {
        ControllerSettings {
            refetch_after_resolve: self.dashboard.refetch_after_resolve,
            avg_response_time: self.dashboard.avg_response_time.clone(),
            ..ControllerSettings::default()
        }
    }

    pub fn hub_config(&self) -> HubConfig {
        HubConfig {
            max_connections: self.api.max_ws_connections,
            ..HubConfig::default()
        }
    }
}

/// Result of [`Config::discover`]
#[derive(Debug)]
pub struct LoadedConfig {
    pub config: Config,
    /// File the settings came from; `None` means defaults plus environment
    pub source: Option<PathBuf>,
    /// Files that existed but could not be loaded
    pub skipped: Vec<ConfigError>,
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Leakwatch Configuration
#
# Environment variables override these settings:
# - LEAKWATCH_BACKEND_URL
# - LEAKWATCH_BACKEND_KEY
# - LEAKWATCH_TABLE
# - LEAKWATCH_API_HOST
# - LEAKWATCH_API_PORT
# - LEAKWATCH_LOG_LEVEL
# - LEAKWATCH_LOG_FORMAT

[backend]
# Project base URL, e.g. "https://abc.supabase.co"
url = ""

# Anon key; sent as the apikey header and bearer token
api_key = ""

# Table holding the leak reports
table = "reports"

# Per-request timeout in seconds (no timeout when unset)
# request_timeout_secs = 30

# Serve built-in sample reports instead of contacting the backend
demo = false

[realtime]
# Channel name used when joining the change feed
channel = "reports-changes"

# Database schema of the reports table
schema = "public"

# Keepalive period (seconds)
heartbeat_secs = 25

# How long to wait for the join reply (seconds)
join_timeout_secs = 10

# Wait before re-subscribing after the feed drops (seconds)
resubscribe_delay_secs = 5

[dashboard]
# How often the "Last Updated" clock refreshes (seconds)
tick_secs = 60

# Re-fetch all reports after a successful resolve
refetch_after_resolve = true

# Display-only value for the Avg Response Time card
avg_response_time = "3.2 hours"

[api]
# Server host
host = "0.0.0.0"

# Server port
port = 8080

# Maximum concurrent WebSocket clients
max_ws_connections = 256

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
