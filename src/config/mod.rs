//! Configuration management.
//!
//! Settings come from, in increasing priority: built-in defaults, a TOML
//! file, and `STUDY_SEARCH_*` environment variables. The binary applies its
//! command-line flags on top.
//!
//! # Configuration File Format
//!
//! ```toml
//! [service]
//! base_url = "http://localhost:5000"
//! # request_timeout_secs = 30
//! user_agent = "study-search/0.1.0"
//!
//! [logging]
//! level = "info"
//! format = "pretty"   # or "json"
//! ```
//!
//! # Environment Variables
//!
//! - `STUDY_SEARCH_API_BASE` - base address of the study index (shortcut)
//! - `STUDY_SEARCH_SERVICE__BASE_URL` - same, nested form
//! - `STUDY_SEARCH_SERVICE__REQUEST_TIMEOUT_SECS` - whole-request timeout
//! - `STUDY_SEARCH_LOGGING__LEVEL` - default log level

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::index::{HttpStudyIndex, IndexError};
use crate::utils::{HttpClient, DEFAULT_USER_AGENT};

/// Base address used when nothing else is configured
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

/// Environment variable holding the index base address
pub const BASE_URL_ENV: &str = "STUDY_SEARCH_API_BASE";

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Remote study index settings
    #[serde(default)]
    pub service: ServiceConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Remote study index settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Base address of the index, without the endpoint path
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Whole-request timeout. Unset means a request may stay pending until
    /// it resolves or is cancelled.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: None,
            user_agent: default_user_agent(),
        }
    }
}

fn default_base_url() -> String {
    std::env::var(BASE_URL_ENV).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string())
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// `pretty` (default) or `json`
    #[serde(default)]
    pub format: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Configured request timeout, if any
    pub fn request_timeout(&self) -> Option<Duration> {
        self.service.request_timeout_secs.map(Duration::from_secs)
    }

    /// Build the HTTP index client these settings describe
    pub fn build_index(&self) -> Result<HttpStudyIndex, IndexError> {
        let client = HttpClient::with_settings(&self.service.user_agent, self.request_timeout())
            .map_err(|e| IndexError::InvalidRequest(e.to_string()))?;
        HttpStudyIndex::with_client(client, &self.service.base_url)
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Io(e.to_string()))?;
        }
        std::fs::write(path, content).map_err(|e| ConfigError::Io(e.to_string()))
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config error: {0}")]
    Load(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialize error: {0}")]
    Serialize(String),
}

/// Load configuration from a file, with environment overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::from(path))
        .add_source(environment())
        .build()?;

    Ok(settings.try_deserialize()?)
}

/// Load configuration from environment variables and defaults only
pub fn load_from_env() -> Result<Config, ConfigError> {
    let settings = config::Config::builder().add_source(environment()).build()?;
    Ok(settings.try_deserialize()?)
}

fn environment() -> config::Environment {
    config::Environment::with_prefix("STUDY_SEARCH")
        .prefix_separator("_")
        .separator("__")
}

/// Default location of the configuration file
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("study-search").join("config.toml"))
}

/// Find a configuration file in the working directory or the user config dir
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("study-search.toml");
    if local.is_file() {
        return Some(local);
    }
    default_config_path().filter(|p| p.is_file())
}
