//! TOML Configuration File Support
//!
//! Configuration for the bridge lives at `~/.config/agentui/bridge.toml`.
//!
//! # Configuration Priority
//!
//! Values are loaded with the following priority (highest first):
//! 1. Environment variables
//! 2. TOML configuration file
//! 3. Default values
//!
//! # XDG Base Directory Compliance
//!
//! - `$XDG_CONFIG_HOME/agentui/bridge.toml` (typically `~/.config/agentui/bridge.toml`)
//! - `AGENTUI_CONFIG` points at a different file
//!
//! # Example Configuration
//!
//! ```toml
//! [transport]
//! incoming_capacity = 100
//! error_capacity = 10
//! max_line_bytes = 10485760
//!
//! [session]
//! busy_policy = "queue"      # or "reject"
//! request_timeout_secs = 300 # omit to wait forever
//! ```
//!
//! # Environment Variables
//!
//! | Variable                       | Overrides                        |
//! |--------------------------------|----------------------------------|
//! | `AGENTUI_INCOMING_CAPACITY`    | `transport.incoming_capacity`    |
//! | `AGENTUI_ERROR_CAPACITY`       | `transport.error_capacity`       |
//! | `AGENTUI_MAX_LINE_BYTES`       | `transport.max_line_bytes`       |
//! | `AGENTUI_BUSY_POLICY`          | `session.busy_policy`            |
//! | `AGENTUI_REQUEST_TIMEOUT_SECS` | `session.request_timeout_secs`   |

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::session::BusyPolicy;
use crate::transport::TransportConfig;

/// Environment variable naming an alternate config file
pub const CONFIG_PATH_ENV: &str = "AGENTUI_CONFIG";

const INCOMING_CAPACITY_ENV: &str = "AGENTUI_INCOMING_CAPACITY";
const ERROR_CAPACITY_ENV: &str = "AGENTUI_ERROR_CAPACITY";
const MAX_LINE_BYTES_ENV: &str = "AGENTUI_MAX_LINE_BYTES";
const BUSY_POLICY_ENV: &str = "AGENTUI_BUSY_POLICY";
const REQUEST_TIMEOUT_ENV: &str = "AGENTUI_REQUEST_TIMEOUT_SECS";

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Tracks where a configuration value came from
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
    #[default]
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// Transport section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportToml {
    /// Capacity of the decoded-inbound queue
    pub incoming_capacity: Option<usize>,

    /// Capacity of the error queue
    pub error_capacity: Option<usize>,

    /// Maximum size of one line in bytes
    pub max_line_bytes: Option<usize>,
}

/// Session section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionToml {
    /// Policy for blocking requests that arrive while one is pending
    pub busy_policy: Option<BusyPolicy>,

    /// Seconds before an unanswered request times out
    pub request_timeout_secs: Option<u64>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeToml {
    /// Transport configuration section
    pub transport: TransportToml,

    /// Session configuration section
    pub session: SessionToml,
}

// =============================================================================
// Main Configuration Struct
// =============================================================================

/// Session behaviour settings
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionConfig {
    /// Policy for blocking requests that arrive while one is pending
    pub busy_policy: BusyPolicy,

    /// How long a pending request may stay unanswered (`None` = forever)
    pub request_timeout: Option<Duration>,
}

/// Centralized configuration for the bridge
///
/// Use [`load_config`] to load configuration with proper priority handling.
#[derive(Clone, Debug, Default)]
pub struct BridgeConfig {
    /// Transport configuration
    pub transport: TransportConfig,

    /// Session configuration
    pub session: SessionConfig,

    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,

    busy_policy_source: ConfigSource,
    request_timeout_source: ConfigSource,
}

impl BridgeConfig {
    /// Create a new configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Where the busy policy came from
    #[must_use]
    pub fn busy_policy_source(&self) -> ConfigSource {
        self.busy_policy_source
    }

    /// Where the request timeout came from
    #[must_use]
    pub fn request_timeout_source(&self) -> ConfigSource {
        self.request_timeout_source
    }

    /// Check every value is usable
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` naming the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.transport
            .validate()
            .map_err(ConfigError::ValidationError)?;
        if self.session.request_timeout == Some(Duration::ZERO) {
            return Err(ConfigError::ValidationError(
                "session.request_timeout_secs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/agentui/bridge.toml` or
/// `~/.config/agentui/bridge.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("agentui").join("bridge.toml"))
}

/// Load configuration from all sources with proper priority
///
/// The file is `$AGENTUI_CONFIG` when set, otherwise [`default_config_path`].
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed, or if
/// the resulting values are invalid. A missing config file is not an error.
pub fn load_config() -> Result<BridgeConfig, ConfigError> {
    let path = std::env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .or_else(default_config_path);
    load_config_from_path(path)
}

/// Load configuration from a specific path
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read or parsed,
/// or if the resulting values are invalid.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<BridgeConfig, ConfigError> {
    load_with_env(path, |key| std::env::var(key).ok())
}

fn load_with_env<F>(path: Option<PathBuf>, env: F) -> Result<BridgeConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = BridgeConfig::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: BridgeToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config);
            config.config_file_path = Some(config_path.clone());

            info!(path = %config_path.display(), "Loaded configuration from file");
        } else {
            debug!(path = %config_path.display(), "Config file not found, using defaults");
        }
    }

    apply_env_config(&mut config, env);
    config.validate()?;
    Ok(config)
}

/// Apply TOML configuration values to the config struct
fn apply_toml_config(config: &mut BridgeConfig, toml: &BridgeToml) {
    if let Some(capacity) = toml.transport.incoming_capacity {
        config.transport.incoming_capacity = capacity;
    }
    if let Some(capacity) = toml.transport.error_capacity {
        config.transport.error_capacity = capacity;
    }
    if let Some(max) = toml.transport.max_line_bytes {
        config.transport.max_line_bytes = max;
    }

    if let Some(policy) = toml.session.busy_policy {
        config.session.busy_policy = policy;
        config.busy_policy_source = ConfigSource::File;
    }
    if let Some(secs) = toml.session.request_timeout_secs {
        config.session.request_timeout = Some(Duration::from_secs(secs));
        config.request_timeout_source = ConfigSource::File;
    }
}

/// Parse an environment value, warning (and ignoring it) when malformed
fn parse_env<T, F>(env: &F, key: &str) -> Option<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    let raw = env(key)?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(var = key, value = %raw, error = %e, "Ignoring invalid environment value");
            None
        }
    }
}

/// Apply environment variable overrides to the config
fn apply_env_config<F>(config: &mut BridgeConfig, env: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(capacity) = parse_env(&env, INCOMING_CAPACITY_ENV) {
        config.transport.incoming_capacity = capacity;
    }
    if let Some(capacity) = parse_env(&env, ERROR_CAPACITY_ENV) {
        config.transport.error_capacity = capacity;
    }
    if let Some(max) = parse_env(&env, MAX_LINE_BYTES_ENV) {
        config.transport.max_line_bytes = max;
    }
    if let Some(policy) = parse_env::<BusyPolicy, _>(&env, BUSY_POLICY_ENV) {
        config.session.busy_policy = policy;
        config.busy_policy_source = ConfigSource::Env;
    }
    if let Some(secs) = parse_env::<u64, _>(&env, REQUEST_TIMEOUT_ENV) {
        config.session.request_timeout = Some(Duration::from_secs(secs));
        config.request_timeout_source = ConfigSource::Env;
    }
}
