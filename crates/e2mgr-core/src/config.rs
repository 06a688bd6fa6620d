//! e2mgr.toml configuration parser.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid duration for {field}: {value:?}")]
    InvalidDuration { field: &'static str, value: String },

    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub routing_manager: RoutingManagerConfig,
    pub keep_alive: KeepAliveConfig,
    pub e2t: E2tConfig,
    pub state: StateConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingManagerConfig {
    /// Base URL every routing API path is appended to. Must end with `/`.
    pub base_url: String,
    /// Per-request timeout (e.g., "5s").
    pub timeout: String,
}

impl Default for RoutingManagerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:12020/ric/v1/handles/v1/".to_string(),
            timeout: "5s".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeepAliveConfig {
    /// Run the keep-alive worker. Off unless a transport feeds keep-alive
    /// responses back into the instance pool.
    pub enabled: bool,
    /// Interval between keep-alive ticks.
    pub delay: String,
    /// Silence after which an instance is considered dead.
    pub response_timeout: String,
}

impl Default for KeepAliveConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            delay: "1s".to_string(),
            response_timeout: "4s".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct E2tConfig {
    /// Grace window during which a repeated shutdown is a no-op.
    pub deletion_timeout: String,
}

impl Default for E2tConfig {
    fn default() -> Self {
        Self {
            deletion_timeout: "15s".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StateConfig {
    pub path: PathBuf,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("/var/lib/e2mgr/e2mgr.redb"),
        }
    }
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Parse and validate a TOML document.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check that every duration parses and the numeric fields make sense.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.routing_timeout()?;
        self.keep_alive_delay()?;
        self.keep_alive_response_timeout()?;
        self.e2t_deletion_timeout()?;

        if !self.routing_manager.base_url.ends_with('/') {
            return Err(ConfigError::Invalid {
                field: "routing_manager.base_url",
                reason: "must end with '/'".to_string(),
            });
        }
        if self.keep_alive_delay()?.is_zero() {
            return Err(ConfigError::Invalid {
                field: "keep_alive.delay",
                reason: "must be non-zero".to_string(),
            });
        }
        Ok(())
    }

    pub fn routing_timeout(&self) -> Result<Duration, ConfigError> {
        duration_field("routing_manager.timeout", &self.routing_manager.timeout)
    }

    pub fn keep_alive_delay(&self) -> Result<Duration, ConfigError> {
        duration_field("keep_alive.delay", &self.keep_alive.delay)
    }

    pub fn keep_alive_response_timeout(&self) -> Result<Duration, ConfigError> {
        duration_field("keep_alive.response_timeout", &self.keep_alive.response_timeout)
    }

    pub fn e2t_deletion_timeout(&self) -> Result<Duration, ConfigError> {
        duration_field("e2t.deletion_timeout", &self.e2t.deletion_timeout)
    }
}

fn duration_field(field: &'static str, value: &str) -> Result<Duration, ConfigError> {
    parse_duration(value).ok_or_else(|| ConfigError::InvalidDuration {
        field,
        value: value.to_string(),
    })
}

/// Parse a duration string like "5s", "500ms", "1m".
///
/// A bare number is taken as seconds.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(ms) = s.strip_suffix("ms") {
        ms.parse::<u64>().ok().map(Duration::from_millis)
    } else if let Some(secs) = s.strip_suffix('s') {
        secs.parse::<u64>().ok().map(Duration::from_secs)
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.parse::<u64>()
            .ok()
            .and_then(|m| m.checked_mul(60))
            .map(Duration::from_secs)
    } else {
        s.parse::<u64>().ok().map(Duration::from_secs)
    }
}
