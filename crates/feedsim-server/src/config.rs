//! Configuration loading for the feed simulator.
//!
//! Configuration lives in an optional YAML file (`feedsim.yaml` by
//! default). Every field has a default, so an absent file or a partial
//! file is valid. A few environment variables override the file so the
//! simulator can be pointed at another log without editing YAML.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

use crate::server::ServerConfig;

/// Config file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "feedsim.yaml";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulator configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FeedsimConfig {
    /// Recorded feed settings.
    #[serde(default)]
    pub feed: FeedConfig,

    /// HTTP listener settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl FeedsimConfig {
    /// Load configuration from a YAML file and apply environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string and apply environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Resolve the configuration for a run.
    ///
    /// An explicit path must exist. Otherwise [`DEFAULT_CONFIG_FILE`] is
    /// used when present, and built-in defaults when not.
    ///
    /// # Errors
    ///
    /// Propagates [`FeedsimConfig::from_file`] errors.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        let default_path = Path::new(DEFAULT_CONFIG_FILE);
        if default_path.exists() {
            Self::from_file(default_path)
        } else {
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Override values from the process environment.
    ///
    /// - `FEEDSIM_LOG_PATH` overrides `feed.log_path`
    /// - `FEEDSIM_HOST` overrides `server.host`
    /// - `FEEDSIM_PORT` overrides `server.port`
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Override values using an arbitrary variable lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("FEEDSIM_LOG_PATH") {
            self.feed.log_path = PathBuf::from(val);
        }
        if let Some(val) = lookup("FEEDSIM_HOST") {
            self.server.host = val;
        }
        if let Some(val) = lookup("FEEDSIM_PORT") {
            match val.parse::<u16>() {
                Ok(port) => self.server.port = port,
                Err(e) => warn!(value = %val, error = %e, "ignoring invalid FEEDSIM_PORT"),
            }
        }
    }
}

/// Recorded feed settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FeedConfig {
    /// Path to the newline-delimited event log.
    #[serde(default = "default_log_path")]
    pub log_path: PathBuf,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            log_path: default_log_path(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_path() -> PathBuf {
    PathBuf::from("event-feed.ndjson")
}

fn default_log_level() -> String {
    String::from("info")
}
