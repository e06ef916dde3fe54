//! Session and harness configuration.
//!
//! A [`SessionConfig`] is built once at start-up and passed by reference
//! into every [`Session::connect`](crate::Session::connect). The optional
//! TOML file read by `moo-eval` has the same fields.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Top level configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Connection and framing settings.
    #[serde(default)]
    pub session: SessionConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        let config: Config = toml::from_str(&content)?;
        config.session.validate()?;
        Ok(config)
    }
}

/// Settings for one session against a MOO server.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    /// Server address ("host:port").
    #[serde(default = "SessionConfig::default_address")]
    pub address: String,

    /// Arguments sent with the `connect` line of the handshake.
    #[serde(default = "SessionConfig::default_connect_args")]
    pub connect_args: String,

    /// Line the server emits right before a command's output.
    #[serde(default = "SessionConfig::default_prefix")]
    pub prefix: String,

    /// Line the server emits right after a command's output.
    #[serde(default = "SessionConfig::default_suffix")]
    pub suffix: String,

    /// Log every line sent and received at debug level instead of trace.
    #[serde(default)]
    pub verbose: bool,

    /// Connect timeout in milliseconds.
    #[serde(default = "SessionConfig::default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Deadline for one command in milliseconds. Unset means wait forever.
    #[serde(default)]
    pub command_timeout_ms: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            address: Self::default_address(),
            connect_args: Self::default_connect_args(),
            prefix: Self::default_prefix(),
            suffix: Self::default_suffix(),
            verbose: false,
            connect_timeout_ms: Self::default_connect_timeout_ms(),
            command_timeout_ms: None,
        }
    }
}

impl SessionConfig {
    fn default_address() -> String {
        "127.0.0.1:7777".to_string()
    }

    fn default_connect_args() -> String {
        "wizard".to_string()
    }

    fn default_prefix() -> String {
        "-=-=- begin output -=-=-".to_string()
    }

    fn default_suffix() -> String {
        "-=-=- end output -=-=-".to_string()
    }

    fn default_connect_timeout_ms() -> u64 {
        5000
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout_ms.map(Duration::from_millis)
    }

    /// Check that the sentinels can frame output unambiguously.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, sentinel) in [("prefix", &self.prefix), ("suffix", &self.suffix)] {
            if sentinel.is_empty() {
                return Err(ConfigError::Invalid(format!("{name} must not be empty")));
            }
            if sentinel.contains(['\r', '\n']) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be a single line"
                )));
            }
            if sentinel != sentinel.trim() {
                return Err(ConfigError::Invalid(format!(
                    "{name} must not start or end with whitespace"
                )));
            }
        }
        if self.prefix == self.suffix {
            return Err(ConfigError::Invalid(
                "prefix and suffix must differ".to_string(),
            ));
        }
        if self.connect_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "connect_timeout_ms must be positive".to_string(),
            ));
        }
        if self.command_timeout_ms == Some(0) {
            return Err(ConfigError::Invalid(
                "command_timeout_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level.
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,

    /// Log format: "pretty", "json", or "compact".
    #[serde(default = "LoggingConfig::default_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            format: Self::default_format(),
        }
    }
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }

    fn default_format() -> String {
        "pretty".to_string()
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(std::io::Error),
    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
