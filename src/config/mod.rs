//! Configuration loading and validation
//!
//! A [`Config`] is the raw, file-shaped record (TOML plus CLI/env
//! overrides). [`Config::validate`] turns it into an immutable
//! [`AdapterConfig`], the only shape the adapter ever sees.

mod schema;

pub use schema::{format_duration, parse_duration};

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::error::ConfigError;

pub const DEFAULT_SINK_TIMEOUT: &str = "30s";
pub const DEFAULT_USER_AGENT: &str = concat!("heartbeat-source/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Interval between events, for example "5s" or "100ms". Required.
    pub interval: Option<String>,

    /// Namespace the source runs in; only used as log context.
    pub namespace: Option<String>,

    pub sink: SinkSection,

    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SinkSection {
    /// "http" or "log"
    pub kind: String,
    pub uri: Option<String>,
    pub timeout: String,
    pub user_agent: String,
}

impl Default for SinkSection {
    fn default() -> Self {
        Self {
            kind: "http".to_string(),
            uri: None,
            timeout: DEFAULT_SINK_TIMEOUT.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence when set.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Validated sink coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum SinkConfig {
    Http {
        uri: Url,
        timeout: Duration,
        user_agent: String,
    },
    Log,
}

/// Immutable snapshot handed to the adapter at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct AdapterConfig {
    pub interval: Duration,
    pub sink: SinkConfig,
}

impl Config {
    /// Read and parse a TOML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Check every field the adapter depends on and produce its config.
    pub fn validate(&self) -> Result<AdapterConfig, ConfigError> {
        let raw_interval = self
            .interval
            .as_deref()
            .ok_or(ConfigError::MissingInterval)?;
        let interval =
            parse_duration(raw_interval).map_err(|reason| ConfigError::InvalidInterval {
                value: raw_interval.to_string(),
                reason,
            })?;

        Ok(AdapterConfig {
            interval,
            sink: self.sink.validate()?,
        })
    }
}

impl SinkSection {
    fn validate(&self) -> Result<SinkConfig, ConfigError> {
        match self.kind.as_str() {
            "http" => {
                let raw = self
                    .uri
                    .as_deref()
                    .filter(|u| !u.trim().is_empty())
                    .ok_or(ConfigError::MissingSinkUri)?;
                let uri = Url::parse(raw.trim()).map_err(|source| ConfigError::InvalidSinkUri {
                    uri: raw.to_string(),
                    source,
                })?;
                if !matches!(uri.scheme(), "http" | "https") {
                    return Err(ConfigError::UnsupportedScheme(uri.scheme().to_string()));
                }
                let timeout = parse_duration(&self.timeout).map_err(|reason| {
                    ConfigError::InvalidTimeout {
                        value: self.timeout.clone(),
                        reason,
                    }
                })?;
                Ok(SinkConfig::Http {
                    uri,
                    timeout,
                    user_agent: self.user_agent.clone(),
                })
            }
            "log" => Ok(SinkConfig::Log),
            other => Err(ConfigError::UnknownSinkKind(other.to_string())),
        }
    }
}
