//! Error types for configuration, sink delivery and the adapter run loop.
//!
//! Configuration errors surface before the adapter starts. Sink errors are
//! fatal to a running adapter and reach the caller wrapped in
//! [`AdapterError::Delivery`]. Cancellation is never an error.

use std::path::PathBuf;

use thiserror::Error;

/// Problems detected while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("interval is required (set INTERVAL or `interval` in the config file)")]
    MissingInterval,

    #[error("invalid interval {value:?}: {reason}")]
    InvalidInterval { value: String, reason: String },

    #[error("invalid sink timeout {value:?}: {reason}")]
    InvalidTimeout { value: String, reason: String },

    #[error("unknown sink kind {0:?} (expected \"http\" or \"log\")")]
    UnknownSinkKind(String),

    #[error("sink URI is required for the http sink (set K_SINK or `sink.uri`)")]
    MissingSinkUri,

    #[error("invalid sink URI {uri:?}: {source}")]
    InvalidSinkUri {
        uri: String,
        #[source]
        source: url::ParseError,
    },

    #[error("unsupported sink URI scheme {0:?} (expected http or https)")]
    UnsupportedScheme(String),

    #[error("failed to build sink client: {0}")]
    Client(String),
}

/// Failures reported by a sink's delivery operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SinkError {
    /// Connection could not be established or broke mid-request.
    #[error("network connection failed: {message}")]
    Network { message: String },

    /// The sink did not answer within its configured timeout.
    #[error("request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// The sink answered with a non-success status.
    #[error("sink rejected event: HTTP {status_code}")]
    Rejected { status_code: u16, body: String },

    #[error("failed to encode event: {message}")]
    Encode { message: String },

    #[error("failed to write event: {message}")]
    Write { message: String },
}

/// Why a run of the heartbeat adapter ended abnormally.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdapterError {
    #[error("delivery failed: {0}")]
    Delivery(#[from] SinkError),

    #[error("adapter already stopped; construct a new adapter to run again")]
    AlreadyStopped,

    #[error("interval must be greater than zero")]
    ZeroInterval,
}
