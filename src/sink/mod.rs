//! Sink trait and implementations.
//!
//! A sink accepts one event at a time and either acknowledges it or
//! reports why it could not. The adapter treats every error as fatal.

pub mod http;
pub mod log;
pub mod mock;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::SinkConfig;
use crate::error::{ConfigError, SinkError};
use crate::heartbeat::Event;

pub use http::HttpSink;
pub use log::LogSink;
pub use mock::MockSink;

/// Acknowledgement of a successful delivery.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ack {
    /// Transport status, when the transport has one (HTTP status code).
    pub status_code: Option<u16>,
}

/// Destination for emitted events.
#[async_trait]
pub trait Sink: Send + Sync {
    /// Human-readable sink name.
    fn name(&self) -> &str;

    /// Deliver one event. Ownership of the event passes to the sink.
    async fn deliver(&self, event: Event) -> Result<Ack, SinkError>;
}

/// Create a [`Sink`] from validated configuration.
///
/// - `Http`: POSTs each event to the sink URI in binary content mode.
/// - `Log`: writes each event as a JSON line to stdout.
pub fn create_sink(config: &SinkConfig) -> Result<Arc<dyn Sink>, ConfigError> {
    match config {
        SinkConfig::Http {
            uri,
            timeout,
            user_agent,
        } => Ok(Arc::new(HttpSink::new(uri.clone(), *timeout, user_agent)?)),
        SinkConfig::Log => Ok(Arc::new(LogSink::new(tokio::io::stdout()))),
    }
}
