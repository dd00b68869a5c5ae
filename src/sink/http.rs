//! HTTP sink using CloudEvents binary content mode.
//!
//! Context attributes travel as `ce-*` headers, the payload as the body:
//!
//! ```text
//! POST <sink uri>
//! ce-specversion: 1.0
//! ce-id: 0
//! ce-type: com.example.heartbeat
//! ce-source: http://heartbeat.example.com/heartbeat-source
//! ce-time: 2026-01-01T00:00:00.123Z
//! Content-Type: text/json
//!
//! {"heartbeat":"5s"}
//! ```

use std::time::Duration;

use async_trait::async_trait;
use chrono::SecondsFormat;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;
use url::Url;

use crate::error::{ConfigError, SinkError};
use crate::heartbeat::Event;
use crate::sink::{Ack, Sink};

/// Rejection bodies are kept for diagnostics, capped at this many bytes.
const MAX_ERROR_BODY_BYTES: usize = 1024;

/// Delivers events to an HTTP endpoint such as a broker or a service.
pub struct HttpSink {
    client: reqwest::Client,
    target: Url,
    timeout: Duration,
}

impl HttpSink {
    pub fn new(target: Url, timeout: Duration, user_agent: &str) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| ConfigError::Client(e.to_string()))?;

        Ok(Self {
            client,
            target,
            timeout,
        })
    }

    pub fn target(&self) -> &Url {
        &self.target
    }

    /// Configured timeout in whole milliseconds, saturating at `u64::MAX`.
    fn timeout_ms(&self) -> u64 {
        u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
    }

    fn classify(&self, err: reqwest::Error) -> SinkError {
        if err.is_timeout() {
            SinkError::Timeout {
                timeout_ms: self.timeout_ms(),
            }
        } else {
            SinkError::Network {
                message: err.to_string(),
            }
        }
    }
}

/// Truncate to at most `max_bytes` without splitting a multi-byte character.
fn truncate_body(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[async_trait]
impl Sink for HttpSink {
    fn name(&self) -> &str {
        "http"
    }

    async fn deliver(&self, event: Event) -> Result<Ack, SinkError> {
        let body = serde_json::to_vec(&event.data).map_err(|e| SinkError::Encode {
            message: e.to_string(),
        })?;

        let response = self
            .client
            .post(self.target.clone())
            .header("ce-specversion", &event.spec_version)
            .header("ce-id", &event.id)
            .header("ce-type", &event.event_type)
            .header("ce-source", event.source.as_str())
            .header(
                "ce-time",
                event.time.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            )
            .header(CONTENT_TYPE, &event.data_content_type)
            .body(body)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if status.is_success() {
            debug!(id = %event.id, status = status.as_u16(), "Sink accepted event");
            return Ok(Ack {
                status_code: Some(status.as_u16()),
            });
        }

        let text = response.text().await.unwrap_or_default();
        Err(SinkError::Rejected {
            status_code: status.as_u16(),
            body: truncate_body(&text, MAX_ERROR_BODY_BYTES).to_string(),
        })
    }
}
