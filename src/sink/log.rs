//! Sink that writes each event as a structured JSON line.
//!
//! Useful for running the source locally without a receiver. Log output
//! goes to stderr, so stdout carries nothing but events.

use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;
use tracing::info;

use crate::error::SinkError;
use crate::heartbeat::Event;
use crate::sink::{Ack, Sink};

pub struct LogSink<W> {
    writer: Mutex<W>,
}

impl<W> LogSink<W>
where
    W: AsyncWrite + Send + Unpin,
{
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

#[async_trait]
impl<W> Sink for LogSink<W>
where
    W: AsyncWrite + Send + Unpin,
{
    fn name(&self) -> &str {
        "log"
    }

    async fn deliver(&self, event: Event) -> Result<Ack, SinkError> {
        let mut line = serde_json::to_vec(&event).map_err(|e| SinkError::Encode {
            message: e.to_string(),
        })?;
        line.push(b'\n');

        let mut writer = self.writer.lock().await;
        writer
            .write_all(&line)
            .await
            .map_err(|e| SinkError::Write {
                message: e.to_string(),
            })?;
        writer.flush().await.map_err(|e| SinkError::Write {
            message: e.to_string(),
        })?;

        info!(
            id = %event.id,
            event_type = %event.event_type,
            heartbeat = event.heartbeat().unwrap_or_default(),
            "Heartbeat"
        );
        Ok(Ack::default())
    }
}
