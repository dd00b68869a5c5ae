//! Heartbeat adapter - emits one event per interval until cancelled.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::events::EventFactory;
use crate::config::{AdapterConfig, format_duration};
use crate::error::AdapterError;
use crate::sink::Sink;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterState {
    /// Constructed, not yet started
    Idle,
    Running,
    /// Terminal, after cancellation or a delivery error
    Stopped,
}

/// Drives an [`EventFactory`] at a fixed cadence and hands each event to a
/// [`Sink`].
///
/// Deliveries are awaited inline: the next interval starts only after the
/// previous delivery returns, so at most one is ever in flight and ids reach
/// the sink in order.
pub struct HeartbeatAdapter {
    factory: EventFactory,
    sink: Arc<dyn Sink>,
    state: AdapterState,
}

impl HeartbeatAdapter {
    pub fn new(interval: Duration, sink: Arc<dyn Sink>) -> Self {
        Self::with_factory(EventFactory::new(interval), sink)
    }

    /// Build from validated configuration and the sink it describes.
    pub fn from_config(config: &AdapterConfig, sink: Arc<dyn Sink>) -> Self {
        Self::new(config.interval, sink)
    }

    pub fn with_factory(factory: EventFactory, sink: Arc<dyn Sink>) -> Self {
        info!(
            interval = %format_duration(factory.interval()),
            sink = sink.name(),
            "Heartbeat adapter created"
        );
        Self {
            factory,
            sink,
            state: AdapterState::Idle,
        }
    }

    pub fn state(&self) -> AdapterState {
        self.state
    }

    /// Number of events produced so far.
    pub fn emitted(&self) -> u64 {
        self.factory.next_id()
    }

    /// Run until `cancel` fires or a delivery fails.
    ///
    /// Returns `Ok(())` on cancellation and the sink's error otherwise. An
    /// adapter runs once; later calls return [`AdapterError::AlreadyStopped`].
    /// A zero interval is refused before the loop starts.
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<(), AdapterError> {
        if self.state == AdapterState::Stopped {
            return Err(AdapterError::AlreadyStopped);
        }
        if self.factory.interval().is_zero() {
            return Err(AdapterError::ZeroInterval);
        }
        self.state = AdapterState::Running;
        info!(
            interval = %format_duration(self.factory.interval()),
            source = %self.factory.source(),
            "Heartbeat adapter started"
        );

        let result = self.run_loop(&cancel).await;
        self.state = AdapterState::Stopped;

        if result.is_ok() {
            info!(events = self.emitted(), "Heartbeat adapter stopped");
        }
        result
    }

    async fn run_loop(&mut self, cancel: &CancellationToken) -> Result<(), AdapterError> {
        let interval = self.factory.interval();
        loop {
            tokio::select! {
                // Cancellation wins a tie with the timer: no event is sent
                // once stop has been requested.
                biased;

                _ = cancel.cancelled() => return Ok(()),

                _ = tokio::time::sleep(interval) => {
                    let event = self.factory.next_event();
                    let id = event.id.clone();
                    let ack = self.sink.deliver(event).await?;
                    debug!(id, status = ?ack.status_code, "Heartbeat delivered");
                }
            }
        }
    }
}
