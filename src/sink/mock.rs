//! Mock sink for testing.
//!
//! Records every delivered event in memory, can fail a chosen call, can
//! hold each delivery for a while, and tracks how many deliveries were in
//! flight at once.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;

use crate::error::SinkError;
use crate::heartbeat::Event;
use crate::sink::{Ack, Sink};

#[derive(Default)]
pub struct MockSink {
    delivered: Mutex<Vec<Event>>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    /// Zero-based call index that fails, and the error it returns.
    failure: Option<(usize, SinkError)>,
    latency: Duration,
}

impl MockSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the `call`-th delivery (zero-based) with `error`.
    pub fn failing_at(call: usize, error: SinkError) -> Self {
        Self {
            failure: Some((call, error)),
            ..Default::default()
        }
    }

    /// Hold every delivery for `latency` before answering.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Successfully delivered events, in delivery order.
    pub fn events(&self) -> Vec<Event> {
        self.delivered
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn ids(&self) -> Vec<String> {
        self.events().into_iter().map(|e| e.id).collect()
    }

    /// Delivery calls made, including failed ones.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of deliveries observed running concurrently.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Sink for MockSink {
    fn name(&self) -> &str {
        "mock"
    }

    async fn deliver(&self, event: Event) -> Result<Ack, SinkError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if !self.latency.is_zero() {
            sleep(self.latency).await;
        }

        let result = match &self.failure {
            Some((failing_call, error)) if *failing_call == call => Err(error.clone()),
            _ => {
                if let Ok(mut delivered) = self.delivered.lock() {
                    delivered.push(event);
                }
                Ok(Ack::default())
            }
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}
