//! heartbeat-source - a minimal CloudEvents receive adapter
//!
//! Emits one heartbeat event per configured interval to a sink until
//! cancelled:
//! - Event construction with monotonically increasing ids
//! - Interval-driven run loop with cooperative cancellation
//! - HTTP (binary content mode) and log sinks
//! - TOML / environment configuration

pub mod config;
pub mod error;
pub mod heartbeat;
pub mod logging;
pub mod sink;

#[cfg(test)]
mod e2e_test;

pub use config::{AdapterConfig, Config};
pub use error::{AdapterError, ConfigError, SinkError};
pub use heartbeat::{Event, EventFactory, HeartbeatAdapter};
pub use sink::{Sink, create_sink};
