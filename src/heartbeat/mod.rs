mod events;
mod runner;

pub use events::{
    Event, EventFactory, HEARTBEAT_CONTENT_TYPE, HEARTBEAT_DATA_KEY, HEARTBEAT_EVENT_TYPE,
    HEARTBEAT_SOURCE, SPEC_VERSION,
};
pub use runner::{AdapterState, HeartbeatAdapter};
