//! Heartbeat event shape and construction

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::format_duration;

pub const SPEC_VERSION: &str = "1.0";
pub const HEARTBEAT_EVENT_TYPE: &str = "com.example.heartbeat";
pub const HEARTBEAT_SOURCE: &str = "http://heartbeat.example.com/heartbeat-source";
pub const HEARTBEAT_CONTENT_TYPE: &str = "text/json";
/// The single key of every heartbeat payload.
pub const HEARTBEAT_DATA_KEY: &str = "heartbeat";

/// A CloudEvents v1.0 event as delivered to a sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "specversion")]
    pub spec_version: String,
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    /// URI reference naming the producer.
    pub source: String,
    pub time: DateTime<Utc>,
    #[serde(rename = "datacontenttype")]
    pub data_content_type: String,
    pub data: BTreeMap<String, String>,
}

impl Event {
    /// The rendered interval carried in the payload.
    pub fn heartbeat(&self) -> Option<&str> {
        self.data.get(HEARTBEAT_DATA_KEY).map(String::as_str)
    }
}

/// Builds one heartbeat event per call.
///
/// Ids count up from `"0"`; each call consumes exactly one. Everything but
/// `time` is fixed by the counter value and the interval.
#[derive(Debug)]
pub struct EventFactory {
    next_id: u64,
    interval: Duration,
    rendered_interval: String,
    source: String,
    last_time: Option<DateTime<Utc>>,
}

impl EventFactory {
    pub fn new(interval: Duration) -> Self {
        Self::build(interval, HEARTBEAT_SOURCE.to_string())
    }

    pub fn with_source(interval: Duration, source: Url) -> Self {
        Self::build(interval, source.into())
    }

    fn build(interval: Duration, source: String) -> Self {
        Self {
            next_id: 0,
            interval,
            rendered_interval: format_duration(interval),
            source,
            last_time: None,
        }
    }

    pub fn next_event(&mut self) -> Event {
        // Wall clock may step backwards; never let event time do the same.
        let now = Utc::now();
        let time = match self.last_time {
            Some(prev) if prev > now => prev,
            _ => now,
        };
        self.last_time = Some(time);

        let event = Event {
            spec_version: SPEC_VERSION.to_string(),
            id: self.next_id.to_string(),
            event_type: HEARTBEAT_EVENT_TYPE.to_string(),
            source: self.source.clone(),
            time,
            data_content_type: HEARTBEAT_CONTENT_TYPE.to_string(),
            data: BTreeMap::from([(
                HEARTBEAT_DATA_KEY.to_string(),
                self.rendered_interval.clone(),
            )]),
        };
        self.next_id += 1;
        event
    }

    /// Id the next event will carry; equals the number built so far.
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_count_up_from_zero() {
        let mut factory = EventFactory::new(Duration::from_secs(5));
        let ids: Vec<String> = (0..5).map(|_| factory.next_event().id).collect();
        assert_eq!(ids, vec!["0", "1", "2", "3", "4"]);
        assert_eq!(factory.next_id(), 5);
    }

    #[test]
    fn fixed_fields_are_constant() {
        let mut factory = EventFactory::new(Duration::from_millis(100));
        let first = factory.next_event();
        let second = factory.next_event();

        assert_eq!(first.event_type, HEARTBEAT_EVENT_TYPE);
        assert_eq!(first.source, HEARTBEAT_SOURCE);
        assert_eq!(first.data_content_type, "text/json");
        assert_eq!(first.spec_version, "1.0");
        assert_eq!(first.event_type, second.event_type);
        assert_eq!(first.source, second.source);
    }

    #[test]
    fn payload_renders_interval_independent_of_counter() {
        let mut factory = EventFactory::new(Duration::from_secs(90));
        for _ in 0..3 {
            let event = factory.next_event();
            assert_eq!(event.data.len(), 1);
            assert_eq!(event.heartbeat(), Some("1m30s"));
        }
    }

    #[test]
    fn time_never_decreases() {
        let mut factory = EventFactory::new(Duration::from_millis(1));
        let times: Vec<_> = (0..200).map(|_| factory.next_event().time).collect();
        assert!(times.windows(2).all(|w| w[1] >= w[0]));
    }

    #[test]
    fn time_holds_when_clock_steps_back() {
        let mut factory = EventFactory::new(Duration::from_secs(1));
        let future = Utc::now() + chrono::Duration::hours(1);
        factory.last_time = Some(future);
        assert_eq!(factory.next_event().time, future);
    }

    #[test]
    fn custom_source_is_kept() {
        let source = Url::parse("urn:example:heartbeat").unwrap();
        let mut factory = EventFactory::with_source(Duration::from_secs(1), source.clone());
        assert_eq!(factory.source(), source.as_str());
        assert_eq!(factory.next_event().source, source.as_str());
    }

    #[test]
    fn default_source_is_an_absolute_uri() {
        let parsed = Url::parse(HEARTBEAT_SOURCE).unwrap();
        assert_eq!(parsed.scheme(), "http");
        assert_eq!(parsed.as_str(), HEARTBEAT_SOURCE);
        assert_eq!(EventFactory::new(Duration::from_secs(1)).source(), HEARTBEAT_SOURCE);
    }

    #[test]
    fn serializes_as_structured_cloudevent() {
        let mut factory = EventFactory::new(Duration::from_secs(5));
        let event = factory.next_event();
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["specversion"], "1.0");
        assert_eq!(json["id"], "0");
        assert_eq!(json["type"], "com.example.heartbeat");
        assert_eq!(json["source"], HEARTBEAT_SOURCE);
        assert_eq!(json["datacontenttype"], "text/json");
        assert_eq!(json["data"], serde_json::json!({ "heartbeat": "5s" }));
        assert!(json["time"].as_str().unwrap().ends_with('Z'));
    }
}
