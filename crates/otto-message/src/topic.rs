// src/topic.rs
// Canonical outbound topic naming (`ss/{c|d}/{station}/{suffix}`) and
// the topic-usage counters used for observability.

use dashmap::DashMap;
use std::sync::LazyLock;

// TopicKind distinguishes control ("c") topics, used for station
// announcements and commands, from data ("d") topics, used for sensor
// readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicKind {
    Control,
    Data,
}

impl TopicKind {
    fn as_str(self) -> &'static str {
        match self {
            TopicKind::Control => "c",
            TopicKind::Data => "d",
        }
    }
}

// USAGE counts how many times each resolved topic string has been
// produced by `control_topic`/`data_topic`. Process-wide, like the
// default messenger and topic router.
static USAGE: LazyLock<DashMap<String, u64>> = LazyLock::new(DashMap::new);

fn build(kind: TopicKind, station: &str, suffix: &str) -> String {
    let topic = format!("ss/{}/{station}/{suffix}", kind.as_str());
    *USAGE.entry(topic.clone()).or_insert(0) += 1;
    topic
}

// control_topic builds `ss/c/{station}/{suffix}`, bumping its usage
// counter.
pub fn control_topic(station: &str, suffix: &str) -> String {
    build(TopicKind::Control, station, suffix)
}

// data_topic builds `ss/d/{station}/{suffix}`, bumping its usage
// counter.
pub fn data_topic(station: &str, suffix: &str) -> String {
    build(TopicKind::Data, station, suffix)
}

// topic_usage returns how many times `topic` has been produced by
// control_topic/data_topic, or 0 if never.
pub fn topic_usage(topic: &str) -> u64 {
    USAGE.get(topic).map(|v| *v).unwrap_or(0)
}

// validate_topic accepts a topic iff it has at least 4 '/'-separated
// segments, the first is "ss", the second is "c" or "d", and the
// third and fourth segments are non-empty.
pub fn validate_topic(topic: &str) -> bool {
    let segments: Vec<&str> = topic.split('/').collect();
    if segments.len() < 4 {
        return false;
    }
    segments[0] == "ss"
        && (segments[1] == "c" || segments[1] == "d")
        && !segments[2].is_empty()
        && !segments[3].is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_and_data_build_canonical_form() {
        assert_eq!(control_topic("s1", "station"), "ss/c/s1/station");
        assert_eq!(data_topic("s1", "temp"), "ss/d/s1/temp");
    }

    #[test]
    fn usage_counter_increments_per_call() {
        let topic = control_topic("usage-test-station", "station");
        let before = topic_usage(&topic);
        control_topic("usage-test-station", "station");
        assert_eq!(topic_usage(&topic), before + 1);
    }

    #[test]
    fn validator_accepts_canonical_topics() {
        assert!(validate_topic("ss/c/s1/station"));
        assert!(validate_topic("ss/d/s1/temp/extra"));
    }

    #[test]
    fn validator_rejects_malformed_topics() {
        assert!(!validate_topic("ss/c/s1"));
        assert!(!validate_topic("xx/c/s1/station"));
        assert!(!validate_topic("ss/z/s1/station"));
        assert!(!validate_topic("ss/c//station"));
    }

    #[test]
    fn parse_then_build_round_trips_a_canonical_topic() {
        let topic = control_topic("roundtrip-station", "station");
        let path = crate::message::parse_path(&topic);
        assert_eq!(path.join("/"), topic);
    }
}
