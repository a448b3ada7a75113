// src/message.rs
// The immutable message envelope that flows through the topic router.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::MessageError;

// NEXT_ID is the process-local monotonic id generator for messages.
// It starts at 1, per spec: ids are unique within a process run, not
// across restarts.
static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn next_id() -> u64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

fn now_unix_nanos() -> i64 {
    chrono::Utc::now()
        .timestamp_nanos_opt()
        .unwrap_or_else(|| chrono::Utc::now().timestamp_millis() * 1_000_000)
}

// Message is an immutable envelope: topic, parsed path, payload bytes,
// source identifier, and a unix-nanosecond timestamp. Once constructed
// none of these fields change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub id: u64,
    pub topic: String,
    pub path: Vec<String>,
    pub payload: Vec<u8>,
    pub source: String,
    pub timestamp_ns: i64,
}

impl Message {
    // new parses `topic` into its path and stamps a fresh id and
    // timestamp. Fails with InvalidTopic if topic is empty.
    pub fn new(
        topic: impl Into<String>,
        payload: impl Into<Vec<u8>>,
        source: impl Into<String>,
    ) -> Result<Self, MessageError> {
        let topic = topic.into();
        if topic.is_empty() {
            return Err(MessageError::invalid_topic("topic must not be empty"));
        }
        Ok(Self {
            id: next_id(),
            path: parse_path(&topic),
            topic,
            payload: payload.into(),
            source: source.into(),
            timestamp_ns: now_unix_nanos(),
        })
    }

    // is_json reports whether the payload parses as a JSON object.
    pub fn is_json(&self) -> bool {
        matches!(
            serde_json::from_slice::<Value>(&self.payload),
            Ok(Value::Object(_))
        )
    }

    // as_map decodes the payload as a JSON object, or returns NotJson.
    pub fn as_map(&self) -> Result<serde_json::Map<String, Value>, MessageError> {
        match serde_json::from_slice::<Value>(&self.payload) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => Err(MessageError::NotJson(format!(
                "payload decoded as {other}, not an object"
            ))),
            Err(e) => Err(MessageError::NotJson(e.to_string())),
        }
    }

    // as_string does a best-effort UTF-8 decode of the payload.
    pub fn as_string(&self) -> Result<String, MessageError> {
        String::from_utf8(self.payload.clone())
            .map_err(|e| MessageError::type_mismatch(format!("not valid utf-8: {e}")))
    }

    // as_float parses the payload's text as an f64.
    pub fn as_float(&self) -> Result<f64, MessageError> {
        let text = self.as_string()?;
        text.trim()
            .parse::<f64>()
            .map_err(|e| MessageError::type_mismatch(format!("{text:?} is not a float: {e}")))
    }
}

// parse_path splits a topic into its ordered segments. Consistent
// with the topic string: rejoining with '/' reproduces it exactly.
pub fn parse_path(topic: &str) -> Vec<String> {
    topic.split('/').map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_parses_path_and_stamps_fields() {
        let msg = Message::new("a/b/c", "hi", "unit-test").unwrap();
        assert_eq!(msg.topic, "a/b/c");
        assert_eq!(msg.path, vec!["a", "b", "c"]);
        assert_eq!(msg.payload, b"hi");
        assert_eq!(msg.source, "unit-test");
    }

    #[test]
    fn ids_are_monotonic_within_a_process() {
        let a = Message::new("a", "x", "s").unwrap();
        let b = Message::new("a", "x", "s").unwrap();
        assert!(b.id > a.id);
    }

    #[test]
    fn empty_topic_is_invalid() {
        assert!(matches!(
            Message::new("", "x", "s"),
            Err(MessageError::InvalidTopic(_))
        ));
    }

    #[test]
    fn json_round_trip_preserves_fields() {
        let original = Message::new("ss/c/s1/station", br#"{"a":1}"#.to_vec(), "s1").unwrap();
        let encoded = serde_json::to_vec(&original).unwrap();
        let decoded: Message = serde_json::from_slice(&encoded).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn is_json_and_as_map() {
        let msg = Message::new("t", br#"{"k":"v"}"#.to_vec(), "s").unwrap();
        assert!(msg.is_json());
        let map = msg.as_map().unwrap();
        assert_eq!(map.get("k").unwrap(), "v");
    }

    #[test]
    fn as_float_parses_text() {
        let msg = Message::new("t", "3.5", "s").unwrap();
        assert_eq!(msg.as_float().unwrap(), 3.5);
    }

    #[test]
    fn as_float_rejects_non_numeric_text() {
        let msg = Message::new("t", "not-a-number", "s").unwrap();
        assert!(msg.as_float().is_err());
    }
}
