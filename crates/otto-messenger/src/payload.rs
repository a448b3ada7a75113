// src/payload.rs
// The "any -> bytes" payload encoding table from the messenger
// contract. Kept as an explicit enum rather than ad-hoc reflection, so
// callers discriminate only on the primitive cases the spec names.

use crate::errors::MessengerError;

#[derive(Debug, Clone)]
pub enum Payload {
    Bytes(Vec<u8>),
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Json(serde_json::Value),
    None,
}

impl Payload {
    pub fn encode(&self) -> Result<Vec<u8>, MessengerError> {
        match self {
            Payload::Bytes(b) => Ok(b.clone()),
            Payload::Text(s) => Ok(s.as_bytes().to_vec()),
            Payload::Integer(i) => Ok(i.to_string().into_bytes()),
            Payload::Float(f) => Ok(f.to_string().into_bytes()),
            Payload::Bool(b) => Ok(b.to_string().into_bytes()),
            Payload::Json(v) => serde_json::to_vec(v)
                .map_err(|e| MessengerError::invalid_payload(format!("JSON encode failed: {e}"))),
            Payload::None => Err(MessengerError::invalid_payload(
                "no payload value provided",
            )),
        }
    }
}

impl From<Vec<u8>> for Payload {
    fn from(v: Vec<u8>) -> Self {
        Payload::Bytes(v)
    }
}

impl From<&[u8]> for Payload {
    fn from(v: &[u8]) -> Self {
        Payload::Bytes(v.to_vec())
    }
}

impl From<String> for Payload {
    fn from(v: String) -> Self {
        Payload::Text(v)
    }
}

impl From<&str> for Payload {
    fn from(v: &str) -> Self {
        Payload::Text(v.to_string())
    }
}

impl From<i64> for Payload {
    fn from(v: i64) -> Self {
        Payload::Integer(v)
    }
}

impl From<f64> for Payload {
    fn from(v: f64) -> Self {
        Payload::Float(v)
    }
}

impl From<bool> for Payload {
    fn from(v: bool) -> Self {
        Payload::Bool(v)
    }
}

impl From<serde_json::Value> for Payload {
    fn from(v: serde_json::Value) -> Self {
        Payload::Json(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_encode_as_plain_decimal_text() {
        assert_eq!(Payload::Integer(42).encode().unwrap(), b"42");
        assert_eq!(Payload::Integer(-7).encode().unwrap(), b"-7");
    }

    #[test]
    fn floats_encode_shortest_round_trip() {
        assert_eq!(Payload::Float(3.5).encode().unwrap(), b"3.5");
    }

    #[test]
    fn booleans_encode_as_true_false() {
        assert_eq!(Payload::Bool(true).encode().unwrap(), b"true");
        assert_eq!(Payload::Bool(false).encode().unwrap(), b"false");
    }

    #[test]
    fn json_objects_encode_as_json() {
        let value = serde_json::json!({"a": 1});
        assert_eq!(Payload::Json(value).encode().unwrap(), br#"{"a":1}"#);
    }

    #[test]
    fn none_is_rejected() {
        assert!(Payload::None.encode().is_err());
    }
}
