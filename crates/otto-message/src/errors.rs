// src/errors.rs
// Error types for message construction, topic parsing, and the topic router.

use thiserror::Error;

// MessageError covers failures building or introspecting a Message.
#[derive(Error, Debug)]
pub enum MessageError {
    // InvalidTopic occurs when a topic string fails basic validation
    // (empty, or otherwise not a legal publish topic).
    #[error("invalid topic: {0}")]
    InvalidTopic(String),
    // NotJson occurs when AsMap/IsJSON is asked to parse a payload
    // that is not a valid JSON object.
    #[error("payload is not a JSON object: {0}")]
    NotJson(String),
    // TypeMismatch occurs when AsString/AsFloat can't coerce the
    // payload into the requested shape.
    #[error("payload type mismatch: {0}")]
    TypeMismatch(String),
}

impl MessageError {
    pub fn invalid_topic(detail: impl Into<String>) -> Self {
        Self::InvalidTopic(detail.into())
    }

    pub fn type_mismatch(detail: impl Into<String>) -> Self {
        Self::TypeMismatch(detail.into())
    }
}

// RouterError covers failures inserting or removing subscriptions
// from the topic router.
#[derive(Error, Debug)]
pub enum RouterError {
    // InvalidPattern occurs when a subscription pattern uses '#' in
    // a position other than the final segment, or is otherwise
    // malformed.
    #[error("invalid subscription pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

// HandlerError is returned by a handler when it fails to process a
// message. The router logs this and counts it; it never propagates
// back to the publisher.
#[derive(Error, Debug)]
pub enum HandlerError {
    #[error("handler error: {0}")]
    Failed(String),
    #[error("handler panicked: {0}")]
    Panicked(String),
}

impl HandlerError {
    pub fn failed(detail: impl Into<String>) -> Self {
        Self::Failed(detail.into())
    }
}
