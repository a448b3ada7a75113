// src/errors.rs
// Error taxonomy for the messenger abstraction, following the same
// one-enum-per-crate shape as otto_message::errors and mqttea's own
// MqtteaClientError: one variant per failure kind, #[from] where a
// single wrapped cause exists.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MessengerError {
    #[error("invalid topic: {0}")]
    InvalidTopic(String),
    #[error("invalid subscription pattern: {0}")]
    InvalidPattern(String),
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
    #[error("backend error: {0}")]
    BackendError(String),
    #[error("operation timed out")]
    Timeout,
    #[error("operation cancelled")]
    Cancelled,
    #[error(transparent)]
    Message(#[from] otto_message::MessageError),
    #[error(transparent)]
    Router(#[from] otto_message::RouterError),
}

impl MessengerError {
    pub fn backend(detail: impl Into<String>) -> Self {
        Self::BackendError(detail.into())
    }

    pub fn invalid_payload(detail: impl Into<String>) -> Self {
        Self::InvalidPayload(detail.into())
    }
}

impl From<rumqttc::ClientError> for MessengerError {
    fn from(e: rumqttc::ClientError) -> Self {
        MessengerError::BackendError(e.to_string())
    }
}

impl From<rumqttc::ConnectionError> for MessengerError {
    fn from(e: rumqttc::ConnectionError) -> Self {
        MessengerError::BackendError(e.to_string())
    }
}
