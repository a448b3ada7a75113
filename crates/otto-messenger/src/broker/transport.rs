// src/broker/transport.rs
// The seam between BrokerBackend and whatever actually moves bytes
// over the wire. Swapping RumqttcTransport for MockTransport is how
// the broker backend gets exercised without a live broker.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::errors::MessengerError;

#[derive(Debug, Clone)]
pub enum TransportEvent {
    Connected,
    Message { topic: String, payload: Vec<u8> },
    Disconnected,
}

#[async_trait]
pub trait BrokerTransport: Send + Sync {
    // start spawns whatever background work the transport needs and
    // begins delivering TransportEvents on `events`. Must return once
    // the background work is launched, not block for the transport's
    // lifetime.
    async fn start(&self, events: mpsc::Sender<TransportEvent>) -> Result<(), MessengerError>;

    async fn subscribe(&self, pattern: &str) -> Result<(), MessengerError>;

    async fn unsubscribe(&self, pattern: &str) -> Result<(), MessengerError>;

    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), MessengerError>;

    async fn close(&self) -> Result<(), MessengerError>;
}
