// src/broker/mock.rs
// A BrokerTransport that never touches the network. Records every
// subscribe/publish/unsubscribe call and lets tests inject a
// simulated inbound message or force any operation to fail.

use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::errors::MessengerError;

use super::transport::{BrokerTransport, TransportEvent};

#[derive(Debug, Default, Clone, Copy)]
pub struct FailureInjection {
    pub fail_start: bool,
    pub fail_subscribe: bool,
    pub fail_unsubscribe: bool,
    pub fail_publish: bool,
}

#[derive(Default)]
struct Recorded {
    subscribed: Vec<String>,
    unsubscribed: Vec<String>,
    published: Vec<(String, Vec<u8>)>,
}

pub struct MockTransport {
    events: Mutex<Option<mpsc::Sender<TransportEvent>>>,
    recorded: Mutex<Recorded>,
    failures: Mutex<FailureInjection>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(None),
            recorded: Mutex::new(Recorded::default()),
            failures: Mutex::new(FailureInjection::default()),
        }
    }

    pub fn set_failures(&self, failures: FailureInjection) {
        *self.failures.lock().expect("failures lock poisoned") = failures;
    }

    pub fn subscribed_patterns(&self) -> Vec<String> {
        self.recorded.lock().expect("recorded lock poisoned").subscribed.clone()
    }

    pub fn published_messages(&self) -> Vec<(String, Vec<u8>)> {
        self.recorded.lock().expect("recorded lock poisoned").published.clone()
    }

    // simulate_connected delivers a Connected event, as if the
    // broker had just accepted the connection (or reconnected).
    pub async fn simulate_connected(&self) {
        if let Some(tx) = self.events.lock().expect("events lock poisoned").clone() {
            let _ = tx.send(TransportEvent::Connected).await;
        }
    }

    // simulate_message delivers an inbound publish as if it had
    // arrived from the broker.
    pub async fn simulate_message(&self, topic: &str, payload: Vec<u8>) {
        if let Some(tx) = self.events.lock().expect("events lock poisoned").clone() {
            let _ = tx
                .send(TransportEvent::Message {
                    topic: topic.to_string(),
                    payload,
                })
                .await;
        }
    }

    pub async fn simulate_disconnected(&self) {
        if let Some(tx) = self.events.lock().expect("events lock poisoned").clone() {
            let _ = tx.send(TransportEvent::Disconnected).await;
        }
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BrokerTransport for MockTransport {
    async fn start(&self, events: mpsc::Sender<TransportEvent>) -> Result<(), MessengerError> {
        if self.failures.lock().expect("failures lock poisoned").fail_start {
            return Err(MessengerError::backend("mock: injected start failure"));
        }
        *self.events.lock().expect("events lock poisoned") = Some(events.clone());
        let _ = events.send(TransportEvent::Connected).await;
        Ok(())
    }

    async fn subscribe(&self, pattern: &str) -> Result<(), MessengerError> {
        if self.failures.lock().expect("failures lock poisoned").fail_subscribe {
            return Err(MessengerError::backend("mock: injected subscribe failure"));
        }
        self.recorded
            .lock()
            .expect("recorded lock poisoned")
            .subscribed
            .push(pattern.to_string());
        Ok(())
    }

    async fn unsubscribe(&self, pattern: &str) -> Result<(), MessengerError> {
        if self.failures.lock().expect("failures lock poisoned").fail_unsubscribe {
            return Err(MessengerError::backend("mock: injected unsubscribe failure"));
        }
        self.recorded
            .lock()
            .expect("recorded lock poisoned")
            .unsubscribed
            .push(pattern.to_string());
        Ok(())
    }

    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), MessengerError> {
        if self.failures.lock().expect("failures lock poisoned").fail_publish {
            return Err(MessengerError::backend("mock: injected publish failure"));
        }
        self.recorded
            .lock()
            .expect("recorded lock poisoned")
            .published
            .push((topic.to_string(), payload));
        Ok(())
    }

    async fn close(&self) -> Result<(), MessengerError> {
        *self.events.lock().expect("events lock poisoned") = None;
        Ok(())
    }
}
