// src/broker/backend.rs
// Messenger implementation backed by a BrokerTransport. Owns an
// otto_message::Router for local fan-out so dispatch precedence
// (exact, then +, then #) is identical to the local backend -- the
// transport only hands us raw (topic, payload) pairs, it doesn't know
// about wildcards.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use otto_message::{HandlerToken, Message, Router};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::errors::MessengerError;
use crate::messenger::{MessageHandler, Messenger};
use crate::payload::Payload;

use super::transport::{BrokerTransport, TransportEvent};

const EVENT_CHANNEL_CAPACITY: usize = 256;

pub struct BrokerBackend {
    id: String,
    transport: Arc<dyn BrokerTransport>,
    router: Arc<Router>,
    remembered: Arc<Mutex<Vec<String>>>,
    publish_count: AtomicU64,
    last_error: Arc<Mutex<Option<String>>>,
    connected: Arc<std::sync::atomic::AtomicBool>,
}

impl BrokerBackend {
    pub fn new(id: impl Into<String>, transport: Arc<dyn BrokerTransport>) -> Self {
        Self {
            id: id.into(),
            transport,
            router: Arc::new(Router::new()),
            remembered: Arc::new(Mutex::new(Vec::new())),
            publish_count: AtomicU64::new(0),
            last_error: Arc::new(Mutex::new(None)),
            connected: Arc::new(std::sync::atomic::AtomicBool::new(false)),
        }
    }

    // spawn_event_pump drains TransportEvents and either replays
    // remembered subscriptions (on Connected) or dispatches an
    // inbound publish through the router (on Message). Takes only
    // Arc-shared handles, so it doesn't need an Arc<Self> to spawn.
    fn spawn_event_pump(&self, mut events: mpsc::Receiver<TransportEvent>) {
        let id = self.id.clone();
        let transport = self.transport.clone();
        let router = self.router.clone();
        let remembered = self.remembered.clone();
        let last_error = self.last_error.clone();
        let connected = self.connected.clone();
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                match event {
                    TransportEvent::Connected => {
                        connected.store(true, Ordering::SeqCst);
                        let patterns = remembered.lock().expect("remembered lock poisoned").clone();
                        for pattern in patterns {
                            if let Err(e) = transport.subscribe(&pattern).await {
                                warn!(pattern = %pattern, error = %e, "failed to replay subscription");
                                *last_error.lock().expect("last_error lock poisoned") =
                                    Some(e.to_string());
                            }
                        }
                        info!(messenger = %id, "broker connected");
                    }
                    TransportEvent::Disconnected => {
                        connected.store(false, Ordering::SeqCst);
                        warn!(messenger = %id, "broker disconnected, will reconnect");
                    }
                    TransportEvent::Message { topic, payload } => {
                        match Message::new(&topic, payload, id.clone()) {
                            Ok(message) => {
                                router.publish(&message);
                            }
                            Err(e) => {
                                warn!(topic = %topic, error = %e, "dropping malformed inbound message");
                            }
                        }
                    }
                }
            }
        });
    }
}

#[async_trait]
impl Messenger for BrokerBackend {
    fn id(&self) -> &str {
        &self.id
    }

    async fn connect(&self) -> Result<(), MessengerError> {
        if self.connected.load(Ordering::SeqCst) {
            return Ok(());
        }
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        self.transport.start(tx).await?;
        // Mark connected synchronously on a successful start rather
        // than waiting for the spawned event pump to observe the
        // transport's own Connected event: otherwise a subscribe()
        // called right after connect() returns would race the pump's
        // first poll and wrongly take the "defer until Connect" path
        // forever (the Connected event it's waiting on already fired).
        self.connected.store(true, Ordering::SeqCst);
        self.spawn_event_pump(rx);
        Ok(())
    }

    async fn subscribe(
        &self,
        pattern: &str,
        handler: MessageHandler,
    ) -> Result<HandlerToken, MessengerError> {
        let token = self.router.insert(pattern, handler)?;
        self.remembered
            .lock()
            .expect("remembered lock poisoned")
            .push(pattern.to_string());
        // If we're not connected yet, remembering the pattern is
        // enough: connect()'s Connected-event replay issues it to the
        // transport. Issuing it here too would double-subscribe once
        // that replay runs (spec.md SS4.3: "defers the underlying call
        // until Connect").
        if self.connected.load(Ordering::SeqCst) {
            self.transport.subscribe(pattern).await?;
        }
        Ok(token)
    }

    async fn unsubscribe(&self, pattern: &str, token: HandlerToken) -> Result<(), MessengerError> {
        self.router.remove(pattern, Some(token))?;
        let mut remembered = self.remembered.lock().expect("remembered lock poisoned");
        if let Some(pos) = remembered.iter().position(|p| p == pattern) {
            remembered.remove(pos);
        }
        drop(remembered);
        self.transport.unsubscribe(pattern).await?;
        Ok(())
    }

    async fn publish(&self, topic: &str, payload: Payload) -> Result<(), MessengerError> {
        let bytes = payload.encode()?;
        let message = Message::new(topic, bytes, self.id.clone())?;
        self.publish_msg(message).await
    }

    async fn publish_msg(&self, message: Message) -> Result<(), MessengerError> {
        let result = self.transport.publish(&message.topic, message.payload).await;
        if let Err(ref e) = result {
            *self.last_error.lock().expect("last_error lock poisoned") = Some(e.to_string());
        }
        result?;
        self.publish_count.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn close(&self) -> Result<(), MessengerError> {
        self.transport.close().await?;
        self.connected.store(false, Ordering::SeqCst);
        self.remembered.lock().expect("remembered lock poisoned").clear();
        self.router.clear();
        Ok(())
    }

    fn publish_count(&self) -> u64 {
        self.publish_count.load(Ordering::Relaxed)
    }

    fn last_error(&self) -> Option<String> {
        self.last_error.lock().expect("last_error lock poisoned").clone()
    }
}
