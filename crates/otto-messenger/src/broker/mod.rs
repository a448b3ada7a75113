// src/broker/mod.rs
// The reconnecting MQTT-backed messenger, split into a transport seam
// (transport.rs), the real rumqttc transport (client.rs), a
// test-only transport (mock.rs), and the Messenger impl that ties
// router-based dispatch to whichever transport it's given
// (backend.rs).

mod backend;
mod client;
mod mock;
mod transport;

pub use backend::BrokerBackend;
pub use client::RumqttcTransport;
pub use mock::{FailureInjection, MockTransport};
pub use transport::{BrokerTransport, TransportEvent};

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::messenger::Messenger;
    use crate::payload::Payload;

    #[tokio::test]
    async fn connect_replays_remembered_subscriptions_on_reconnect() {
        let mock = Arc::new(MockTransport::new());
        let backend = BrokerBackend::new("broker-test", mock.clone());
        backend.connect().await.unwrap();

        backend
            .subscribe("ss/d/+/temp", Arc::new(|_m| Ok(())))
            .await
            .unwrap();
        assert_eq!(mock.subscribed_patterns(), vec!["ss/d/+/temp".to_string()]);

        // Simulate a drop and reconnect; the pattern should be
        // resubscribed automatically.
        mock.simulate_disconnected().await;
        mock.simulate_connected().await;

        // Give the spawned event pump a tick to process the replay.
        tokio::task::yield_now().await;
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        assert_eq!(mock.subscribed_patterns().len(), 2);
    }

    #[tokio::test]
    async fn inbound_message_dispatches_through_router() {
        let mock = Arc::new(MockTransport::new());
        let backend = BrokerBackend::new("broker-test", mock.clone());
        backend.connect().await.unwrap();

        let hits = Arc::new(AtomicUsize::new(0));
        let hits2 = hits.clone();
        backend
            .subscribe(
                "ss/d/+/temp",
                Arc::new(move |_m| {
                    hits2.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }),
            )
            .await
            .unwrap();

        mock.simulate_message("ss/d/station-1/temp", b"72.1".to_vec()).await;
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn publish_failure_is_surfaced_and_recorded() {
        let mock = Arc::new(MockTransport::new());
        mock.set_failures(FailureInjection {
            fail_publish: true,
            ..Default::default()
        });
        let backend = BrokerBackend::new("broker-test", mock);
        backend.connect().await.unwrap();

        let result = backend.publish("ss/c/station-1/ping", Payload::Text("x".into())).await;
        assert!(result.is_err());
        assert!(backend.last_error().is_some());
    }

    #[tokio::test]
    async fn publish_count_tracks_successful_publishes_only() {
        let mock = Arc::new(MockTransport::new());
        let backend = BrokerBackend::new("broker-test", mock);
        backend.connect().await.unwrap();

        backend.publish("ss/c/station-1/ping", Payload::Text("x".into())).await.unwrap();
        backend.publish("ss/c/station-1/ping", Payload::Text("y".into())).await.unwrap();
        assert_eq!(backend.publish_count(), 2);
    }
}
