// src/local.rs
// The in-process messenger: drives the topic router directly, with no
// network hop. Connect is always a trivial success.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use otto_message::{HandlerToken, Message, Router};
use tracing::debug;

use crate::errors::MessengerError;
use crate::messenger::{MessageHandler, Messenger};
use crate::payload::Payload;

pub struct LocalBackend {
    id: String,
    router: std::sync::Arc<Router>,
    subscriptions: Mutex<Vec<(String, HandlerToken)>>,
    publish_count: AtomicU64,
    last_error: Mutex<Option<String>>,
}

impl LocalBackend {
    // new builds a local messenger over a shared router. Pass the
    // same `Arc<Router>` to every messenger that should see each
    // other's publications (the process-wide default messenger does
    // this automatically; tests typically construct their own router
    // so cases don't interfere with each other).
    pub fn new(id: impl Into<String>, router: std::sync::Arc<Router>) -> Self {
        Self {
            id: id.into(),
            router,
            subscriptions: Mutex::new(Vec::new()),
            publish_count: AtomicU64::new(0),
            last_error: Mutex::new(None),
        }
    }
}

#[async_trait]
impl Messenger for LocalBackend {
    fn id(&self) -> &str {
        &self.id
    }

    async fn connect(&self) -> Result<(), MessengerError> {
        Ok(())
    }

    async fn subscribe(
        &self,
        pattern: &str,
        handler: MessageHandler,
    ) -> Result<HandlerToken, MessengerError> {
        let token = self.router.insert(pattern, handler)?;
        self.subscriptions
            .lock()
            .expect("subscriptions lock poisoned")
            .push((pattern.to_string(), token));
        Ok(token)
    }

    async fn unsubscribe(&self, pattern: &str, token: HandlerToken) -> Result<(), MessengerError> {
        self.router.remove(pattern, Some(token))?;
        self.subscriptions
            .lock()
            .expect("subscriptions lock poisoned")
            .retain(|(p, t)| !(p == pattern && *t == token));
        Ok(())
    }

    async fn publish(&self, topic: &str, payload: Payload) -> Result<(), MessengerError> {
        let bytes = payload.encode()?;
        let message = Message::new(topic, bytes, self.id.clone())?;
        self.publish_msg(message).await
    }

    async fn publish_msg(&self, message: Message) -> Result<(), MessengerError> {
        let outcome = self.router.publish(&message);
        if !outcome.matched {
            debug!(topic = %message.topic, "local publish: no subscribers");
        }
        self.publish_count.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn close(&self) -> Result<(), MessengerError> {
        let mut subs = self.subscriptions.lock().expect("subscriptions lock poisoned");
        for (pattern, token) in subs.drain(..) {
            // Best-effort: removal failures (e.g. already pruned) are
            // not fatal to shutdown.
            if let Err(e) = self.router.remove(&pattern, Some(token)) {
                *self.last_error.lock().expect("last_error lock poisoned") = Some(e.to_string());
            }
        }
        Ok(())
    }

    fn publish_count(&self) -> u64 {
        self.publish_count.load(Ordering::Relaxed)
    }

    fn last_error(&self) -> Option<String> {
        self.last_error.lock().expect("last_error lock poisoned").clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;

    #[tokio::test]
    async fn publish_routes_to_matching_subscriber() {
        let router = Arc::new(Router::new());
        let messenger = LocalBackend::new("local-test", router);
        messenger.connect().await.unwrap();

        let hits = Arc::new(AtomicUsize::new(0));
        let hits2 = hits.clone();
        messenger
            .subscribe(
                "a/+/c",
                Arc::new(move |_msg| {
                    hits2.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }),
            )
            .await
            .unwrap();

        messenger.publish("a/b/c", Payload::Text("hi".into())).await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(messenger.publish_count(), 1);
    }

    #[tokio::test]
    async fn publish_with_no_subscribers_still_succeeds() {
        let router = Arc::new(Router::new());
        let messenger = LocalBackend::new("local-test", router);
        let result = messenger.publish("nobody/home", Payload::Text("x".into())).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn close_clears_subscriptions_and_is_idempotent() {
        let router = Arc::new(Router::new());
        let messenger = LocalBackend::new("local-test", router);
        messenger
            .subscribe("a/b", Arc::new(|_m| Ok(())))
            .await
            .unwrap();
        messenger.close().await.unwrap();
        messenger.close().await.unwrap();
        assert!(messenger.subscriptions.lock().unwrap().is_empty());
    }
}
