// src/messenger.rs
// The backend-agnostic pub/sub facade every backend (local, broker,
// mock-backed broker) implements identically.

use async_trait::async_trait;
use otto_message::{HandlerToken, Message};

use crate::errors::MessengerError;
use crate::payload::Payload;

pub type MessageHandler = std::sync::Arc<dyn Fn(&Message) -> Result<(), otto_message::HandlerError> + Send + Sync>;

#[async_trait]
pub trait Messenger: Send + Sync {
    // id returns this messenger's stable identity string.
    fn id(&self) -> &str;

    // connect is idempotent: becomes a no-op after the first success.
    async fn connect(&self) -> Result<(), MessengerError>;

    // subscribe stores (pattern, handler) in the local table. If the
    // backend isn't connected yet, the call to the underlying client
    // (broker backends only) is deferred until connect().
    async fn subscribe(
        &self,
        pattern: &str,
        handler: MessageHandler,
    ) -> Result<HandlerToken, MessengerError>;

    // unsubscribe removes a single handler previously returned by
    // subscribe.
    async fn unsubscribe(&self, pattern: &str, token: HandlerToken) -> Result<(), MessengerError>;

    // publish converts `payload` to bytes per the encoding table,
    // builds a Message, and sends it. Bumps the publish counter on
    // success.
    async fn publish(&self, topic: &str, payload: Payload) -> Result<(), MessengerError>;

    // publish_msg takes the same path as publish but with a
    // caller-built Message.
    async fn publish_msg(&self, message: Message) -> Result<(), MessengerError>;

    // close unsubscribes everything, closes the underlying client, and
    // clears the local subscription table. Safe to call more than
    // once.
    async fn close(&self) -> Result<(), MessengerError>;

    // publish_count is the number of successful publish/publish_msg
    // calls so far.
    fn publish_count(&self) -> u64;

    // last_error is the most recent transport failure observed during
    // a publish, if any.
    fn last_error(&self) -> Option<String>;
}
