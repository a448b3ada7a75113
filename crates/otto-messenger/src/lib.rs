pub mod broker;
pub mod default;
pub mod errors;
pub mod local;
pub mod messenger;
pub mod payload;

pub use broker::{BrokerBackend, BrokerTransport, FailureInjection, MockTransport, RumqttcTransport, TransportEvent};
pub use default::{build_messenger, default_messenger, set_default_messenger, BrokerSetting};
pub use errors::MessengerError;
pub use local::LocalBackend;
pub use messenger::{MessageHandler, Messenger};
pub use payload::Payload;
