// src/lib.rs
// Message envelope, topic naming, and the wildcard topic router.

pub mod errors;
pub mod message;
pub mod router;
pub mod topic;

pub use errors::{HandlerError, MessageError, RouterError};
pub use message::Message;
pub use router::{Dispatch, Handler, HandlerResult, HandlerToken, Router};
pub use topic::{TopicKind, control_topic, data_topic, topic_usage, validate_topic};
