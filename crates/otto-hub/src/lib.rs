pub mod config;
pub mod http;
pub mod logging;
pub mod runtime;

pub use config::Config;
pub use runtime::Runtime;
