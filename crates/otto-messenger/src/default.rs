// src/default.rs
// Process-wide default messenger resolution (spec.md SS4.3):
// explicit configuration, else `BROKER` env var, else fallback "otto".
// `none` selects the local backend; anything else is a broker host.

use std::sync::{Arc, OnceLock, RwLock};

use otto_message::Router;

use crate::broker::{BrokerBackend, RumqttcTransport};
use crate::local::LocalBackend;
use crate::messenger::Messenger;

const DEFAULT_BROKER_HOST: &str = "otto";
const DEFAULT_BROKER_PORT: u16 = 1883;
const DEFAULT_CLIENT_ID: &str = "otto-hub";

static DEFAULT_MESSENGER: OnceLock<RwLock<Arc<dyn Messenger>>> = OnceLock::new();

// BrokerSetting captures the "explicit configuration" source named by
// the resolution rule, so callers with a figment-loaded config value
// can pass it through instead of relying on the environment.
#[derive(Debug, Clone)]
pub struct BrokerSetting {
    pub value: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Default for BrokerSetting {
    fn default() -> Self {
        Self {
            value: std::env::var("BROKER").ok(),
            username: std::env::var("BROKER_USER").ok(),
            password: std::env::var("BROKER_PASS").ok(),
        }
    }
}

// build_messenger turns a resolved BrokerSetting into the concrete
// Messenger for it: "none" -> local, anything else -> broker backend
// with that value used as the MQTT host.
pub fn build_messenger(setting: BrokerSetting) -> Arc<dyn Messenger> {
    let value = setting.value.unwrap_or_else(|| DEFAULT_BROKER_HOST.to_string());
    if value == "none" {
        return Arc::new(LocalBackend::new("local", Arc::new(Router::new())));
    }
    let transport = RumqttcTransport::with_credentials(
        &value,
        DEFAULT_BROKER_PORT,
        DEFAULT_CLIENT_ID,
        setting.username,
        setting.password,
    );
    Arc::new(BrokerBackend::new("broker", Arc::new(transport)))
}

// default_messenger returns the lazily-initialized process-wide
// messenger, building it from the environment on first use.
pub fn default_messenger() -> Arc<dyn Messenger> {
    let cell = DEFAULT_MESSENGER
        .get_or_init(|| RwLock::new(build_messenger(BrokerSetting::default())));
    cell.read().expect("default messenger lock poisoned").clone()
}

// set_default_messenger overrides the process-wide messenger. Intended
// for the runtime's startup path, where a figment-loaded config value
// should take precedence over the bare environment default.
pub fn set_default_messenger(messenger: Arc<dyn Messenger>) {
    let cell = DEFAULT_MESSENGER.get_or_init(|| RwLock::new(messenger.clone()));
    *cell.write().expect("default messenger lock poisoned") = messenger;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_resolves_to_local_backend() {
        let messenger = build_messenger(BrokerSetting {
            value: Some("none".to_string()),
            username: None,
            password: None,
        });
        assert_eq!(messenger.id(), "local");
    }

    #[test]
    fn any_other_value_resolves_to_broker_backend() {
        let messenger = build_messenger(BrokerSetting {
            value: Some("mqtt.example.com".to_string()),
            username: None,
            password: None,
        });
        assert_eq!(messenger.id(), "broker");
    }

    #[test]
    fn missing_value_falls_back_to_otto_host() {
        let messenger = build_messenger(BrokerSetting {
            value: None,
            username: None,
            password: None,
        });
        assert_eq!(messenger.id(), "broker");
    }
}
