// src/config.rs
// Layered config: a TOML file, then environment variables override
// it -- the same precedence the teacher's `Config::load` uses for
// carbide-health, built with the same `figment` crate.

use std::path::Path;
use std::time::Duration;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

fn default_http_addr() -> String {
    "0.0.0.0:8011".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "plain".to_string()
}

fn default_log_output() -> String {
    "stdout".to_string()
}

fn default_expiration_window_secs() -> u64 {
    60
}

fn default_announcement_period_secs() -> u64 {
    20
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(default)]
    pub broker: Option<String>,
    #[serde(default)]
    pub broker_user: Option<String>,
    #[serde(default)]
    pub broker_pass: Option<String>,
    #[serde(default = "default_http_addr")]
    pub http_addr: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_log_format")]
    pub log_format: String,
    #[serde(default = "default_log_output")]
    pub log_output: String,
    #[serde(default)]
    pub log_file_path: Option<String>,
    #[serde(default = "default_expiration_window_secs")]
    pub expiration_window_secs: u64,
    #[serde(default = "default_announcement_period_secs")]
    pub announcement_period_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            broker: None,
            broker_user: None,
            broker_pass: None,
            http_addr: default_http_addr(),
            log_level: default_log_level(),
            log_format: default_log_format(),
            log_output: default_log_output(),
            log_file_path: None,
            expiration_window_secs: default_expiration_window_secs(),
            announcement_period_secs: default_announcement_period_secs(),
        }
    }
}

impl Config {
    pub fn expiration_window(&self) -> Duration {
        Duration::from_secs(self.expiration_window_secs)
    }

    pub fn announcement_period(&self) -> Duration {
        Duration::from_secs(self.announcement_period_secs)
    }

    // load layers: built-in defaults, an optional TOML file, then
    // bare environment variables (BROKER, BROKER_USER, BROKER_PASS,
    // HTTP_ADDR, LOG_LEVEL, ...) -- env wins, matching the teacher's
    // own override order.
    pub fn load(path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        // Bare env vars (BROKER, LOG_LEVEL, HTTP_ADDR, ...) win over
        // the file, matching spec.md SS6's env var table.
        figment = figment.merge(Env::raw());
        figment.extract()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane_with_no_file_or_env() {
        let config = Config::default();
        assert_eq!(config.http_addr, "0.0.0.0:8011");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.expiration_window_secs, 60);
        assert!(config.announcement_period_secs < config.expiration_window_secs);
    }
}
