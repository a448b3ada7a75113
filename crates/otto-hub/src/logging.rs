// src/logging.rs
// Grounded on crates/health/src/main.rs's EnvFilter setup. The
// teacher's stdout layer is its internal `logfmt` crate, which isn't
// available here; tracing_subscriber::fmt::layer() stands in, with
// .json() selected by the `log_format` config field -- the same
// plain-vs-structured decision the teacher's own setup makes.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

// `log_output`/`log_file_path` are reported verbatim by /api/log but
// don't currently redirect output -- the teacher's file-sink path
// goes through its internal logfmt crate, which has no public
// equivalent in this workspace's dependency set.
pub fn init(config: &Config) -> Result<(), anyhow::Error> {
    let default_level: LevelFilter = config.log_level.parse().unwrap_or(LevelFilter::INFO);
    let env_filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    let registry = tracing_subscriber::registry().with(env_filter);

    if config.log_format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    Ok(())
}
