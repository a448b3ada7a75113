// src/http/handlers.rs
// One handler per spec.md SS6 HTTP surface row. AppState carries the
// shared Runtime the same way the teacher's axum handlers extract a
// shared `Arc<...>` application state.

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use crate::config::Config;

use super::error::ApiError;
use super::AppState;

#[derive(Serialize)]
pub struct VersionBody {
    pub version: String,
}

pub async fn ping() -> &'static str {
    "pong"
}

pub async fn version() -> Json<VersionBody> {
    Json(VersionBody {
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[derive(Serialize)]
pub struct StatsBody {
    pub worker_threads: usize,
    pub cpu_count: usize,
    pub memory_bytes: Option<u64>,
}

// resident_set_size reads /proc/self/statm on Linux; None elsewhere.
// `goroutine_count` from the original Go runtime has no Rust analogue
// (Tokio's active task count isn't introspectable from safe public
// API), so worker_threads is reported instead.
fn resident_set_size() -> Option<u64> {
    let contents = std::fs::read_to_string("/proc/self/statm").ok()?;
    let pages: u64 = contents.split_whitespace().nth(1)?.parse().ok()?;
    let page_size = 4096u64;
    Some(pages * page_size)
}

pub async fn stats() -> Json<StatsBody> {
    let worker_threads = tokio::runtime::Handle::current()
        .metrics()
        .num_workers();
    Json(StatsBody {
        worker_threads,
        cpu_count: num_cpus::get(),
        memory_bytes: resident_set_size(),
    })
}

pub async fn list_stations(State(runtime): State<AppState>) -> Json<Vec<otto_station::StationSummary>> {
    let summaries = runtime.stations.list().iter().map(|s| s.summary()).collect();
    Json(summaries)
}

#[derive(Serialize)]
pub struct StationView {
    pub id: String,
    pub hostname: String,
    pub last_heard: i64,
    pub local: bool,
    pub state: otto_station::StationState,
    pub healthy: bool,
    pub interfaces: Vec<otto_station::Interface>,
    pub devices: Vec<otto_station::Device>,
    pub metrics: otto_station::MetricsSnapshot,
}

pub async fn get_station(
    State(runtime): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StationView>, ApiError> {
    let station = runtime
        .stations
        .get(&id)
        .ok_or_else(|| ApiError::not_found("station_not_found", format!("no station with id {id}")))?;

    Ok(Json(StationView {
        id: station.id().to_string(),
        hostname: station.hostname(),
        last_heard: station.last_heard(),
        local: station.is_local(),
        state: station.state(),
        healthy: station.is_healthy(),
        interfaces: station.interfaces(),
        devices: station.devices(),
        metrics: station.metrics_snapshot(),
    }))
}

#[derive(Serialize)]
pub struct TimerView {
    pub period_ms: u128,
    pub last_tick: Option<i64>,
}

pub async fn list_timers(State(runtime): State<AppState>) -> Json<std::collections::BTreeMap<String, TimerView>> {
    let mut out = std::collections::BTreeMap::new();
    for name in runtime.tickers.list().await {
        if let Some(period) = runtime.tickers.period_of(&name).await {
            let last_tick = runtime.tickers.last_tick_of(&name).await;
            out.insert(name, TimerView { period_ms: period.as_millis(), last_tick });
        }
    }
    Json(out)
}

#[derive(Serialize)]
pub struct LogConfigBody {
    pub level: String,
    pub format: String,
    pub output: String,
    pub file_path: Option<String>,
}

pub async fn log_config(State(runtime): State<AppState>) -> Json<LogConfigBody> {
    let config: &Config = &runtime.config;
    Json(LogConfigBody {
        level: config.log_level.clone(),
        format: config.log_format.clone(),
        output: config.log_output.clone(),
        file_path: config.log_file_path.clone(),
    })
}

#[derive(Serialize)]
pub struct ShutdownBody {
    pub shutdown: String,
}

pub async fn shutdown(State(runtime): State<AppState>) -> Json<ShutdownBody> {
    let runtime = runtime.clone();
    tokio::spawn(async move {
        runtime.stop().await;
    });
    Json(ShutdownBody {
        shutdown: "ok".to_string(),
    })
}
