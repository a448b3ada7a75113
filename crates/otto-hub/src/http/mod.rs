// src/http/mod.rs
// Single axum Router for the whole HTTP surface (spec.md SS6), with
// tower-http's TraceLayer for request logging -- the same middleware
// family the teacher's `api` crate depends on.

mod error;
mod handlers;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::runtime::Runtime;

pub type AppState = Arc<Runtime>;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ping", get(handlers::ping))
        .route("/version", get(handlers::version))
        .route("/api/stats", get(handlers::stats))
        .route("/api/stations", get(handlers::list_stations))
        .route("/api/stations/{id}", get(handlers::get_station))
        .route("/api/timers", get(handlers::list_timers))
        .route("/api/log", get(handlers::log_config))
        .route("/api/shutdown", post(handlers::shutdown))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
