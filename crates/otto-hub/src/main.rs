// src/main.rs
// Binary entrypoint. Owns the signal select! per spec.md SS4.8
// ("signal handling is wired by the caller"); Runtime itself only
// exposes init/done/stop.

use std::sync::Arc;

use otto_hub::{http, Config, Runtime};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config_path = std::env::args().nth(1).map(std::path::PathBuf::from);
    let config = Config::load(config_path.as_deref())?;

    otto_hub::logging::init(&config)?;

    info!(version = env!("CARGO_PKG_VERSION"), ?config, "starting otto-hub");

    let http_addr = config.http_addr.clone();
    let runtime = Arc::new(Runtime::new(config));
    runtime.init().await?;

    let app = http::router(runtime.clone());
    let listener = match tokio::net::TcpListener::bind(&http_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(addr = %http_addr, error = %e, "failed to bind HTTP listener");
            std::process::exit(1);
        }
    };

    let server = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!(error = %e, "HTTP server exited with error");
        }
    });

    wait_for_shutdown_signal(&runtime).await;
    runtime.stop().await;
    server.abort();

    info!("stopped otto-hub");
    Ok(())
}

async fn wait_for_shutdown_signal(runtime: &Arc<Runtime>) {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    let mut terminate = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        .expect("failed to install SIGTERM handler");
    #[cfg(unix)]
    let terminate_signal = terminate.recv();
    #[cfg(not(unix))]
    let terminate_signal = std::future::pending::<()>();

    let mut done = runtime.done();
    tokio::select! {
        _ = ctrl_c => info!("received SIGINT, shutting down"),
        _ = terminate_signal => info!("received SIGTERM, shutting down"),
        _ = done.changed() => info!("shutdown requested via HTTP"),
    }
}
