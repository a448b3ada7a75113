// src/runtime.rs
// Runtime composition (spec.md SS4.8): owns the messenger, station
// manager, ticker registry, and a `done` signal closed exactly once on
// shutdown. Signal handling itself is wired by main.rs, per spec.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use otto_message::Message;
use otto_messenger::{BrokerSetting, Messenger};
use otto_station::StationManager;
use otto_ticker::TickerRegistry;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::config::Config;

const SWEEP_TICKER_NAME: &str = "station-sweep";
const STATION_ANNOUNCEMENT_PATTERN: &str = "ss/c/+/station";

pub struct Runtime {
    pub config: Config,
    pub messenger: Arc<dyn Messenger>,
    pub stations: Arc<StationManager>,
    pub tickers: Arc<TickerRegistry>,
    done_tx: watch::Sender<bool>,
    done_rx: watch::Receiver<bool>,
    stopped: AtomicBool,
}

impl Runtime {
    pub fn new(config: Config) -> Self {
        let messenger = otto_messenger::build_messenger(BrokerSetting {
            value: config.broker.clone(),
            username: config.broker_user.clone(),
            password: config.broker_pass.clone(),
        });
        let tickers = Arc::new(TickerRegistry::new());
        let stations = Arc::new(StationManager::new(
            messenger.clone(),
            tickers.clone(),
            config.expiration_window(),
            config.announcement_period(),
        ));
        let (done_tx, done_rx) = watch::channel(false);

        Self {
            config,
            messenger,
            stations,
            tickers,
            done_tx,
            done_rx,
            stopped: AtomicBool::new(false),
        }
    }

    // init connects the messenger, subscribes to the station
    // announcement wildcard, registers this hub as a local station,
    // and registers the periodic sweep ticker (SPEC_FULL.md SS4.7).
    pub async fn init(&self) -> Result<(), anyhow::Error> {
        self.messenger.connect().await?;

        let stations = self.stations.clone();
        self.messenger
            .subscribe(
                STATION_ANNOUNCEMENT_PATTERN,
                Arc::new(move |message: &Message| {
                    handle_announcement_message(&stations, message)
                }),
            )
            .await?;

        self.stations.add_local("otto-hub")?;

        let stations_for_sweep = self.stations.clone();
        let handle = tokio::runtime::Handle::current();
        self.tickers
            .new_ticker(
                SWEEP_TICKER_NAME,
                self.config.expiration_window(),
                Arc::new(move || {
                    let stations = stations_for_sweep.clone();
                    handle.spawn(async move {
                        stations.sweep().await;
                    });
                }),
            )
            .await?;

        info!("otto-hub runtime initialized");
        Ok(())
    }

    pub fn done(&self) -> watch::Receiver<bool> {
        self.done_rx.clone()
    }

    // stop closes the messenger, joins every ticker, and closes the
    // done channel exactly once.
    pub async fn stop(&self) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        self.tickers.stop_all().await;
        if let Err(e) = self.messenger.close().await {
            warn!(error = %e, "error closing messenger during shutdown");
        }
        let _ = self.done_tx.send(true);
        info!("otto-hub runtime stopped");
    }
}

fn handle_announcement_message(
    stations: &Arc<StationManager>,
    message: &Message,
) -> Result<(), otto_message::HandlerError> {
    let announcement: otto_station::Announcement = serde_json::from_slice(&message.payload)
        .map_err(|e| otto_message::HandlerError::failed(format!("bad announcement payload: {e}")))?;
    stations
        .handle_announcement(announcement)
        .map_err(|e| otto_message::HandlerError::failed(e.to_string()))
}
