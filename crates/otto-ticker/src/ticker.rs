// src/ticker.rs
// One ticker = one worker selecting between a timer tick and a stop
// signal, same two-channel-select shape the messenger crate's broker
// backend uses for its event pump. MissedTickBehavior::Delay gives
// the "no catch-up firing" rule: a slow callback pushes subsequent
// ticks back rather than bursting to catch up.

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::warn;

pub type Callback = Arc<dyn Fn() + Send + Sync>;

fn now_unix_nanos() -> i64 {
    chrono::Utc::now()
        .timestamp_nanos_opt()
        .unwrap_or_else(|| chrono::Utc::now().timestamp_millis() * 1_000_000)
}

pub struct Ticker {
    name: String,
    period: Duration,
    stop_tx: Option<oneshot::Sender<()>>,
    worker: Option<JoinHandle<()>>,
    last_tick_ns: Arc<AtomicI64>,
}

impl Ticker {
    pub(crate) fn spawn(name: String, period: Duration, callback: Callback) -> Self {
        let (stop_tx, mut stop_rx) = oneshot::channel();
        let worker_name = name.clone();
        let last_tick_ns = Arc::new(AtomicI64::new(0));
        let last_tick_for_worker = last_tick_ns.clone();
        let worker = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        last_tick_for_worker.store(now_unix_nanos(), Ordering::SeqCst);
                        let result = std::panic::catch_unwind(AssertUnwindSafe(&*callback));
                        if result.is_err() {
                            warn!(ticker = %worker_name, "callback panicked");
                        }
                    }
                    _ = &mut stop_rx => {
                        break;
                    }
                }
            }
        });
        Self {
            name,
            period,
            stop_tx: Some(stop_tx),
            worker: Some(worker),
            last_tick_ns,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    // last_tick_unix_nanos is the timestamp of this ticker's most
    // recent callback dispatch, or None if it has never fired yet.
    pub fn last_tick_unix_nanos(&self) -> Option<i64> {
        match self.last_tick_ns.load(Ordering::SeqCst) {
            0 => None,
            ns => Some(ns),
        }
    }

    // stop signals the worker and waits for it to exit. Idempotent:
    // calling it more than once is a no-op after the first call.
    pub async fn stop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(worker) = self.worker.take() {
            let _ = worker.await;
        }
    }

    // is_stopped is true once stop() has run to completion. Names stay
    // registered after stopping (spec: "names are unique within the
    // process"); the registry uses this to hide stopped tickers from
    // List() without forgetting the name was ever used.
    pub fn is_stopped(&self) -> bool {
        self.worker.is_none()
    }
}
