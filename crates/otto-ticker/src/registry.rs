// src/registry.rs
// Named periodic callback registry. A single mutex serializes
// mutations (New/Stop); List takes a snapshot under the same lock.
// Survives caller replacement: once New() returns, the ticker keeps
// running independent of whatever handle the caller holds.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::Mutex;

use crate::errors::TickerError;
use crate::ticker::{Callback, Ticker};

#[derive(Default)]
pub struct TickerRegistry {
    tickers: Mutex<HashMap<String, Ticker>>,
}

impl TickerRegistry {
    pub fn new() -> Self {
        Self {
            tickers: Mutex::new(HashMap::new()),
        }
    }

    // new_ticker registers and starts a ticker. Fails with NameInUse
    // if a ticker with this name is already registered.
    pub async fn new_ticker(
        &self,
        name: impl Into<String>,
        period: Duration,
        callback: Callback,
    ) -> Result<(), TickerError> {
        let name = name.into();
        let mut tickers = self.tickers.lock().await;
        if tickers.contains_key(&name) {
            return Err(TickerError::NameInUse(name));
        }
        let ticker = Ticker::spawn(name.clone(), period, callback);
        tickers.insert(name, ticker);
        Ok(())
    }

    // stop signals the named ticker's worker and waits for it to exit
    // before returning. Idempotent: a name that was registered at some
    // point stays known to the registry even once stopped, so a
    // second Stop on the same name is a no-op that still returns ok.
    // Only a name that was never registered returns Unknown. The
    // ticker is removed from the map for the duration of the join so
    // the registry lock isn't held across the worker's shutdown, then
    // put back so the name (and its now-stopped state) is remembered.
    pub async fn stop(&self, name: &str) -> Result<(), TickerError> {
        let mut ticker = {
            let mut tickers = self.tickers.lock().await;
            tickers
                .remove(name)
                .ok_or_else(|| TickerError::Unknown(name.to_string()))?
        };
        ticker.stop().await;
        self.tickers.lock().await.insert(name.to_string(), ticker);
        Ok(())
    }

    // list returns the names of tickers that are currently running.
    // A stopped ticker's name is remembered internally (so a repeat
    // Stop stays idempotent) but no longer appears here.
    pub async fn list(&self) -> Vec<String> {
        self.tickers
            .lock()
            .await
            .iter()
            .filter(|(_, ticker)| !ticker.is_stopped())
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub async fn period_of(&self, name: &str) -> Option<Duration> {
        self.tickers.lock().await.get(name).map(Ticker::period)
    }

    // last_tick_of is the named ticker's most recent callback-dispatch
    // timestamp (unix nanoseconds), or None if it's unknown or hasn't
    // fired yet.
    pub async fn last_tick_of(&self, name: &str) -> Option<i64> {
        self.tickers
            .lock()
            .await
            .get(name)
            .and_then(Ticker::last_tick_unix_nanos)
    }

    // stop_all is used by the runtime's shutdown path to join every
    // outstanding worker.
    pub async fn stop_all(&self) {
        let names: Vec<String> = self.list().await;
        for name in names {
            let _ = self.stop(&name).await;
        }
    }
}
