// src/manager.rs
// Station manager: Add/Get/Count/Sweep over a single live-station map.
// A single mutex serializes mutation (Add, Sweep's removals); reads
// (Get, Count) take a read lock -- same split otto_message::Router
// uses for its trie.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use otto_messenger::Messenger;
use otto_ticker::TickerRegistry;
use tracing::info;

use crate::announcement::Announcement;
use crate::errors::StationError;
use crate::station::Station;

pub struct StationManager {
    stations: RwLock<HashMap<String, Arc<Station>>>,
    messenger: Arc<dyn Messenger>,
    tickers: Arc<TickerRegistry>,
    default_expiration_window: Duration,
    default_announcement_period: Duration,
}

impl StationManager {
    pub fn new(
        messenger: Arc<dyn Messenger>,
        tickers: Arc<TickerRegistry>,
        default_expiration_window: Duration,
        default_announcement_period: Duration,
    ) -> Self {
        Self {
            stations: RwLock::new(HashMap::new()),
            messenger,
            tickers,
            default_expiration_window,
            default_announcement_period,
        }
    }

    // add registers a new station in the New state. Duplicate if the
    // id is already present.
    pub fn add(&self, id: &str, local: bool) -> Result<Arc<Station>, StationError> {
        let mut stations = self.stations.write().expect("stations lock poisoned");
        if stations.contains_key(id) {
            return Err(StationError::Duplicate(id.to_string()));
        }
        let station = Station::new(
            id,
            local,
            self.default_expiration_window,
            self.default_announcement_period,
            self.messenger.clone(),
            self.tickers.clone(),
        )?;
        stations.insert(id.to_string(), station.clone());
        Ok(station)
    }

    // add_local is the local-hub-identity convenience path named in
    // SPEC_FULL.md SS4.6: it also calls Init() so interfaces are
    // sampled immediately.
    pub fn add_local(&self, id: &str) -> Result<Arc<Station>, StationError> {
        let station = self.add(id, true)?;
        station.init();
        Ok(station)
    }

    pub fn get(&self, id: &str) -> Option<Arc<Station>> {
        self.stations.read().expect("stations lock poisoned").get(id).cloned()
    }

    pub fn count(&self) -> usize {
        self.stations.read().expect("stations lock poisoned").len()
    }

    pub fn list(&self) -> Vec<Arc<Station>> {
        self.stations.read().expect("stations lock poisoned").values().cloned().collect()
    }

    // handle_announcement is the inbound side of the wire protocol:
    // Add a new station (and Init it from the wire payload) the first
    // time it's heard from, or just refresh last_heard/hostname/
    // interfaces on every subsequent announcement.
    pub fn handle_announcement(&self, announcement: Announcement) -> Result<(), StationError> {
        if let Some(station) = self.get(&announcement.id) {
            station.apply_announcement(&announcement);
            return Ok(());
        }
        let station = self.add(&announcement.id, false)?;
        station.apply_announcement(&announcement);
        Ok(())
    }

    // sweep moves every stale station (now - last_heard > expiration
    // window) out of the live map and stops it.
    pub async fn sweep(&self) {
        let stale: Vec<Arc<Station>> = {
            let stations = self.stations.read().expect("stations lock poisoned");
            stations.values().filter(|s| s.is_stale()).cloned().collect()
        };
        if stale.is_empty() {
            return;
        }
        {
            let mut stations = self.stations.write().expect("stations lock poisoned");
            for station in &stale {
                stations.remove(station.id());
            }
        }
        for station in stale {
            info!(station = %station.id(), "sweeping stale station");
            station.stop().await;
        }
    }
}
