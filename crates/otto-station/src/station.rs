// src/station.rs
// Per-station lifecycle: New -> Init -> Running -> Stopped. Mirrors
// spec.md SS4.6 exactly; the error channel + dedicated drain worker
// below is grounded on the same "bounded mpsc feeding a background
// task" shape otto-ticker and the broker backend both use.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use otto_message::Message;
use otto_messenger::{Messenger, Payload};
use otto_ticker::TickerRegistry;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::announcement::{Announcement, StationSummary};
use crate::device::Device;
use crate::errors::StationError;
use crate::interface::{sample_local_interfaces, Interface};
use crate::metrics::{Metrics, MetricsSnapshot};

const ERROR_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StationState {
    New,
    Init,
    Running,
    Stopped,
}

fn now_unix_nanos() -> i64 {
    chrono::Utc::now()
        .timestamp_nanos_opt()
        .unwrap_or_else(|| chrono::Utc::now().timestamp_millis() * 1_000_000)
}

pub struct Station {
    id: String,
    hostname: Mutex<String>,
    last_heard: AtomicI64,
    expiration_window: Duration,
    announcement_period: Duration,
    local: bool,
    interfaces: Mutex<Vec<Interface>>,
    devices: Mutex<Vec<Device>>,
    pub metrics: Metrics,
    messenger: Arc<dyn Messenger>,
    tickers: Arc<TickerRegistry>,
    state: Mutex<StationState>,
    error_tx: Mutex<Option<mpsc::Sender<String>>>,
    drain_handle: Mutex<Option<JoinHandle<()>>>,
}

impl Station {
    // new validates `id` is non-empty and builds a station in the New
    // state. Init() must be called before StartTicker/SayHello.
    pub fn new(
        id: impl Into<String>,
        local: bool,
        expiration_window: Duration,
        announcement_period: Duration,
        messenger: Arc<dyn Messenger>,
        tickers: Arc<TickerRegistry>,
    ) -> Result<Arc<Self>, StationError> {
        let id = id.into();
        if id.is_empty() {
            return Err(StationError::InvalidId);
        }
        let (error_tx, error_rx) = mpsc::channel(ERROR_CHANNEL_CAPACITY);
        let station = Arc::new(Self {
            id,
            hostname: Mutex::new(String::new()),
            last_heard: AtomicI64::new(now_unix_nanos()),
            expiration_window,
            announcement_period,
            local,
            interfaces: Mutex::new(Vec::new()),
            devices: Mutex::new(Vec::new()),
            metrics: Metrics::new(),
            messenger,
            tickers,
            state: Mutex::new(StationState::New),
            error_tx: Mutex::new(Some(error_tx)),
            drain_handle: Mutex::new(None),
        });
        let handle = Station::spawn_error_drain(Arc::downgrade(&station), error_rx);
        *station.drain_handle.lock().expect("drain_handle lock poisoned") = Some(handle);
        Ok(station)
    }

    // spawn_error_drain is the "dedicated worker" from spec.md SS4.6:
    // it's the only consumer of error_tx, bumps the error counter, and
    // logs. Holds only a Weak reference to the station so the task
    // itself never keeps the station alive; recv() returns None once
    // stop() drops the sender, at which point the worker exits and
    // stop() joins it.
    fn spawn_error_drain(station: Weak<Self>, mut error_rx: mpsc::Receiver<String>) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(detail) = error_rx.recv().await {
                let Some(station) = station.upgrade() else {
                    break;
                };
                station.metrics.record_error();
                warn!(station = %station.id, error = %detail, "station error");
            }
        })
    }

    // send_error is the non-blocking path handlers and background
    // tasks use to report a failure to the drain worker. A closed
    // channel (post-Stop) silently drops the report.
    fn send_error(&self, detail: String) {
        if let Some(tx) = self.error_tx.lock().expect("error_tx lock poisoned").as_ref() {
            let _ = tx.try_send(detail);
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_local(&self) -> bool {
        self.local
    }

    pub fn state(&self) -> StationState {
        *self.state.lock().expect("state lock poisoned")
    }

    pub fn last_heard(&self) -> i64 {
        self.last_heard.load(Ordering::SeqCst)
    }

    pub fn hostname(&self) -> String {
        self.hostname.lock().expect("hostname lock poisoned").clone()
    }

    pub fn interfaces(&self) -> Vec<Interface> {
        self.interfaces.lock().expect("interfaces lock poisoned").clone()
    }

    // init samples hostname and, for local stations, network
    // interfaces; seeds the metrics start time. Idempotent: calling
    // it twice just resamples.
    pub fn init(&self) {
        let hostname = hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_else(|| "unknown".to_string());
        *self.hostname.lock().expect("hostname lock poisoned") = hostname;

        if self.local {
            *self.interfaces.lock().expect("interfaces lock poisoned") = sample_local_interfaces();
        }

        let mut state = self.state.lock().expect("state lock poisoned");
        if *state == StationState::New {
            *state = StationState::Init;
        }
    }

    // apply_announcement is the remote-station counterpart to init():
    // it seeds hostname/interfaces from a wire announcement instead of
    // sampling the host.
    pub fn apply_announcement(&self, announcement: &Announcement) {
        *self.hostname.lock().expect("hostname lock poisoned") = announcement.hostname.clone();
        *self.interfaces.lock().expect("interfaces lock poisoned") = announcement.interfaces.clone();
        self.last_heard.store(announcement.last_heard, Ordering::SeqCst);
        let mut state = self.state.lock().expect("state lock poisoned");
        if *state == StationState::New {
            *state = StationState::Init;
        }
    }

    // say_hello builds and publishes a station announcement on
    // `ss/c/{id}/station`, refreshes last_heard, and bumps the
    // announcements-sent metric.
    pub async fn say_hello(self: &Arc<Self>) -> Result<(), StationError> {
        let now = now_unix_nanos();
        self.last_heard.store(now, Ordering::SeqCst);

        let announcement = Announcement {
            id: self.id.clone(),
            hostname: self.hostname(),
            last_heard: now,
            interfaces: self.interfaces(),
        };
        let body = serde_json::to_vec(&announcement).map_err(|e| {
            StationError::Messenger(otto_messenger::MessengerError::invalid_payload(e.to_string()))
        })?;
        let topic = otto_message::control_topic(&self.id, "station");

        let result = self.messenger.publish(&topic, Payload::Bytes(body.clone())).await;
        match &result {
            Ok(()) => {
                self.metrics.record_announcement_sent();
                self.metrics.record_message_sent(body.len());
            }
            Err(e) => {
                self.send_error(e.to_string());
            }
        }
        result.map_err(StationError::Messenger)?;

        let mut state = self.state.lock().expect("state lock poisoned");
        if *state == StationState::Init {
            *state = StationState::Running;
        }
        Ok(())
    }

    // start_ticker registers a ticker named after this station's id
    // that calls say_hello() every `period`. AlreadyRunning if one is
    // already registered.
    pub async fn start_ticker(self: &Arc<Self>, period: Duration) -> Result<(), StationError> {
        let name = ticker_name(&self.id);
        let station = self.clone();
        let runtime_handle = tokio::runtime::Handle::current();
        let callback: otto_ticker::Callback = Arc::new(move || {
            let station = station.clone();
            runtime_handle.spawn(async move {
                if let Err(e) = station.say_hello().await {
                    warn!(station = %station.id, error = %e, "scheduled say_hello failed");
                }
            });
        });
        self.tickers
            .new_ticker(name, period, callback)
            .await
            .map_err(|e| match e {
                otto_ticker::TickerError::NameInUse(_) => StationError::AlreadyRunning,
                other => StationError::Ticker(other),
            })?;

        let mut state = self.state.lock().expect("state lock poisoned");
        if *state == StationState::Init {
            *state = StationState::Running;
        }
        Ok(())
    }

    // stop stops this station's ticker (if any), closes the error
    // channel, waits for the drain worker to exit, and marks the
    // terminal state. Safe to call more than once; only the first
    // call has an effect.
    pub async fn stop(&self) {
        {
            let mut state = self.state.lock().expect("state lock poisoned");
            if *state == StationState::Stopped {
                return;
            }
            *state = StationState::Stopped;
        }
        let _ = self.tickers.stop(&ticker_name(&self.id)).await;

        // Dropping the sender lets the drain worker's recv() return
        // None; join it so Stop only returns once that worker has
        // actually exited (spec.md SS5).
        self.error_tx.lock().expect("error_tx lock poisoned").take();
        let handle = self.drain_handle.lock().expect("drain_handle lock poisoned").take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }

    // is_healthy is true iff now - last_heard <= expiration_window.
    pub fn is_healthy(&self) -> bool {
        let now = now_unix_nanos();
        let elapsed = now.saturating_sub(self.last_heard());
        elapsed <= self.expiration_window.as_nanos() as i64
    }

    pub fn is_stale(&self) -> bool {
        !self.is_healthy()
    }

    pub fn expiration_window(&self) -> Duration {
        self.expiration_window
    }

    pub fn announcement_period(&self) -> Duration {
        self.announcement_period
    }

    pub fn add_device(&self, device: Device) {
        self.devices.lock().expect("devices lock poisoned").push(device);
    }

    pub fn get_device(&self, id: &str) -> Option<Device> {
        self.devices
            .lock()
            .expect("devices lock poisoned")
            .iter()
            .find(|d| d.id == id)
            .cloned()
    }

    pub fn devices(&self) -> Vec<Device> {
        self.devices.lock().expect("devices lock poisoned").clone()
    }

    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn summary(&self) -> StationSummary {
        StationSummary {
            id: self.id.clone(),
            hostname: self.hostname(),
            last_heard: self.last_heard(),
        }
    }
}

fn ticker_name(station_id: &str) -> String {
    format!("station-{station_id}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use otto_message::Router;
    use otto_messenger::LocalBackend;

    fn test_station(id: &str, expiration: Duration) -> Arc<Station> {
        let messenger: Arc<dyn Messenger> = Arc::new(LocalBackend::new("test", Arc::new(Router::new())));
        let tickers = Arc::new(TickerRegistry::new());
        Station::new(id, true, expiration, Duration::from_millis(10), messenger, tickers).unwrap()
    }

    #[test]
    fn empty_id_is_rejected() {
        let messenger: Arc<dyn Messenger> = Arc::new(LocalBackend::new("test", Arc::new(Router::new())));
        let tickers = Arc::new(TickerRegistry::new());
        let result = Station::new("", true, Duration::from_secs(1), Duration::from_millis(10), messenger, tickers);
        assert!(matches!(result, Err(StationError::InvalidId)));
    }

    #[tokio::test]
    async fn init_samples_hostname_and_transitions_to_init_state() {
        let station = test_station("s1", Duration::from_secs(60));
        assert_eq!(station.state(), StationState::New);
        station.init();
        assert_eq!(station.state(), StationState::Init);
        assert!(!station.hostname().is_empty());
    }

    #[tokio::test]
    async fn say_hello_publishes_and_refreshes_last_heard() {
        let station = test_station("s1", Duration::from_secs(60));
        station.init();
        let before = station.last_heard();
        tokio::time::sleep(Duration::from_millis(2)).await;
        station.say_hello().await.unwrap();
        assert!(station.last_heard() > before);
        assert_eq!(station.metrics.announcements_sent.load(Ordering::SeqCst), 1);
        assert_eq!(station.state(), StationState::Running);
    }

    #[tokio::test]
    async fn is_healthy_reflects_expiration_window() {
        let station = test_station("s1", Duration::from_millis(20));
        station.init();
        assert!(station.is_healthy());
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(!station.is_healthy());
        assert!(station.is_stale());
    }

    #[tokio::test]
    async fn start_ticker_twice_is_already_running() {
        let station = test_station("s1", Duration::from_secs(60));
        station.init();
        station.start_ticker(Duration::from_millis(50)).await.unwrap();
        let result = station.start_ticker(Duration::from_millis(50)).await;
        assert!(matches!(result, Err(StationError::AlreadyRunning)));
        station.stop().await;
    }

    #[tokio::test]
    async fn stop_is_idempotent() {
        let station = test_station("s1", Duration::from_secs(60));
        station.init();
        station.start_ticker(Duration::from_millis(50)).await.unwrap();
        station.stop().await;
        station.stop().await;
        assert_eq!(station.state(), StationState::Stopped);
    }

    // Regression for the error-drain task holding a strong Arc back to
    // the station it serves: that keeps recv() from ever returning
    // None, so the task (and the station) never gets dropped. The
    // drain task must only hold a Weak, and stop() must actually close
    // the channel and join the worker.
    #[tokio::test]
    async fn stop_releases_the_station_so_it_does_not_leak() {
        let station = test_station("s1", Duration::from_secs(60));
        station.stop().await;
        assert_eq!(
            Arc::strong_count(&station),
            1,
            "the drain worker should not be holding a strong reference after stop()"
        );
    }

    #[tokio::test]
    async fn add_device_and_get_device_round_trip() {
        let station = test_station("s1", Duration::from_secs(60));
        station.add_device(Device {
            id: "dev-1".to_string(),
            kind: "sensor".to_string(),
        });
        assert_eq!(station.get_device("dev-1").unwrap().kind, "sensor");
        assert!(station.get_device("missing").is_none());
    }
}
