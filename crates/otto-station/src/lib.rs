pub mod announcement;
pub mod device;
pub mod errors;
pub mod interface;
pub mod manager;
pub mod metrics;
pub mod station;

pub use announcement::{Announcement, StationSummary};
pub use device::Device;
pub use errors::StationError;
pub use interface::Interface;
pub use manager::StationManager;
pub use metrics::{Metrics, MetricsSnapshot};
pub use station::{Station, StationState};

#[cfg(test)]
mod tests {
    use super::*;
    use otto_message::Router;
    use otto_messenger::LocalBackend;
    use otto_ticker::TickerRegistry;
    use std::sync::Arc;
    use std::time::Duration;

    fn manager(expiration: Duration) -> StationManager {
        let messenger = Arc::new(LocalBackend::new("test", Arc::new(Router::new())));
        let tickers = Arc::new(TickerRegistry::new());
        StationManager::new(messenger, tickers, expiration, Duration::from_millis(10))
    }

    #[test]
    fn add_rejects_duplicates() {
        let manager = manager(Duration::from_secs(60));
        manager.add("s1", true).unwrap();
        let result = manager.add("s1", true);
        assert!(matches!(result, Err(StationError::Duplicate(_))));
    }

    #[test]
    fn get_and_count_reflect_registered_stations() {
        let manager = manager(Duration::from_secs(60));
        assert_eq!(manager.count(), 0);
        manager.add("s1", true).unwrap();
        manager.add("s2", true).unwrap();
        assert_eq!(manager.count(), 2);
        assert!(manager.get("s1").is_some());
        assert!(manager.get("missing").is_none());
    }

    #[test]
    fn handle_announcement_creates_then_refreshes_a_remote_station() {
        let manager = manager(Duration::from_secs(60));
        let announcement = Announcement {
            id: "remote-1".to_string(),
            hostname: "sensor-box".to_string(),
            last_heard: 1_000,
            interfaces: vec![],
        };
        manager.handle_announcement(announcement.clone()).unwrap();
        assert_eq!(manager.count(), 1);
        let station = manager.get("remote-1").unwrap();
        assert_eq!(station.hostname(), "sensor-box");
        assert!(!station.is_local());

        let refreshed = Announcement {
            last_heard: 2_000,
            ..announcement
        };
        manager.handle_announcement(refreshed).unwrap();
        assert_eq!(manager.count(), 1);
        assert_eq!(manager.get("remote-1").unwrap().last_heard(), 2_000);
    }

    #[tokio::test]
    async fn sweep_removes_and_stops_stale_stations() {
        let manager = manager(Duration::from_millis(20));
        manager.add_local("s1").unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(manager.count(), 1);
        manager.sweep().await;
        assert_eq!(manager.count(), 0);
    }

    #[tokio::test]
    async fn sweep_leaves_healthy_stations_alone() {
        let manager = manager(Duration::from_secs(60));
        manager.add_local("s1").unwrap();
        manager.sweep().await;
        assert_eq!(manager.count(), 1);
    }
}
