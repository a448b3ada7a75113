pub mod errors;
pub mod registry;
pub mod ticker;

pub use errors::TickerError;
pub use registry::TickerRegistry;
pub use ticker::{Callback, Ticker};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn new_ticker_fires_callback_periodically() {
        let registry = TickerRegistry::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let hits2 = hits.clone();
        registry
            .new_ticker("counter", Duration::from_millis(10), Arc::new(move || {
                hits2.fetch_add(1, Ordering::SeqCst);
            }))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(55)).await;
        registry.stop("counter").await.unwrap();

        assert!(hits.load(Ordering::SeqCst) >= 3, "expected several ticks, got {}", hits.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn duplicate_name_is_rejected() {
        let registry = TickerRegistry::new();
        registry
            .new_ticker("dup", Duration::from_secs(60), Arc::new(|| {}))
            .await
            .unwrap();
        let result = registry.new_ticker("dup", Duration::from_secs(60), Arc::new(|| {})).await;
        assert!(matches!(result, Err(TickerError::NameInUse(_))));
        registry.stop("dup").await.unwrap();
    }

    #[tokio::test]
    async fn stopping_unknown_ticker_is_an_error() {
        let registry = TickerRegistry::new();
        let result = registry.stop("ghost").await;
        assert!(matches!(result, Err(TickerError::Unknown(_))));
    }

    #[tokio::test]
    async fn stopping_an_already_stopped_ticker_is_ok_and_idempotent() {
        let registry = TickerRegistry::new();
        registry
            .new_ticker("hb", Duration::from_millis(10), Arc::new(|| {}))
            .await
            .unwrap();
        registry.stop("hb").await.unwrap();
        assert!(registry.stop("hb").await.is_ok());
        assert!(!registry.list().await.contains(&"hb".to_string()));
    }

    #[tokio::test]
    async fn stop_joins_before_returning() {
        let registry = TickerRegistry::new();
        let running = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let running2 = running.clone();
        registry
            .new_ticker("slow", Duration::from_millis(5), Arc::new(move || {
                running2.store(true, Ordering::SeqCst);
            }))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        registry.stop("slow").await.unwrap();
        assert!(running.load(Ordering::SeqCst));
        // After stop returns, the worker has exited; list() no longer
        // contains the name.
        assert!(!registry.list().await.contains(&"slow".to_string()));
    }

    #[tokio::test]
    async fn last_tick_of_is_none_until_first_fire_then_advances() {
        let registry = TickerRegistry::new();
        registry
            .new_ticker("hb", Duration::from_millis(10), Arc::new(|| {}))
            .await
            .unwrap();
        assert_eq!(registry.last_tick_of("hb").await, None);

        tokio::time::sleep(Duration::from_millis(25)).await;
        let first = registry.last_tick_of("hb").await.expect("should have ticked by now");

        tokio::time::sleep(Duration::from_millis(25)).await;
        let second = registry.last_tick_of("hb").await.expect("should still be ticking");
        assert!(second > first);

        registry.stop("hb").await.unwrap();
    }

    #[tokio::test]
    async fn list_reflects_active_tickers() {
        let registry = TickerRegistry::new();
        registry.new_ticker("a", Duration::from_secs(60), Arc::new(|| {})).await.unwrap();
        registry.new_ticker("b", Duration::from_secs(60), Arc::new(|| {})).await.unwrap();
        let mut names = registry.list().await;
        names.sort();
        assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
        registry.stop_all().await;
        assert!(registry.list().await.is_empty());
    }
}
