// src/metrics.rs
// Per-station counters. All fields are atomics so handlers running on
// different workers (local: publisher's worker; broker: the backend's
// read worker) can update them without a lock.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

const RESPONSE_TIME_SAMPLE_CAP: usize = 64;

#[derive(Default)]
pub struct Metrics {
    pub announcements_sent: AtomicU64,
    pub messages_sent: AtomicU64,
    pub messages_sent_bytes: AtomicU64,
    pub messages_received: AtomicU64,
    pub messages_received_bytes: AtomicU64,
    pub errors: AtomicU64,
    pub health_checks: AtomicU64,
    pub healthy_checks: AtomicU64,
    pub unhealthy_checks: AtomicU64,
    response_times_ms: Mutex<Vec<u64>>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_announcement_sent(&self) {
        self.announcements_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_message_sent(&self, bytes: usize) {
        self.messages_sent.fetch_add(1, Ordering::Relaxed);
        self.messages_sent_bytes.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub fn record_message_received(&self, bytes: usize) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
        self.messages_received_bytes.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_health_check(&self, healthy: bool, response_time_ms: u64) {
        self.health_checks.fetch_add(1, Ordering::Relaxed);
        if healthy {
            self.healthy_checks.fetch_add(1, Ordering::Relaxed);
        } else {
            self.unhealthy_checks.fetch_add(1, Ordering::Relaxed);
        }
        let mut samples = self.response_times_ms.lock().expect("response_times lock poisoned");
        samples.push(response_time_ms);
        if samples.len() > RESPONSE_TIME_SAMPLE_CAP {
            samples.remove(0);
        }
    }

    // health_score is healthy/total*100, 100.0 when no checks have
    // run yet (nothing to be unhealthy about).
    pub fn health_score(&self) -> f64 {
        let total = self.health_checks.load(Ordering::Relaxed);
        if total == 0 {
            return 100.0;
        }
        let healthy = self.healthy_checks.load(Ordering::Relaxed);
        (healthy as f64 / total as f64) * 100.0
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            announcements_sent: self.announcements_sent.load(Ordering::Relaxed),
            messages_sent: self.messages_sent.load(Ordering::Relaxed),
            messages_sent_bytes: self.messages_sent_bytes.load(Ordering::Relaxed),
            messages_received: self.messages_received.load(Ordering::Relaxed),
            messages_received_bytes: self.messages_received_bytes.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            health_checks: self.health_checks.load(Ordering::Relaxed),
            healthy_checks: self.healthy_checks.load(Ordering::Relaxed),
            unhealthy_checks: self.unhealthy_checks.load(Ordering::Relaxed),
            health_score: self.health_score(),
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct MetricsSnapshot {
    pub announcements_sent: u64,
    pub messages_sent: u64,
    pub messages_sent_bytes: u64,
    pub messages_received: u64,
    pub messages_received_bytes: u64,
    pub errors: u64,
    pub health_checks: u64,
    pub healthy_checks: u64,
    pub unhealthy_checks: u64,
    pub health_score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_score_is_100_with_no_checks() {
        let metrics = Metrics::new();
        assert_eq!(metrics.health_score(), 100.0);
    }

    #[test]
    fn health_score_tracks_healthy_ratio() {
        let metrics = Metrics::new();
        metrics.record_health_check(true, 5);
        metrics.record_health_check(true, 5);
        metrics.record_health_check(false, 5);
        assert!((metrics.health_score() - 66.666).abs() < 0.01);
    }
}
