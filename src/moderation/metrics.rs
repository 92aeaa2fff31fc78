// Operational counters for the moderation loop.
//
// Owned by whoever runs the loop and shared by reference (or Arc) with every
// concurrent analysis. Counters only ever go up.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug)]
pub struct ModerationMetrics {
    messages_analyzed: AtomicU64,
    incidents_detected: AtomicU64,
    messages_deleted: AtomicU64,
    started_at: DateTime<Utc>,
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub messages_analyzed: u64,
    pub incidents_detected: u64,
    pub messages_deleted: u64,
    pub started_at: DateTime<Utc>,
    pub uptime_seconds: i64,
}

impl Default for ModerationMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ModerationMetrics {
    pub fn new() -> Self {
        Self::started_at(Utc::now())
    }

    pub fn started_at(started_at: DateTime<Utc>) -> Self {
        Self {
            messages_analyzed: AtomicU64::new(0),
            incidents_detected: AtomicU64::new(0),
            messages_deleted: AtomicU64::new(0),
            started_at,
        }
    }

    pub fn record_analyzed(&self) {
        self.messages_analyzed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_incident(&self) {
        self.incidents_detected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_deleted(&self) {
        self.messages_deleted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        self.snapshot_at(Utc::now())
    }

    /// Snapshot with uptime measured against `now`.
    pub fn snapshot_at(&self, now: DateTime<Utc>) -> MetricsSnapshot {
        MetricsSnapshot {
            messages_analyzed: self.messages_analyzed.load(Ordering::Relaxed),
            incidents_detected: self.incidents_detected.load(Ordering::Relaxed),
            messages_deleted: self.messages_deleted.load(Ordering::Relaxed),
            started_at: self.started_at,
            uptime_seconds: (now - self.started_at).num_seconds().max(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_uptime_from_start() {
        let start = Utc::now();
        let metrics = ModerationMetrics::started_at(start);
        let snap = metrics.snapshot_at(start + chrono::Duration::seconds(90));
        assert_eq!(snap.uptime_seconds, 90);
        assert_eq!(snap.messages_analyzed, 0);
    }

    #[test]
    fn test_concurrent_increments() {
        let metrics = Arc::new(ModerationMetrics::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let m = Arc::clone(&metrics);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        m.record_analyzed();
                    }
                    m.record_incident();
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        let snap = metrics.snapshot();
        assert_eq!(snap.messages_analyzed, 8000);
        assert_eq!(snap.incidents_detected, 8);
        assert_eq!(snap.messages_deleted, 0);
    }
}
