//! Lock-free run statistics using atomic operations

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use serde::Serialize;

use crate::storage::VisitRecord;

/// Counters shared by all workers for the duration of one run
#[derive(Debug)]
pub struct RunStats {
    visits_completed: AtomicU64,
    urls_dropped: AtomicU64,
    navigation_failures: AtomicU64,
    interactions_total: AtomicU64,
    started_at: Instant,
}

/// Point-in-time copy of the run counters, for the final summary
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub visits_completed: u64,
    pub urls_dropped: u64,
    pub navigation_failures: u64,
    pub interactions_total: u64,
    pub elapsed_secs: f64,
}

impl RunStats {
    pub fn new() -> Self {
        Self {
            visits_completed: AtomicU64::new(0),
            urls_dropped: AtomicU64::new(0),
            navigation_failures: AtomicU64::new(0),
            interactions_total: AtomicU64::new(0),
            started_at: Instant::now(),
        }
    }

    /// Record a completed visit (one record emitted)
    pub fn record_visit(&self, record: &VisitRecord) {
        self.visits_completed.fetch_add(1, Ordering::Relaxed);
        self.interactions_total
            .fetch_add(u64::from(record.interactions), Ordering::Relaxed);
        if record.status_code < 0 {
            self.navigation_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a URL dropped at the scheduling layer (no record emitted)
    pub fn record_dropped(&self) {
        self.urls_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn visits_completed(&self) -> u64 {
        self.visits_completed.load(Ordering::Relaxed)
    }

    pub fn urls_dropped(&self) -> u64 {
        self.urls_dropped.load(Ordering::Relaxed)
    }

    /// Get snapshot for the final summary log
    pub fn snapshot(&self) -> RunSummary {
        RunSummary {
            visits_completed: self.visits_completed.load(Ordering::Relaxed),
            urls_dropped: self.urls_dropped.load(Ordering::Relaxed),
            navigation_failures: self.navigation_failures.load(Ordering::Relaxed),
            interactions_total: self.interactions_total.load(Ordering::Relaxed),
            elapsed_secs: self.started_at.elapsed().as_secs_f64(),
        }
    }
}

impl Default for RunStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn visit_counters_accumulate() {
        let stats = RunStats::new();
        stats.record_visit(&VisitRecord::new(
            "https://a.test",
            Some(200),
            Duration::from_millis(100),
            4,
        ));
        stats.record_visit(&VisitRecord::new(
            "https://b.test",
            None,
            Duration::from_secs(30),
            0,
        ));
        stats.record_dropped();

        let summary = stats.snapshot();
        assert_eq!(summary.visits_completed, 2);
        assert_eq!(summary.navigation_failures, 1);
        assert_eq!(summary.interactions_total, 4);
        assert_eq!(summary.urls_dropped, 1);
    }
}
