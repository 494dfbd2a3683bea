//! Process-wide audit counters.
//!
//! [`METRICS`] accumulates over the lifetime of the process and is never
//! reset. A run takes a [`MetricsSnapshot`] when it starts and reports the
//! difference at the end, so a single audit logs only its own activity.
//! Audits running concurrently in one process share the counters, and their
//! deltas then include each other's increments.

use std::sync::atomic::{AtomicU64, Ordering};

pub static METRICS: Metrics = Metrics::new();

#[derive(Debug, Default)]
pub struct Metrics {
    items_evaluated: AtomicU64,
    oracle_calls: AtomicU64,
    oracle_retries: AtomicU64,
    unknown_downgrades: AtomicU64,
}

/// Counter values read at one instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub items_evaluated: u64,
    pub oracle_calls: u64,
    pub oracle_retries: u64,
    pub unknown_downgrades: u64,
}

impl MetricsSnapshot {
    /// Increments recorded between `earlier` and `self`.
    pub fn since(&self, earlier: &MetricsSnapshot) -> MetricsSnapshot {
        MetricsSnapshot {
            items_evaluated: self.items_evaluated.saturating_sub(earlier.items_evaluated),
            oracle_calls: self.oracle_calls.saturating_sub(earlier.oracle_calls),
            oracle_retries: self.oracle_retries.saturating_sub(earlier.oracle_retries),
            unknown_downgrades: self
                .unknown_downgrades
                .saturating_sub(earlier.unknown_downgrades),
        }
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            items_evaluated: AtomicU64::new(0),
            oracle_calls: AtomicU64::new(0),
            oracle_retries: AtomicU64::new(0),
            unknown_downgrades: AtomicU64::new(0),
        }
    }

    pub fn inc_items_evaluated(&self) {
        self.items_evaluated.fetch_add(1, Ordering::Relaxed);
    }

    /// Every oracle attempt, retries included.
    pub fn inc_oracle_calls(&self) {
        self.oracle_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_oracle_retries(&self) {
        self.oracle_retries.fetch_add(1, Ordering::Relaxed);
    }

    /// Oracle failures and undecided judgments turned into Unknown findings.
    pub fn inc_unknown_downgrades(&self) {
        self.unknown_downgrades.fetch_add(1, Ordering::Relaxed);
    }

    pub fn items_evaluated(&self) -> u64 {
        self.items_evaluated.load(Ordering::Relaxed)
    }

    pub fn oracle_calls(&self) -> u64 {
        self.oracle_calls.load(Ordering::Relaxed)
    }

    pub fn oracle_retries(&self) -> u64 {
        self.oracle_retries.load(Ordering::Relaxed)
    }

    pub fn unknown_downgrades(&self) -> u64 {
        self.unknown_downgrades.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            items_evaluated: self.items_evaluated(),
            oracle_calls: self.oracle_calls(),
            oracle_retries: self.oracle_retries(),
            unknown_downgrades: self.unknown_downgrades(),
        }
    }

    /// Log the activity since `baseline` as one `info!` event and return it.
    pub fn flush_since(&self, run_id: &str, baseline: &MetricsSnapshot) -> MetricsSnapshot {
        let run = self.snapshot().since(baseline);
        tracing::info!(
            metric = "flush",
            run_id = %run_id,
            items_evaluated = run.items_evaluated,
            oracle_calls = run.oracle_calls,
            oracle_retries = run.oracle_retries,
            unknown_downgrades = run.unknown_downgrades,
        );
        run
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let m = Metrics::new();
        m.inc_items_evaluated();
        m.inc_items_evaluated();
        m.inc_oracle_calls();
        m.inc_oracle_retries();
        m.inc_oracle_retries();
        m.inc_unknown_downgrades();
        assert_eq!(
            m.snapshot(),
            MetricsSnapshot {
                items_evaluated: 2,
                oracle_calls: 1,
                oracle_retries: 2,
                unknown_downgrades: 1,
            }
        );
    }

    #[test]
    fn test_flush_reports_only_activity_since_baseline() {
        let m = Metrics::new();
        m.inc_items_evaluated();
        m.inc_oracle_calls();

        let baseline = m.snapshot();
        m.inc_items_evaluated();
        m.inc_unknown_downgrades();

        let run = m.flush_since("run-1", &baseline);
        assert_eq!(run.items_evaluated, 1);
        assert_eq!(run.oracle_calls, 0);
        assert_eq!(run.unknown_downgrades, 1);
        assert_eq!(m.items_evaluated(), 2);
    }

    #[test]
    fn test_since_saturates() {
        let later = MetricsSnapshot {
            items_evaluated: 3,
            ..Default::default()
        };
        assert_eq!(later.since(&MetricsSnapshot::default()).items_evaluated, 3);
        assert_eq!(MetricsSnapshot::default().since(&later), MetricsSnapshot::default());
    }
}
