use super::codec::RowSkipHook;
use crate::error::Error;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::warn;

/// Counters kept by the dispatcher
#[derive(Debug, Default)]
pub struct DispatchStats {
    responded: AtomicU64,
    not_handled: AtomicU64,
    permission_denied: AtomicU64,
    failed: AtomicU64,
    skipped_rows: AtomicU64,
}

/// Point-in-time copy of [`DispatchStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub responded: u64,
    pub not_handled: u64,
    pub permission_denied: u64,
    pub failed: u64,
    pub skipped_rows: u64,
}

impl DispatchStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_responded(&self) {
        self.responded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_not_handled(&self) {
        self.not_handled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_permission_denied(&self) {
        self.permission_denied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a copy of the current counters
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            responded: self.responded.load(Ordering::Relaxed),
            not_handled: self.not_handled.load(Ordering::Relaxed),
            permission_denied: self.permission_denied.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            skipped_rows: self.skipped_rows.load(Ordering::Relaxed),
        }
    }
}

impl RowSkipHook for DispatchStats {
    fn row_skipped(&self, field: &str, error: &Error) {
        self.skipped_rows.fetch_add(1, Ordering::Relaxed);
        warn!("Skipping row in '{}': {}", field, error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::encoding_error;

    #[test]
    fn test_counters() {
        let stats = DispatchStats::new();
        stats.record_responded();
        stats.record_responded();
        stats.record_not_handled();
        stats.record_permission_denied();
        stats.record_failed();
        stats.row_skipped("events", &encoding_error("bad row"));

        assert_eq!(
            stats.snapshot(),
            StatsSnapshot {
                responded: 2,
                not_handled: 1,
                permission_denied: 1,
                failed: 1,
                skipped_rows: 1,
            }
        );
    }
}
