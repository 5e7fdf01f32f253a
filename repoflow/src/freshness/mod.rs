//! Per-key refresh tracking.
//!
//! Records when a resource was last refreshed and answers whether it is
//! still within the staleness window. Used by the working-copy manager to
//! decide whether a pull can be skipped.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::time::Duration;

/// Default staleness window for refreshed resources.
pub const DEFAULT_STALE_WINDOW: Duration = Duration::from_secs(3600);

/// Tracks the last refresh time of keyed resources.
///
/// A key that has never been refreshed is never fresh.
pub struct FreshnessTracker {
    refreshed: DashMap<String, DateTime<Utc>>,
    stale_window: chrono::Duration,
}

impl FreshnessTracker {
    /// Creates a tracker with the given staleness window.
    #[must_use]
    pub fn new(stale_window: Duration) -> Self {
        Self {
            refreshed: DashMap::new(),
            stale_window: chrono::Duration::from_std(stale_window)
                .unwrap_or(chrono::Duration::MAX),
        }
    }

    /// Records that `key` was refreshed now.
    pub fn register_refresh(&self, key: impl Into<String>) {
        self.refreshed.insert(key.into(), Utc::now());
    }

    /// Returns whether `key` was refreshed within the staleness window.
    #[must_use]
    pub fn is_fresh(&self, key: &str) -> bool {
        self.refreshed
            .get(key)
            .is_some_and(|at| Utc::now() - *at < self.stale_window)
    }

    /// Forgets the refresh record for `key`.
    pub fn invalidate(&self, key: &str) {
        self.refreshed.remove(key);
    }
}

impl Default for FreshnessTracker {
    fn default() -> Self {
        Self::new(DEFAULT_STALE_WINDOW)
    }
}
