//! Time-bounded memoization cache.
//!
//! A generic key/value store with per-entry expiry. There is no LRU or
//! size bound: entries live until their TTL elapses or they are deleted
//! explicitly, which is all the single-flight acquisition protocol needs.

use dashmap::DashMap;
use std::time::{Duration, Instant};

struct CacheEntry<V> {
    value: V,
    created_at: Instant,
    ttl: Duration,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self) -> bool {
        self.created_at.elapsed() >= self.ttl
    }
}

/// A concurrent key/value cache with per-entry time-to-live.
///
/// Keys are strings of the form `owner/name/datasource`; the prefix
/// structure is what [`keys`](TtlCache::keys) filters on during cleanup.
pub struct TtlCache<V> {
    entries: DashMap<String, CacheEntry<V>>,
}

impl<V: Clone> TtlCache<V> {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Inserts or overwrites an entry, scheduling expiry `ttl` from now.
    pub fn store(&self, key: impl Into<String>, value: V, ttl: Duration) {
        self.entries.insert(
            key.into(),
            CacheEntry {
                value,
                created_at: Instant::now(),
                ttl,
            },
        );
    }

    /// Returns the value for `key`, or `None` if missing or expired.
    ///
    /// Expired entries are pruned on access.
    pub fn load(&self, key: &str) -> Option<V> {
        if let Some(entry) = self.entries.get(key) {
            if !entry.is_expired() {
                return Some(entry.value.clone());
            }
            // Expired
            drop(entry);
            self.entries.remove(key);
        }
        None
    }

    /// Returns whether a live (non-expired) entry exists for `key`.
    ///
    /// Pure check: never mutates the cache.
    #[must_use]
    pub fn exists(&self, key: &str) -> bool {
        self.entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired())
    }

    /// Removes the entry for `key`, if any.
    pub fn delete(&self, key: &str) {
        self.entries.remove(key);
    }

    /// Lists the keys of live entries, optionally restricted to a prefix.
    pub fn keys(&self, prefix: Option<&str>) -> Vec<String> {
        self.entries
            .iter()
            .filter(|entry| !entry.is_expired())
            .filter(|entry| prefix.map_or(true, |p| entry.key().starts_with(p)))
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}
