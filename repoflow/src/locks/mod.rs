//! Per-key advisory locking with notify-based waiting.
//!
//! The registry provides mutual exclusion between concurrent tasks working
//! on the same string key (a repository or datasource key). Waiting is
//! wakeup-driven via [`tokio::sync::Notify`] rather than polling; a waiter
//! never proceeds while its key is still locked.
//!
//! A safety-release timer bounds how long a crashed holder can starve
//! waiters: if a lock is still held when the timer fires, it is
//! force-released and a warning is emitted. Callers must not rely on the
//! timer for release; [`try_lock`](LockRegistry::try_lock) returns a
//! [`LockGuard`] that releases on every exit path.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tracing::{debug, warn};

/// Default safety-release timeout for held locks.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(60);

struct LockEntry {
    holder: String,
    acquired_at: DateTime<Utc>,
    generation: u64,
}

struct Inner {
    entries: Mutex<HashMap<String, LockEntry>>,
    waiters: Mutex<HashMap<String, Arc<Notify>>>,
    next_generation: AtomicU64,
    timeout: Duration,
}

impl Inner {
    fn notify_waiters(&self, key: &str) {
        if let Some(notify) = self.waiters.lock().get(key) {
            notify.notify_waiters();
        }
    }

    /// Force-releases `key` if it is still held by the acquisition
    /// identified by `generation`.
    fn force_release(&self, key: &str, generation: u64) {
        let removed = {
            let mut entries = self.entries.lock();
            match entries.get(key) {
                Some(entry) if entry.generation == generation => entries.remove(key),
                _ => None,
            }
        };
        if let Some(entry) = removed {
            warn!(
                key = %key,
                holder = %entry.holder,
                acquired_at = %entry.acquired_at,
                "lock held past safety timeout, force-releasing"
            );
            self.notify_waiters(key);
        }
    }
}

/// Registry of per-key advisory locks.
///
/// Cheap to clone; clones share the same lock state. Locking spawns the
/// safety-release timer on the current Tokio runtime, so acquisition must
/// happen inside one.
#[derive(Clone)]
pub struct LockRegistry {
    inner: Arc<Inner>,
}

impl LockRegistry {
    /// Creates a registry with the given safety-release timeout.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                entries: Mutex::new(HashMap::new()),
                waiters: Mutex::new(HashMap::new()),
                next_generation: AtomicU64::new(0),
                timeout,
            }),
        }
    }

    /// Returns whether `key` is currently locked.
    #[must_use]
    pub fn is_locked(&self, key: &str) -> bool {
        self.inner.entries.lock().contains_key(key)
    }

    /// Acquires `key` unconditionally.
    ///
    /// Overwrites any existing holder; callers coordinating with other
    /// tasks should use [`try_lock`](Self::try_lock) instead, which makes
    /// the check-and-acquire atomic.
    pub fn lock(&self, key: impl Into<String>, holder: impl Into<String>) {
        let key = key.into();
        let generation = self.insert_entry(&key, holder.into());
        self.spawn_safety_release(key, generation);
    }

    /// Atomically acquires `key` if it is free.
    ///
    /// Returns a [`LockGuard`] that releases the key when dropped, or
    /// `None` if the key is already held.
    #[must_use]
    pub fn try_lock(&self, key: &str, holder: impl Into<String>) -> Option<LockGuard> {
        let generation = {
            let mut entries = self.inner.entries.lock();
            if entries.contains_key(key) {
                return None;
            }
            let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);
            entries.insert(
                key.to_string(),
                LockEntry {
                    holder: holder.into(),
                    acquired_at: Utc::now(),
                    generation,
                },
            );
            generation
        };
        debug!(key = %key, "lock acquired");
        self.spawn_safety_release(key.to_string(), generation);
        Some(LockGuard {
            registry: self.clone(),
            key: key.to_string(),
        })
    }

    /// Releases `key` and wakes every waiter.
    ///
    /// Releasing an unheld key is a no-op.
    pub fn unlock(&self, key: &str) {
        let removed = self.inner.entries.lock().remove(key);
        if removed.is_some() {
            debug!(key = %key, "lock released");
            self.inner.notify_waiters(key);
        }
    }

    /// Waits until `key` is unlocked.
    ///
    /// Resolves immediately for keys that are not locked. After resuming,
    /// the key is known to have been free at some instant; callers that
    /// need to take it must still go through [`try_lock`](Self::try_lock).
    pub async fn wait_for_unlock(&self, key: &str) {
        let notify = {
            let mut waiters = self.inner.waiters.lock();
            Arc::clone(waiters.entry(key.to_string()).or_default())
        };
        loop {
            let notified = notify.notified();
            tokio::pin!(notified);
            // Register interest before re-checking so an unlock between the
            // check and the await cannot be missed.
            notified.as_mut().enable();
            if !self.is_locked(key) {
                return;
            }
            notified.await;
        }
    }

    fn insert_entry(&self, key: &str, holder: String) -> u64 {
        let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);
        self.inner.entries.lock().insert(
            key.to_string(),
            LockEntry {
                holder,
                acquired_at: Utc::now(),
                generation,
            },
        );
        debug!(key = %key, "lock acquired");
        generation
    }

    fn spawn_safety_release(&self, key: String, generation: u64) {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            tokio::time::sleep(inner.timeout).await;
            inner.force_release(&key, generation);
        });
    }
}

impl Default for LockRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_LOCK_TIMEOUT)
    }
}

impl std::fmt::Debug for LockRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockRegistry")
            .field("held", &self.inner.entries.lock().len())
            .finish()
    }
}

/// RAII guard for a held lock.
///
/// Dropping the guard releases the key, on success and failure paths
/// alike.
#[must_use = "dropping the guard releases the lock"]
pub struct LockGuard {
    registry: LockRegistry,
    key: String,
}

impl LockGuard {
    /// The locked key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        self.registry.unlock(&self.key);
    }
}

impl std::fmt::Debug for LockGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockGuard").field("key", &self.key).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_is_locked_reflects_lock_unlock() {
        let registry = LockRegistry::default();

        assert!(!registry.is_locked("k"));
        registry.lock("k", "t1");
        assert!(registry.is_locked("k"));
        registry.unlock("k");
        assert!(!registry.is_locked("k"));
    }

    #[tokio::test]
    async fn test_wait_resolves_immediately_for_unlocked_key() {
        let registry = LockRegistry::default();

        timeout(Duration::from_millis(50), registry.wait_for_unlock("never"))
            .await
            .expect("wait on an unlocked key must not block");
    }

    #[tokio::test]
    async fn test_waiter_blocks_until_unlock() {
        let registry = LockRegistry::default();
        registry.lock("k", "t1");

        let released = Arc::new(AtomicBool::new(false));
        let waiter = {
            let registry = registry.clone();
            let released = Arc::clone(&released);
            tokio::spawn(async move {
                registry.wait_for_unlock("k").await;
                assert!(released.load(Ordering::SeqCst), "waiter resumed while locked");
            })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        released.store(true, Ordering::SeqCst);
        registry.unlock("k");

        timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter must resume after unlock")
            .expect("waiter panicked");
    }

    #[tokio::test]
    async fn test_try_lock_excludes_second_holder() {
        let registry = LockRegistry::default();

        let guard = registry.try_lock("k", "t1").expect("free key");
        assert!(registry.try_lock("k", "t2").is_none());

        drop(guard);
        assert!(!registry.is_locked("k"));
        assert!(registry.try_lock("k", "t2").is_some());
    }

    #[tokio::test]
    async fn test_guard_releases_on_drop() {
        let registry = LockRegistry::default();
        {
            let _guard = registry.try_lock("k", "t1").expect("free key");
            assert!(registry.is_locked("k"));
        }
        assert!(!registry.is_locked("k"));
    }

    #[tokio::test]
    async fn test_safety_timeout_force_releases() {
        let registry = LockRegistry::new(Duration::from_millis(20));
        registry.lock("k", "crashed-holder");

        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(!registry.is_locked("k"));
    }

    #[tokio::test]
    async fn test_safety_timeout_ignores_reacquired_key() {
        let registry = LockRegistry::new(Duration::from_millis(50));

        let guard = registry.try_lock("k", "t1").expect("free key");
        tokio::time::sleep(Duration::from_millis(30)).await;
        drop(guard);
        // Re-acquired before the first timer fires; the stale timer must
        // not release the new holder.
        let _guard = registry.try_lock("k", "t2").expect("free key");

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(registry.is_locked("k"));
    }

    #[tokio::test]
    async fn test_waiter_wakes_on_force_release() {
        let registry = LockRegistry::new(Duration::from_millis(20));
        registry.lock("k", "crashed-holder");

        timeout(Duration::from_secs(1), registry.wait_for_unlock("k"))
            .await
            .expect("force-release must wake waiters");
    }
}
