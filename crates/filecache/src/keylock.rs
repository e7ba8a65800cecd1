//! Per-key mutual exclusion

use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Registry of per-key locks owned by a cache instance.
///
/// Locks are created on first use and kept for the lifetime of the
/// registry. Different keys never contend with each other.
#[derive(Default)]
pub struct KeyLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

/// Exclusive access to one key; dropping the guard unlocks the key
#[must_use = "the key is unlocked as soon as the guard is dropped"]
pub struct KeyGuard {
    _guard: OwnedMutexGuard<()>,
}

impl KeyLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until `key` is free and lock it
    pub async fn lock(&self, key: &str) -> KeyGuard {
        let lock = self.entry(key);
        KeyGuard {
            _guard: lock.lock_owned().await,
        }
    }

    /// Lock `key` only if it is free right now
    pub fn try_lock(&self, key: &str) -> Option<KeyGuard> {
        let lock = self.entry(key);
        lock.try_lock_owned()
            .ok()
            .map(|guard| KeyGuard { _guard: guard })
    }

    /// Number of keys ever locked through this registry
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }

    fn entry(&self, key: &str) -> Arc<Mutex<()>> {
        // The shard lock is released before awaiting the key lock.
        if let Some(lock) = self.locks.get(key) {
            return Arc::clone(lock.value());
        }
        Arc::clone(self.locks.entry(key.to_string()).or_default().value())
    }
}

impl fmt::Debug for KeyLocks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyLocks")
            .field("keys", &self.locks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_key_is_exclusive() {
        let locks = KeyLocks::new();
        let guard = locks.lock("a").await;

        assert!(locks.try_lock("a").is_none());
        drop(guard);
        assert!(locks.try_lock("a").is_some());
        assert_eq!(locks.len(), 1);
    }

    #[tokio::test]
    async fn test_different_keys_are_independent() {
        let locks = KeyLocks::new();
        let _a = locks.lock("a").await;
        let _b = locks.lock("b").await;

        assert!(locks.try_lock("c").is_some());
        assert_eq!(locks.len(), 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_serializes_critical_sections() {
        let locks = Arc::new(KeyLocks::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_inside = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let locks = Arc::clone(&locks);
            let inside = Arc::clone(&inside);
            let max_inside = Arc::clone(&max_inside);
            handles.push(tokio::spawn(async move {
                let _guard = locks.lock("shared").await;
                let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                max_inside.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(2)).await;
                inside.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
    }
}
