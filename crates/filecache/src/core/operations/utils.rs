//! Shared utilities for cache operations

use crate::context::Context;
use crate::errors::{CacheError, RecoveryHint, Result};
use crate::keylock::KeyGuard;
use crate::paths::EntryPaths;

use super::super::types::DiskCache;

impl DiskCache {
    /// Check the context, then wait for the key lock.
    ///
    /// Waiting is abandoned as soon as the context is done.
    pub(super) async fn acquire(
        &self,
        ctx: &Context,
        key: &str,
        operation: &'static str,
    ) -> Result<KeyGuard> {
        ctx.check(operation)?;

        tokio::select! {
            biased;
            reason = ctx.done() => Err(CacheError::cancelled(operation, reason)),
            guard = self.inner.locks.lock(key) => Ok(guard),
        }
    }

    /// Notify the collector once an operation released its key lock
    pub(super) fn operation_done(&self, guard: KeyGuard) {
        drop(guard);
        self.inner.gc.on_operation();
    }

    /// Content and metadata paths of `key`
    pub(crate) fn entry_paths(&self, key: &str) -> EntryPaths {
        EntryPaths::resolve(&self.inner.root, self.inner.path_generator.as_ref(), key)
    }
}

/// Reject keys that cannot be stored; an empty key never decodes back
pub(super) fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CacheError::InvalidKey {
            key: String::new(),
            reason: "key must not be empty".to_string(),
            recovery_hint: RecoveryHint::Manual {
                instructions: "Use a non-empty cache key".to_string(),
            },
        });
    }
    Ok(())
}
