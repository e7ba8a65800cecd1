//! Core cache types and structures

use crate::gc::GarbageCollector;
use crate::keylock::KeyLocks;
use crate::options::Ttl;
use crate::paths::PathGenerator;
use std::path::PathBuf;
use std::sync::Arc;

/// Cache persisting items as file pairs under a root directory.
///
/// Each item is a content file plus a `--meta` sidecar holding its key,
/// creation time, TTL and auxiliary fields. Cloning is cheap; clones share
/// the same key locks and garbage collector.
#[derive(Clone)]
pub struct DiskCache {
    pub(super) inner: Arc<CacheInner>,
}

pub(super) struct CacheInner {
    /// Absolute cache root
    pub root: PathBuf,
    /// Key to relative content path mapping
    pub path_generator: Arc<dyn PathGenerator>,
    /// TTL of items written without one
    pub default_ttl: Ttl,
    /// Expired item collector
    pub gc: Arc<dyn GarbageCollector>,
    /// Per-key locks serializing operations on one key
    pub locks: KeyLocks,
}

impl std::fmt::Debug for DiskCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiskCache")
            .field("root", &self.inner.root)
            .field("default_ttl", &self.inner.default_ttl)
            .field("gc", &self.inner.gc)
            .field("locks", &self.inner.locks)
            .finish()
    }
}
