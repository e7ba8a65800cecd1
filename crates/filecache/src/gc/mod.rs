//! Garbage collection of expired cache entries
//!
//! A collector is attached to a cache instance and notified when the
//! instance is created and after each operation. What a notification does is
//! up to the collector:
//!
//! - [`NopGc`] never collects
//! - [`ProbabilityGc`] sweeps with probability `1/divisor` per notification
//! - [`IntervalGc`] sweeps periodically in a background task
//!
//! A sweep walks the cache root with an expired-only [`Scanner`] and removes
//! every entry it reports that is still unchanged on disk, then reclaims temp
//! files of interrupted writes. Sweep failures are logged and never reach the
//! cache's callers.

mod interval;
mod nop;
mod probability;

pub use interval::IntervalGc;
pub use nop::NopGc;
pub use probability::{decide_to_run, ProbabilityGc};

use crate::errors::{CacheError, CancelReason, Result};
use crate::files;
use crate::meta::Metadata;
use crate::paths;
use crate::scanner::{ScanEntry, Scanner};
use async_trait::async_trait;
use std::fmt::Debug;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use walkdir::WalkDir;

/// Default divisor of the probabilistic collector's instance hook
pub const DEFAULT_ON_INIT_DIVISOR: u32 = 1;

/// Default divisor of the probabilistic collector's operation hook
pub const DEFAULT_ON_OPERATION_DIVISOR: u32 = 100;

/// Trigger policy for expired entry sweeps
#[async_trait]
pub trait GarbageCollector: Send + Sync + Debug {
    /// Called once when a cache instance using this collector is created
    async fn on_instance_init(&self);

    /// Called after every cache operation; must not block
    fn on_operation(&self);

    /// Stop collecting and wait for running sweeps to finish
    async fn close(&self) -> Result<()>;
}

/// The collector a cache uses when none is configured
pub fn default_gc(dir: impl Into<PathBuf>) -> ProbabilityGc {
    ProbabilityGc::new(dir, DEFAULT_ON_INIT_DIVISOR, DEFAULT_ON_OPERATION_DIVISOR)
}

/// Temp files of interrupted writes older than this are reclaimed by sweeps
pub const STALE_TEMP_AGE: Duration = Duration::from_secs(60 * 60);

/// Remove every expired entry under `dir`, stopping early on `shutdown`.
///
/// Returns the number of entries removed. Blocking.
pub(crate) fn sweep(dir: &Path, shutdown: &CancellationToken) -> Result<usize> {
    let mut removed = 0;
    Scanner::expired(dir).scan(|entry| {
        if shutdown.is_cancelled() {
            return Err(CacheError::cancelled("gc sweep", CancelReason::Cancelled));
        }
        if discard_if_unchanged(&entry) {
            tracing::debug!("Removed expired cache entry {:?}", entry.key);
            removed += 1;
        }
        Ok(())
    })?;
    Ok(removed)
}

/// Remove a scanned entry unless it was rewritten since the scan saw it
fn discard_if_unchanged(entry: &ScanEntry) -> bool {
    match Metadata::load_blocking(entry.metadata_path()) {
        Some(meta) if meta.created_at == entry.created_at && meta.is_expired() => {
            files::discard_entry_files_blocking(&entry.paths)
        }
        Some(_) => {
            tracing::debug!("Keeping cache entry {:?} rewritten during sweep", entry.key);
            false
        }
        None => false,
    }
}

/// Remove temp files left by writes that never finished.
///
/// Only files last modified more than `max_age` ago are touched, so writes
/// still in flight keep theirs. Blocking.
pub(crate) fn remove_stale_temp_files(
    dir: &Path,
    max_age: Duration,
    shutdown: &CancellationToken,
) -> Result<usize> {
    let mut removed = 0;
    for item in WalkDir::new(dir).into_iter().filter_map(|item| item.ok()) {
        if shutdown.is_cancelled() {
            return Err(CacheError::cancelled("gc sweep", CancelReason::Cancelled));
        }
        if !item.file_type().is_file() || !paths::is_temp_path(item.path()) {
            continue;
        }

        let age = item
            .metadata()
            .ok()
            .and_then(|meta| meta.modified().ok())
            .and_then(|modified| modified.elapsed().ok());
        if !age.is_some_and(|age| age > max_age) {
            continue;
        }

        match std::fs::remove_file(item.path()) {
            Ok(()) => removed += 1,
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!("Failed to remove stale temp file {}: {}", item.path().display(), e);
            }
        }
    }
    Ok(removed)
}

/// Run one sweep on the blocking pool and log its outcome
pub(crate) async fn run_sweep(dir: PathBuf, shutdown: CancellationToken, trigger: &'static str) {
    let path = dir.clone();
    let task = tokio::task::spawn_blocking(move || {
        let removed = sweep(&dir, &shutdown)?;
        let stale = remove_stale_temp_files(&dir, STALE_TEMP_AGE, &shutdown)?;
        Ok::<_, CacheError>((removed, stale))
    });

    match task.await {
        Ok(Ok((0, 0))) => {}
        Ok(Ok((removed, stale))) => {
            tracing::info!(
                "GC ({}) removed {} expired entries and {} stale temp files from {}",
                trigger,
                removed,
                stale,
                path.display()
            );
        }
        Ok(Err(e)) if e.is_cancellation() => {
            tracing::debug!("GC ({}) sweep of {} stopped by shutdown", trigger, path.display());
        }
        Ok(Err(e)) => {
            tracing::warn!("GC ({}) sweep of {} failed: {}", trigger, path.display(), e);
        }
        Err(e) => {
            tracing::warn!("GC ({}) sweep task failed: {}", trigger, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{ItemOptions, Ttl};
    use crate::paths::{temp_path, EntryPaths};
    use std::time::SystemTime;
    use tempfile::TempDir;
    use uuid::Uuid;

    pub(crate) fn put_expired(dir: &Path, name: &str) -> EntryPaths {
        let paths = EntryPaths::from_content(dir.join(name));
        std::fs::write(&paths.content, b"stale").unwrap();
        let mut meta = Metadata::new(
            name,
            ItemOptions::new().with_ttl(Duration::from_secs(1)),
            Ttl::Eternal,
        );
        meta.created_at -= chrono::Duration::hours(1);
        std::fs::write(&paths.metadata, meta.encode().unwrap()).unwrap();
        paths
    }

    #[test]
    fn test_sweep_removes_expired_only() {
        let temp_dir = TempDir::new().unwrap();
        let expired = put_expired(temp_dir.path(), "old");

        let fresh = EntryPaths::from_content(temp_dir.path().join("new"));
        std::fs::write(&fresh.content, b"fresh").unwrap();
        let meta = Metadata::new("new", ItemOptions::new(), Ttl::Eternal);
        std::fs::write(&fresh.metadata, meta.encode().unwrap()).unwrap();

        let removed = sweep(temp_dir.path(), &CancellationToken::new()).unwrap();

        assert_eq!(removed, 1);
        assert!(!expired.content.exists());
        assert!(!expired.metadata.exists());
        assert!(fresh.content.exists());
        assert!(fresh.metadata.exists());
    }

    #[test]
    fn test_sweep_stops_on_shutdown() {
        let temp_dir = TempDir::new().unwrap();
        let expired = put_expired(temp_dir.path(), "old");

        let shutdown = CancellationToken::new();
        shutdown.cancel();
        let err = sweep(temp_dir.path(), &shutdown).unwrap_err();

        assert!(err.is_cancellation());
        assert!(expired.content.exists());
    }

    #[test]
    fn test_rewritten_entry_survives_sweep() {
        let temp_dir = TempDir::new().unwrap();
        let paths = put_expired(temp_dir.path(), "old");
        let scanned = Scanner::expired(temp_dir.path()).collect().unwrap();
        assert_eq!(scanned.len(), 1);

        // A writer publishes the same key after the scan saw it.
        let fresh = Metadata::new("old", ItemOptions::new(), Ttl::Eternal);
        std::fs::write(&paths.metadata, fresh.encode().unwrap()).unwrap();

        assert!(!discard_if_unchanged(&scanned[0]));
        assert!(paths.content.exists());
        assert!(paths.metadata.exists());
    }

    #[test]
    fn test_stale_temp_files_are_reclaimed() {
        let temp_dir = TempDir::new().unwrap();
        let entry = put_expired(temp_dir.path(), "kept");
        std::fs::remove_file(&entry.metadata).unwrap();

        let stale = temp_path(&entry.content, Uuid::new_v4());
        let file = std::fs::File::create(&stale).unwrap();
        file.set_modified(SystemTime::now() - Duration::from_secs(2 * 3600))
            .unwrap();
        drop(file);
        let in_flight = temp_path(&entry.content, Uuid::new_v4());
        std::fs::write(&in_flight, b"partial").unwrap();

        let removed =
            remove_stale_temp_files(temp_dir.path(), STALE_TEMP_AGE, &CancellationToken::new())
                .unwrap();

        assert_eq!(removed, 1);
        assert!(!stale.exists());
        assert!(in_flight.exists());
        assert!(entry.content.exists());
    }
}
