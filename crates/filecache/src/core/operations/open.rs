//! Open and read operations

use crate::context::Context;
use crate::errors::{CacheError, Result};
use crate::files;
use crate::meta::Metadata;
use crate::paths::EntryPaths;
use crate::result::{OpenResult, ReadResult};
use std::io::ErrorKind;
use tokio::fs;

use super::super::types::DiskCache;

impl DiskCache {
    /// Open the item stored under `key` for streaming reads.
    ///
    /// Invalid and expired items are removed and reported as a miss.
    pub async fn open(&self, ctx: &Context, key: &str) -> Result<OpenResult> {
        let guard = self.acquire(ctx, key, "open").await?;
        let paths = self.entry_paths(key);
        let result = self.open_locked(key, &paths).await;
        self.operation_done(guard);

        Ok(match result? {
            Some((file, meta)) => OpenResult::found(Box::new(file), meta.to_options()),
            None => OpenResult::miss(),
        })
    }

    /// Read the whole item stored under `key` into memory.
    ///
    /// An item that cannot be read to the end is invalidated.
    pub async fn read(&self, ctx: &Context, key: &str) -> Result<ReadResult> {
        let guard = self.acquire(ctx, key, "read").await?;
        let paths = self.entry_paths(key);
        let result = self.read_locked(ctx, key, &paths).await;
        self.operation_done(guard);
        result
    }

    /// Read `key` while its lock is held; a failed drain invalidates the entry
    pub(crate) async fn read_locked(
        &self,
        ctx: &Context,
        key: &str,
        paths: &EntryPaths,
    ) -> Result<ReadResult> {
        let Some((mut file, meta)) = self.open_locked(key, paths).await? else {
            return Ok(ReadResult::miss());
        };

        match files::read_all_with_context(ctx, &mut file, &paths.content).await {
            Ok(data) => Ok(ReadResult::found(data, Some(meta.to_options()))),
            Err(e) => {
                drop(file);
                tracing::debug!("Invalidating unreadable cache entry {:?}: {}", key, e);
                files::discard_entry_files(paths).await;
                Err(e)
            }
        }
    }

    /// Validate the entry and open its content file.
    ///
    /// `None` is a miss.
    async fn open_locked(&self, key: &str, paths: &EntryPaths) -> Result<Option<(fs::File, Metadata)>> {
        let Some(meta) = self.lookup(key, paths).await else {
            return Ok(None);
        };

        match fs::File::open(&paths.content).await {
            Ok(file) => {
                tracing::debug!("Cache hit for key {:?}", key);
                Ok(Some((file, meta)))
            }
            // Removed concurrently by a collector sweep.
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("Cache miss for key {:?}", key);
                Ok(None)
            }
            Err(e) => Err(CacheError::io(&paths.content, "open cache data file", e)),
        }
    }

    /// Decode the entry's metadata, removing the entry if it is incomplete,
    /// corrupt or expired
    async fn lookup(&self, key: &str, paths: &EntryPaths) -> Option<Metadata> {
        if !files::entry_files_valid(paths).await {
            tracing::debug!("Cache miss for key {:?}", key);
            files::discard_entry_files(paths).await;
            return None;
        }

        let Some(meta) = Metadata::load(&paths.metadata).await else {
            tracing::debug!("Removing cache entry with invalid metadata for key {:?}", key);
            files::discard_entry_files(paths).await;
            return None;
        };

        if meta.key != key {
            tracing::debug!(
                "Cache miss for key {:?}: path is held by key {:?}",
                key,
                meta.key
            );
            return None;
        }

        if meta.is_expired() {
            tracing::debug!("Removing expired cache entry for key {:?}", key);
            files::discard_entry_files(paths).await;
            return None;
        }

        Some(meta)
    }
}
