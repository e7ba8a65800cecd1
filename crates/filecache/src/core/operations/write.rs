//! Write operation

use crate::context::Context;
use crate::errors::{CacheError, Result};
use crate::files;
use crate::meta::Metadata;
use crate::options::ItemOptions;
use crate::paths::{temp_path, EntryPaths};
use tokio::fs;
use tokio::io::{AsyncRead, AsyncWriteExt};
use uuid::Uuid;

use super::super::types::DiskCache;
use super::utils::validate_key;

impl DiskCache {
    /// Store everything `source` yields under `key`.
    ///
    /// Returns the number of content bytes written. On any failure, including
    /// cancellation mid-copy, no file of the item is left behind.
    pub async fn write<R>(
        &self,
        ctx: &Context,
        key: &str,
        source: &mut R,
        options: ItemOptions,
    ) -> Result<u64>
    where
        R: AsyncRead + Send + Unpin + ?Sized,
    {
        ctx.check("write")?;
        validate_key(key)?;
        let guard = self.acquire(ctx, key, "write").await?;
        let result = self.write_locked(ctx, key, source, options).await;
        self.operation_done(guard);
        result
    }

    /// Store `data` under `key`
    pub async fn write_data(
        &self,
        ctx: &Context,
        key: &str,
        data: &[u8],
        options: ItemOptions,
    ) -> Result<u64> {
        let mut source = data;
        self.write(ctx, key, &mut source, options).await
    }

    async fn write_locked<R>(
        &self,
        ctx: &Context,
        key: &str,
        source: &mut R,
        options: ItemOptions,
    ) -> Result<u64>
    where
        R: AsyncRead + Send + Unpin + ?Sized,
    {
        let paths = self.entry_paths(key);
        let meta = Metadata::new(key, options, self.inner.default_ttl);
        let meta_bytes = meta.encode()?;

        let id = Uuid::new_v4();
        let temp = EntryPaths {
            content: temp_path(&paths.content, id),
            metadata: temp_path(&paths.metadata, id),
        };

        match self.publish(ctx, source, &paths, &temp, &meta_bytes).await {
            Ok(written) => {
                tracing::debug!("Cache write for key {:?}: {} bytes", key, written);
                Ok(written)
            }
            Err(e) => {
                for path in [&temp.content, &temp.metadata] {
                    if let Err(cleanup) = files::remove_file(path, "remove temp file").await {
                        tracing::warn!("Failed to clean up temp file: {}", cleanup);
                    }
                }
                files::discard_entry_files(&paths).await;
                Err(e)
            }
        }
    }

    /// Write both files under temporary names, then rename them into place:
    /// content first, metadata last.
    async fn publish<R>(
        &self,
        ctx: &Context,
        source: &mut R,
        paths: &EntryPaths,
        temp: &EntryPaths,
        meta_bytes: &[u8],
    ) -> Result<u64>
    where
        R: AsyncRead + Send + Unpin + ?Sized,
    {
        if let Some(parent) = paths.parent() {
            files::create_dirs(parent).await?;
        }

        let mut meta_file = files::create_file(&temp.metadata).await?;
        meta_file
            .write_all(meta_bytes)
            .await
            .map_err(|e| CacheError::io(&temp.metadata, "write metadata file", e))?;
        meta_file
            .flush()
            .await
            .map_err(|e| CacheError::io(&temp.metadata, "flush metadata file", e))?;
        drop(meta_file);

        let mut content_file = files::create_file(&temp.content).await?;
        let written = files::copy_with_context(ctx, source, &mut content_file, &temp.content).await?;
        drop(content_file);

        ctx.check("write")?;

        // Old metadata must not outlive the content it describes.
        files::remove_file(&paths.metadata, "remove metadata file").await?;
        fs::rename(&temp.content, &paths.content)
            .await
            .map_err(|e| CacheError::io(&paths.content, "publish cache data file", e))?;
        fs::rename(&temp.metadata, &paths.metadata)
            .await
            .map_err(|e| CacheError::io(&paths.metadata, "publish metadata file", e))?;

        Ok(written)
    }
}
