//! Cache trait definitions

use crate::context::Context;
use crate::errors::Result;
use crate::options::ItemOptions;
use crate::result::{OpenResult, ReadResult};
use async_trait::async_trait;
use std::path::Path;
use tokio::io::AsyncRead;

/// A file-backed key/value cache.
///
/// Every operation first checks `ctx` and fails with a cancellation error
/// when it is already done. Operations on one key are serialized; operations
/// on different keys run in parallel. A missing, expired or corrupt item is
/// reported as a miss, never as an error.
#[async_trait]
pub trait FileCache: Send + Sync {
    /// Absolute path of the cache root
    fn path(&self) -> &Path;

    /// Store everything `source` yields under `key`, replacing any previous item.
    ///
    /// Returns the number of bytes written. On failure nothing is left behind.
    async fn write(
        &self,
        ctx: &Context,
        key: &str,
        source: &mut (dyn AsyncRead + Send + Unpin),
        options: ItemOptions,
    ) -> Result<u64>;

    /// Store `data` under `key`
    async fn write_data(
        &self,
        ctx: &Context,
        key: &str,
        data: &[u8],
        options: ItemOptions,
    ) -> Result<u64> {
        let mut source = data;
        self.write(ctx, key, &mut source, options).await
    }

    /// Open the item for streaming reads
    async fn open(&self, ctx: &Context, key: &str) -> Result<OpenResult>;

    /// Read the whole item into memory
    async fn read(&self, ctx: &Context, key: &str) -> Result<ReadResult>;

    /// Remove the item; removing an absent item succeeds
    async fn invalidate(&self, ctx: &Context, key: &str) -> Result<()>;

    /// Release background resources held by the cache
    async fn close(&self) -> Result<()>;
}
