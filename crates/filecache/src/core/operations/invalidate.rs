//! Invalidate operation

use crate::context::Context;
use crate::errors::Result;
use crate::files;

use super::super::types::DiskCache;

impl DiskCache {
    /// Remove the item stored under `key`.
    ///
    /// Missing files are not an error. Both files are always attempted.
    pub async fn invalidate(&self, ctx: &Context, key: &str) -> Result<()> {
        let guard = self.acquire(ctx, key, "invalidate").await?;
        let result = files::remove_entry_files(&self.entry_paths(key)).await;
        self.operation_done(guard);

        if result.is_ok() {
            tracing::debug!("Invalidated cache entry for key {:?}", key);
        }
        result
    }
}
