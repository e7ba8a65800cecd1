//! FileCache implementation for DiskCache

use crate::context::Context;
use crate::errors::Result;
use crate::options::ItemOptions;
use crate::result::{OpenResult, ReadResult};
use crate::traits::FileCache;
use async_trait::async_trait;
use std::path::Path;
use tokio::io::AsyncRead;

use super::types::DiskCache;

#[async_trait]
impl FileCache for DiskCache {
    fn path(&self) -> &Path {
        self.path()
    }

    async fn write(
        &self,
        ctx: &Context,
        key: &str,
        source: &mut (dyn AsyncRead + Send + Unpin),
        options: ItemOptions,
    ) -> Result<u64> {
        self.write(ctx, key, source, options).await
    }

    async fn write_data(
        &self,
        ctx: &Context,
        key: &str,
        data: &[u8],
        options: ItemOptions,
    ) -> Result<u64> {
        self.write_data(ctx, key, data, options).await
    }

    async fn open(&self, ctx: &Context, key: &str) -> Result<OpenResult> {
        self.open(ctx, key).await
    }

    async fn read(&self, ctx: &Context, key: &str) -> Result<ReadResult> {
        self.read(ctx, key).await
    }

    async fn invalidate(&self, ctx: &Context, key: &str) -> Result<()> {
        self.invalidate(ctx, key).await
    }

    async fn close(&self) -> Result<()> {
        self.close().await
    }
}
