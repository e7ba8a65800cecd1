use crate::context::Context;
use crate::errors::Result;
use crate::options::ItemOptions;
use crate::result::{OpenResult, ReadResult};
use crate::traits::FileCache;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::io::AsyncRead;

/// Cache that stores nothing and reports every lookup as an empty hit.
///
/// Useful to switch caching off without changing call sites.
#[derive(Debug, Clone)]
pub struct NopCache {
    path: PathBuf,
}

impl NopCache {
    pub fn new() -> Self {
        Self {
            path: std::env::temp_dir(),
        }
    }
}

impl Default for NopCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FileCache for NopCache {
    fn path(&self) -> &Path {
        &self.path
    }

    async fn write(
        &self,
        _ctx: &Context,
        _key: &str,
        _source: &mut (dyn AsyncRead + Send + Unpin),
        _options: ItemOptions,
    ) -> Result<u64> {
        Ok(0)
    }

    async fn open(&self, _ctx: &Context, _key: &str) -> Result<OpenResult> {
        Ok(OpenResult::found(
            Box::new(tokio::io::empty()),
            ItemOptions::default(),
        ))
    }

    async fn read(&self, _ctx: &Context, _key: &str) -> Result<ReadResult> {
        Ok(ReadResult::found(Vec::new(), Some(ItemOptions::default())))
    }

    async fn invalidate(&self, _ctx: &Context, _key: &str) -> Result<()> {
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
