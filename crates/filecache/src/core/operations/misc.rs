//! Instance-level accessors and shutdown

use crate::errors::Result;
use crate::options::Ttl;
use std::path::Path;

use super::super::types::DiskCache;

impl DiskCache {
    /// Absolute path of the cache root
    pub fn path(&self) -> &Path {
        &self.inner.root
    }

    /// TTL applied to items written without one
    pub fn default_ttl(&self) -> Ttl {
        self.inner.default_ttl
    }

    /// Stop the garbage collector and wait for running sweeps
    pub async fn close(&self) -> Result<()> {
        self.inner.gc.close().await
    }
}
