//! Cache construction

use crate::errors::{CacheError, Result};
use crate::files;
use crate::gc::{default_gc, GarbageCollector};
use crate::keylock::KeyLocks;
use crate::options::{InstanceOptions, Ttl};
use crate::paths::{default_path_generator, PathGenerator};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::types::{CacheInner, DiskCache};

/// Directory name used under the temp dir when no root is given
pub const DEFAULT_DIR_NAME: &str = "filecache";

impl DiskCache {
    /// Create a cache rooted at `dir`.
    ///
    /// An empty `dir` means `<temp dir>/filecache`. The directory is created
    /// when missing. At most one options bundle may be given.
    pub async fn new(dir: impl AsRef<Path>, options: Vec<InstanceOptions>) -> Result<Self> {
        if options.len() > 1 {
            return Err(CacheError::configuration(format!(
                "expected at most one options bundle, got {}",
                options.len()
            )));
        }
        let options = options.into_iter().next().unwrap_or_default();
        Self::with_options(dir.as_ref(), options).await
    }

    /// Create a cache rooted at `<temp dir>/filecache`
    pub async fn new_in_temp(options: Vec<InstanceOptions>) -> Result<Self> {
        Self::new("", options).await
    }

    /// Start building a cache
    pub fn builder() -> CacheBuilder {
        CacheBuilder::default()
    }

    async fn with_options(dir: &Path, options: InstanceOptions) -> Result<Self> {
        let root = resolve_root(dir)?;
        files::prepare_root(&root).await?;

        let gc: Arc<dyn GarbageCollector> = match options.gc {
            Some(gc) => gc,
            None => Arc::new(default_gc(&root)),
        };

        let inner = Arc::new(CacheInner {
            path_generator: options.path_generator.unwrap_or_else(default_path_generator),
            default_ttl: Ttl::or_default(options.default_ttl, Ttl::Eternal),
            gc,
            locks: KeyLocks::new(),
            root,
        });
        let cache = Self { inner };

        tracing::debug!("Cache initialized at {}", cache.inner.root.display());
        cache.inner.gc.on_instance_init().await;

        Ok(cache)
    }
}

/// Absolute cache root for `dir`; empty means `<temp dir>/filecache`
pub(crate) fn resolve_root(dir: &Path) -> Result<PathBuf> {
    let dir = if dir.as_os_str().is_empty() {
        std::env::temp_dir().join(DEFAULT_DIR_NAME)
    } else {
        dir.to_path_buf()
    };
    std::path::absolute(&dir).map_err(|e| {
        CacheError::configuration(format!("cannot resolve {}: {e}", dir.display()))
    })
}

/// Fluent construction of a [`DiskCache`]
#[derive(Debug, Default)]
pub struct CacheBuilder {
    dir: PathBuf,
    options: InstanceOptions,
}

impl CacheBuilder {
    /// Root directory; empty means `<temp dir>/filecache`
    #[must_use]
    pub fn dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = dir.into();
        self
    }

    #[must_use]
    pub fn path_generator(mut self, generator: impl PathGenerator + 'static) -> Self {
        self.options.path_generator = Some(Arc::new(generator));
        self
    }

    #[must_use]
    pub fn default_ttl(mut self, ttl: impl Into<Ttl>) -> Self {
        self.options.default_ttl = Some(ttl.into());
        self
    }

    #[must_use]
    pub fn gc(mut self, gc: Arc<dyn GarbageCollector>) -> Self {
        self.options.gc = Some(gc);
        self
    }

    pub async fn build(self) -> Result<DiskCache> {
        DiskCache::with_options(&self.dir, self.options).await
    }
}
