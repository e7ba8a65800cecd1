
use crate::core::DiskCache;
use crate::gc::NopGc;
use crate::options::InstanceOptions;
use std::path::Path;
use std::sync::Arc;

/// Cache rooted at `dir` that never collects in the background
async fn quiet_cache(dir: &Path) -> DiskCache {
    DiskCache::new(dir, vec![InstanceOptions::new().with_gc(Arc::new(NopGc))])
        .await
        .unwrap()
}
