//! Persistent file-backed cache
//!
//! This crate stores arbitrary byte streams on disk under string keys:
//! - Content and metadata kept as file pairs with a `--meta` sidecar
//! - Per-item TTLs with lazy removal of expired entries
//! - Per-key locking with cancellable operations
//! - Pluggable garbage collection (probabilistic, interval or none)
//!
//! ```no_run
//! use filecache::{Context, DiskCache, ItemOptions};
//! use std::time::Duration;
//!
//! # async fn demo() -> filecache::Result<()> {
//! let cache = DiskCache::new("/var/cache/pages", vec![]).await?;
//! let ctx = Context::background().with_timeout(Duration::from_secs(5));
//!
//! cache
//!     .write_data(&ctx, "page", b"<html/>", ItemOptions::new().with_ttl(Duration::from_secs(60)))
//!     .await?;
//! let read = cache.read(&ctx, "page").await?;
//! assert!(read.hit());
//! cache.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod context;
pub mod core;
pub mod errors;
pub mod gc;
pub mod keylock;
pub mod meta;
pub mod nop;
pub mod options;
pub mod paths;
pub mod result;
pub mod scanner;
pub mod traits;
pub mod values;

mod files;

pub use config::{CacheConfig, CacheConfigLoader, ConfigSource, GcConfig, PathLayout};
pub use context::Context;
pub use core::{CacheBuilder, DiskCache};
pub use errors::{CacheError, CancelReason, Error, RecoveryHint, Result};
pub use gc::{GarbageCollector, IntervalGc, NopGc, ProbabilityGc};
pub use meta::Metadata;
pub use nop::NopCache;
pub use options::{InstanceOptions, ItemOptions, Ttl};
pub use paths::{
    EntryPaths, FilteredKeyPath, HashedKeyPath, HashedKeySplitPath, PathGenerator, WithExt,
};
pub use result::{CacheReader, OpenResult, ReadResult};
pub use scanner::{ScanEntry, ScanMode, Scanner};
pub use traits::FileCache;
pub use values::{FieldValue, Values};

pub use files::{DIRS_MODE, FILES_MODE};
