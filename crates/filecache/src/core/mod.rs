//! File-pair cache engine
//!
//! Every item is stored as two files under the cache root:
//! - a content file at the path produced by the instance's path generator
//! - a metadata sidecar at the same path plus `--meta`
//!
//! Writes go to uniquely named temp files that are renamed into place,
//! content first and metadata last, so a reader never pairs new content with
//! stale metadata. An item missing either file, with undecodable metadata or
//! past its TTL is removed on sight and reported as a miss.

// Private modules
mod builder;
mod operations;
mod trait_impl;
mod types;

pub(crate) use builder::resolve_root;
pub use builder::{CacheBuilder, DEFAULT_DIR_NAME};
pub use types::DiskCache;

#[cfg(test)]
mod tests;
