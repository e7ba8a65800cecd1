//! Lookup results

use crate::options::ItemOptions;
use std::fmt;
use tokio::io::AsyncRead;

/// Reader over a cached item's content, owned by the caller
pub type CacheReader = Box<dyn AsyncRead + Send + Unpin>;

/// Result of [`FileCache::open`](crate::FileCache::open)
#[derive(Default)]
pub struct OpenResult {
    hit: bool,
    reader: Option<CacheReader>,
    options: Option<ItemOptions>,
}

impl OpenResult {
    pub(crate) fn found(reader: CacheReader, options: ItemOptions) -> Self {
        Self {
            hit: true,
            reader: Some(reader),
            options: Some(options),
        }
    }

    pub(crate) fn miss() -> Self {
        Self::default()
    }

    /// Whether a valid, unexpired item was found
    pub fn hit(&self) -> bool {
        self.hit
    }

    /// Options the item was written with
    pub fn options(&self) -> Option<&ItemOptions> {
        self.options.as_ref()
    }

    /// Take the content reader; `None` on a miss
    pub fn into_reader(self) -> Option<CacheReader> {
        self.reader
    }

    /// Split into the reader and the options
    pub fn into_parts(self) -> (Option<CacheReader>, Option<ItemOptions>) {
        (self.reader, self.options)
    }
}

impl fmt::Debug for OpenResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenResult")
            .field("hit", &self.hit)
            .field("reader", &self.reader.as_ref().map(|_| "<reader>"))
            .field("options", &self.options)
            .finish()
    }
}

/// Result of [`FileCache::read`](crate::FileCache::read)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReadResult {
    hit: bool,
    data: Vec<u8>,
    options: Option<ItemOptions>,
}

impl ReadResult {
    pub(crate) fn found(data: Vec<u8>, options: Option<ItemOptions>) -> Self {
        Self {
            hit: true,
            data,
            options,
        }
    }

    pub(crate) fn miss() -> Self {
        Self::default()
    }

    pub fn hit(&self) -> bool {
        self.hit
    }

    /// Item content; empty on a miss
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn options(&self) -> Option<&ItemOptions> {
        self.options.as_ref()
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}
