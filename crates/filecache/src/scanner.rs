//! Directory walker reporting cache entries found on disk

use crate::errors::{CacheError, Result};
use crate::files;
use crate::meta::Metadata;
use crate::options::ItemOptions;
use crate::paths::{EntryPaths, META_SUFFIX};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Which entries a [`Scanner`] reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    /// Unexpired entries only
    Valid,
    /// Expired entries only
    Expired,
}

/// One entry reported by a scan
#[derive(Debug, Clone)]
pub struct ScanEntry {
    pub key: String,
    pub created_at: DateTime<Utc>,
    pub options: ItemOptions,
    pub(crate) paths: EntryPaths,
}

impl ScanEntry {
    /// Content file of the entry
    pub fn content_path(&self) -> &Path {
        &self.paths.content
    }

    /// Metadata file of the entry
    pub fn metadata_path(&self) -> &Path {
        &self.paths.metadata
    }
}

/// Walks a cache root and reports every complete entry matching its mode.
///
/// Walking is synchronous; run it on the blocking pool from async code.
#[derive(Debug, Clone)]
pub struct Scanner {
    dir: PathBuf,
    mode: ScanMode,
}

impl Scanner {
    /// Scanner reporting valid (unexpired) entries under `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            mode: ScanMode::Valid,
        }
    }

    /// Scanner reporting expired entries under `dir`
    pub fn expired(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            mode: ScanMode::Expired,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn mode(&self) -> ScanMode {
        self.mode
    }

    /// Walk the root and call `on_hit` for each matching entry.
    ///
    /// An error returned by `on_hit` aborts the walk and is returned as is.
    /// Incomplete entries and undecodable metadata are skipped.
    pub fn scan<F>(&self, mut on_hit: F) -> Result<()>
    where
        F: FnMut(ScanEntry) -> Result<()>,
    {
        let root = std::fs::metadata(&self.dir)
            .map_err(|e| CacheError::io(&self.dir, "scan cache directory", e))?;
        if !root.is_dir() {
            return Err(CacheError::configuration(format!(
                "{} is not a directory",
                self.dir.display()
            )));
        }

        let now = Utc::now();
        for item in WalkDir::new(&self.dir) {
            let item = match item {
                Ok(item) => item,
                Err(e) => {
                    tracing::debug!("Skipping unreadable cache path: {}", e);
                    continue;
                }
            };
            if !item.file_type().is_file() {
                continue;
            }
            let is_meta = item
                .file_name()
                .to_str()
                .is_some_and(|name| name.ends_with(META_SUFFIX));
            if !is_meta {
                continue;
            }

            let Some(entry) = self.inspect(item.path(), now) else {
                continue;
            };
            on_hit(entry)?;
        }

        Ok(())
    }

    /// Collect every matching entry
    pub fn collect(&self) -> Result<Vec<ScanEntry>> {
        let mut entries = Vec::new();
        self.scan(|entry| {
            entries.push(entry);
            Ok(())
        })?;
        Ok(entries)
    }

    fn inspect(&self, meta_path: &Path, now: DateTime<Utc>) -> Option<ScanEntry> {
        let paths = EntryPaths::from_metadata(meta_path)?;
        if !files::entry_files_valid_blocking(&paths) {
            return None;
        }

        let Some(meta) = Metadata::load_blocking(&paths.metadata) else {
            tracing::debug!("Skipping undecodable metadata {}", meta_path.display());
            return None;
        };

        let wanted = match self.mode {
            ScanMode::Valid => !meta.is_expired_at(now),
            ScanMode::Expired => meta.is_expired_at(now),
        };
        if !wanted {
            return None;
        }

        Some(ScanEntry {
            options: meta.to_options(),
            key: meta.key,
            created_at: meta.created_at,
            paths,
        })
    }
}
