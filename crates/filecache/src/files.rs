//! Filesystem primitives shared by the engine and the garbage collectors

use crate::context::Context;
use crate::errors::{CacheError, Result};
use crate::paths::EntryPaths;
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Permissions of created directories (owner rwx)
pub const DIRS_MODE: u32 = 0o700;

/// Permissions of created files (owner rw)
pub const FILES_MODE: u32 = 0o600;

const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Create `dir` and its parents; existing directories are fine
pub(crate) async fn create_dirs(dir: &Path) -> Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(DIRS_MODE);

    match builder.create(dir).await {
        Ok(()) => Ok(()),
        // Another writer may have raced us to a path component.
        Err(e) if e.kind() == ErrorKind::AlreadyExists && dir.is_dir() => Ok(()),
        Err(e) => Err(CacheError::io(dir, "create cache directory", e)),
    }
}

/// Check that `dir` is a usable cache root, creating it when absent
pub(crate) async fn prepare_root(dir: &Path) -> Result<()> {
    match fs::metadata(dir).await {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(CacheError::configuration(format!(
            "{} is not a directory",
            dir.display()
        ))),
        Err(e) if e.kind() == ErrorKind::NotFound => match create_dirs(dir).await {
            Ok(()) => Ok(()),
            Err(e) => Err(CacheError::configuration(format!(
                "{} does not exist and cannot be created: {e}",
                dir.display()
            ))),
        },
        Err(e) => Err(CacheError::configuration(format!(
            "cannot stat {}: {e}",
            dir.display()
        ))),
    }
}

/// Create or truncate a cache file for writing
pub(crate) async fn create_file(path: &Path) -> Result<fs::File> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(FILES_MODE);

    options
        .open(path)
        .await
        .map_err(|e| CacheError::io(path, "create cache file", e))
}

/// Whether both files of an entry exist as regular files
pub(crate) async fn entry_files_valid(paths: &EntryPaths) -> bool {
    let (content, metadata) = tokio::join!(
        fs::metadata(&paths.content),
        fs::metadata(&paths.metadata)
    );
    matches!((content, metadata), (Ok(c), Ok(m)) if c.is_file() && m.is_file())
}

/// Blocking variant of [`entry_files_valid`] for directory walks
pub(crate) fn entry_files_valid_blocking(paths: &EntryPaths) -> bool {
    let content = std::fs::metadata(&paths.content);
    let metadata = std::fs::metadata(&paths.metadata);
    matches!((content, metadata), (Ok(c), Ok(m)) if c.is_file() && m.is_file())
}

/// Remove both files of an entry.
///
/// Absent files are not an error. Both removals are always attempted; the
/// first other failure is returned.
pub(crate) async fn remove_entry_files(paths: &EntryPaths) -> Result<()> {
    let metadata = remove_file(&paths.metadata, "remove metadata file").await;
    let content = remove_file(&paths.content, "remove cache data file").await;
    metadata.and(content)
}

/// Best-effort removal used on cleanup paths: failures are only logged
pub(crate) async fn discard_entry_files(paths: &EntryPaths) {
    if let Err(e) = remove_entry_files(paths).await {
        tracing::warn!("Failed to clean up cache entry: {}", e);
    }
}

/// Blocking best-effort removal used by garbage collection sweeps
pub(crate) fn discard_entry_files_blocking(paths: &EntryPaths) -> bool {
    let mut removed = false;
    for path in [&paths.metadata, &paths.content] {
        match std::fs::remove_file(path) {
            Ok(()) => removed = true,
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!("Failed to remove expired file {}: {}", path.display(), e);
            }
        }
    }
    removed
}

pub(crate) async fn remove_file(path: &Path, operation: &'static str) -> Result<()> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(CacheError::io(path, operation, e)),
    }
}

/// Copy `src` into `dst`, checking `ctx` before every chunk.
///
/// `path` names the destination in I/O errors.
pub(crate) async fn copy_with_context<R, W>(
    ctx: &Context,
    src: &mut R,
    dst: &mut W,
    path: &Path,
) -> Result<u64>
where
    R: AsyncRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut buf = vec![0u8; COPY_BUFFER_SIZE];
    let mut written = 0u64;

    loop {
        ctx.check("write")?;
        let n = tokio::select! {
            biased;
            reason = ctx.done() => return Err(CacheError::cancelled("write", reason)),
            read = src.read(&mut buf) => read.map_err(|e| CacheError::io(path, "read data source", e))?,
        };
        if n == 0 {
            break;
        }
        dst.write_all(&buf[..n])
            .await
            .map_err(|e| CacheError::io(path, "write cache data file", e))?;
        written += n as u64;
    }

    dst.flush()
        .await
        .map_err(|e| CacheError::io(path, "flush cache data file", e))?;
    Ok(written)
}

/// Drain `src` into memory, checking `ctx` before every chunk
pub(crate) async fn read_all_with_context<R>(ctx: &Context, src: &mut R, path: &Path) -> Result<Vec<u8>>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut data = Vec::with_capacity(512);
    let mut buf = vec![0u8; COPY_BUFFER_SIZE];

    loop {
        ctx.check("read")?;
        let n = tokio::select! {
            biased;
            reason = ctx.done() => return Err(CacheError::cancelled("read", reason)),
            read = src.read(&mut buf) => read.map_err(|e| CacheError::io(path, "read cache data file", e))?,
        };
        if n == 0 {
            return Ok(data);
        }
        data.extend_from_slice(&buf[..n]);
    }
}
