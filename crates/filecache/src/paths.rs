//! Key to path mapping for cache entries

use sha2::{Digest, Sha256};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

/// Suffix appended to a content path to get its metadata path
pub const META_SUFFIX: &str = "--meta";

/// Suffix of in-flight write files, after a `.<uuid>` marker
pub const TEMP_SUFFIX: &str = ".tmp";

/// Extension used by the default path generator
pub const DEFAULT_EXTENSION: &str = ".cache";

/// Maps a cache key to a path relative to the cache root.
///
/// Implementations must be pure and deterministic. Any
/// `Fn(&str) -> String + Send + Sync` closure is a path generator.
pub trait PathGenerator: Send + Sync {
    /// Relative content path for `key`
    fn generate(&self, key: &str) -> String;
}

impl<F> PathGenerator for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn generate(&self, key: &str) -> String {
        self(key)
    }
}

/// Uses the key itself as the file name, with path separators removed.
///
/// Falls back to [`HashedKeyPath`] when nothing usable is left after
/// filtering: an empty name, `.` or `..`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilteredKeyPath;

impl PathGenerator for FilteredKeyPath {
    fn generate(&self, key: &str) -> String {
        let filtered: String = key.trim().chars().filter(|c| !matches!(c, '/' | '\\')).collect();
        if matches!(filtered.as_str(), "" | "." | "..") {
            return hash_key(key);
        }
        filtered
    }
}

/// Uses the hex-encoded SHA-256 of the key as a flat file name
#[derive(Debug, Clone, Copy, Default)]
pub struct HashedKeyPath;

impl PathGenerator for HashedKeyPath {
    fn generate(&self, key: &str) -> String {
        hash_key(key)
    }
}

/// Splits the hashed key into `ab/cd/ef/<rest>` to bound directory sizes
#[derive(Debug, Clone, Copy, Default)]
pub struct HashedKeySplitPath;

impl PathGenerator for HashedKeySplitPath {
    fn generate(&self, key: &str) -> String {
        let hash = hash_key(key);
        format!("{}/{}/{}/{}", &hash[..2], &hash[2..4], &hash[4..6], &hash[6..])
    }
}

/// Appends a file extension to the paths of another generator
pub struct WithExt<G> {
    inner: G,
    ext: String,
}

impl<G: PathGenerator> WithExt<G> {
    /// Wrap `inner`, normalizing `ext` to a trimmed, dot-prefixed form
    pub fn new(inner: G, ext: &str) -> Self {
        let ext = ext.trim();
        let ext = if ext.is_empty() || ext.starts_with('.') {
            ext.to_string()
        } else {
            format!(".{ext}")
        };
        Self { inner, ext }
    }

    /// The normalized extension
    pub fn ext(&self) -> &str {
        &self.ext
    }
}

impl<G: PathGenerator> PathGenerator for WithExt<G> {
    fn generate(&self, key: &str) -> String {
        let mut path = self.inner.generate(key);
        path.push_str(&self.ext);
        path
    }
}

impl<G: fmt::Debug> fmt::Debug for WithExt<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WithExt")
            .field("inner", &self.inner)
            .field("ext", &self.ext)
            .finish()
    }
}

/// The generator used when none is configured: `ab/cd/ef/<rest>.cache`
pub fn default_path_generator() -> Arc<dyn PathGenerator> {
    Arc::new(WithExt::new(HashedKeySplitPath, DEFAULT_EXTENSION))
}

/// Hash a cache key using SHA-256
pub fn hash_key(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Content and metadata file locations of one entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPaths {
    pub content: PathBuf,
    pub metadata: PathBuf,
}

impl EntryPaths {
    /// Resolve the paths of `key` under `root`
    pub fn resolve(root: &Path, generator: &dyn PathGenerator, key: &str) -> Self {
        Self::from_content(root.join(fix_separators(&generator.generate(key))))
    }

    /// Pair a content path with its metadata path
    pub fn from_content(content: PathBuf) -> Self {
        let mut metadata = content.clone().into_os_string();
        metadata.push(META_SUFFIX);
        Self {
            content,
            metadata: PathBuf::from(metadata),
        }
    }

    /// Pair a metadata path with its content path, if it bears the suffix
    pub fn from_metadata(metadata: &Path) -> Option<Self> {
        let raw = metadata.to_str()?;
        let content = raw.strip_suffix(META_SUFFIX)?;
        if content.is_empty() {
            return None;
        }
        Some(Self {
            content: PathBuf::from(content),
            metadata: metadata.to_path_buf(),
        })
    }

    /// Directory holding both files
    pub fn parent(&self) -> Option<&Path> {
        self.content.parent()
    }
}

/// Uniquely named sibling of `path` used while writing
pub(crate) fn temp_path(path: &Path, id: Uuid) -> PathBuf {
    let mut raw = path.as_os_str().to_owned();
    raw.push(format!(".{id}{TEMP_SUFFIX}"));
    PathBuf::from(raw)
}

/// Whether `path` was produced by [`temp_path`]
pub(crate) fn is_temp_path(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
        return false;
    };
    let Some(stem) = name.strip_suffix(TEMP_SUFFIX) else {
        return false;
    };
    // `<name>.<36-char uuid>`
    match stem.len().checked_sub(37) {
        Some(dot) if stem.is_char_boundary(dot) && stem[dot..].starts_with('.') => {
            Uuid::parse_str(&stem[dot + 1..]).is_ok()
        }
        _ => false,
    }
}

/// Replace foreign path separators with the platform one
fn fix_separators(path: &str) -> String {
    if std::path::MAIN_SEPARATOR == '/' {
        path.replace('\\', "/")
    } else {
        path.replace('/', std::path::MAIN_SEPARATOR_STR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_generators() {
        let cases: Vec<(&str, Box<dyn PathGenerator>, &str)> = vec![
            ("test1/test", Box::new(FilteredKeyPath), "test1test"),
            (
                "test2",
                Box::new(WithExt::new(FilteredKeyPath, " .cache ")),
                "test2.cache",
            ),
            (
                "test3",
                Box::new(WithExt::new(HashedKeyPath, ".json")),
                "fd61a03af4f77d870fc21e05e7e80678095c92d808cfb3b5c279ee04c74aca13.json",
            ),
            (
                "test4",
                Box::new(WithExt::new(HashedKeySplitPath, "html")),
                "a4/e6/24/d686e03ed2767c0abd85c14426b0b1157d2ce81d27bb4fe4f6f01d688a.html",
            ),
            (
                "///",
                Box::new(FilteredKeyPath),
                "732c4e9711639ed1436dd90d3951ca347d737084fc0cea250eed823bef07d0f1",
            ),
            (
                ".",
                Box::new(FilteredKeyPath),
                "cdb4ee2aea69cc6a83331bbe96dc2caa9a299d21329efb0336fc02a82e1839a8",
            ),
            (
                "/../",
                Box::new(FilteredKeyPath),
                "7302d5f9024b0cff8b050a28d2cd504fb0c5ff39d956e8aec85ede4bf80c76a8",
            ),
            ("a/./b", Box::new(FilteredKeyPath), "a.b"),
        ];

        for (key, generator, expected) in cases {
            assert_eq!(generator.generate(key), expected, "key {key:?}");
        }
    }

    #[test]
    fn test_closure_is_a_generator() {
        let generator = |key: &str| format!("custom/{key}");
        let paths = EntryPaths::resolve(Path::new("/root"), &generator, "abc");
        assert_eq!(paths.content, PathBuf::from("/root/custom/abc"));
        assert_eq!(paths.metadata, PathBuf::from("/root/custom/abc--meta"));
    }

    #[test]
    fn test_empty_extension_is_noop() {
        let generator = WithExt::new(FilteredKeyPath, "  ");
        assert_eq!(generator.ext(), "");
        assert_eq!(generator.generate("key"), "key");
    }

    #[test]
    fn test_metadata_pairing() {
        let paths = EntryPaths::from_content(PathBuf::from("/c/ab/item.cache"));
        let back = EntryPaths::from_metadata(&paths.metadata).unwrap();
        assert_eq!(back, paths);

        assert!(EntryPaths::from_metadata(Path::new("/c/ab/item.cache")).is_none());
        assert!(EntryPaths::from_metadata(Path::new("--meta")).is_none());
    }

    #[test]
    fn test_dot_keys_stay_under_root() {
        let root = Path::new("/cache");
        for key in [".", "..", "/..", "\\.."] {
            let paths = EntryPaths::resolve(root, &FilteredKeyPath, key);
            assert_eq!(paths.parent(), Some(root), "key {key:?}");
            assert_eq!(paths.content, root.join(hash_key(key)));
        }
    }

    #[test]
    fn test_temp_paths_are_recognized() {
        let content = Path::new("/cache/ab/item.cache");
        let temp = temp_path(content, Uuid::new_v4());
        assert!(is_temp_path(&temp));
        assert_eq!(temp.parent(), content.parent());

        assert!(!is_temp_path(content));
        assert!(!is_temp_path(Path::new("/cache/notes.tmp")));
        assert!(!is_temp_path(Path::new("/cache/x.not-a-uuid-at-all-but-36-chars-long.tmp")));
    }

    #[test]
    fn test_hash_is_deterministic() {
        assert_eq!(hash_key("hello"), hash_key("hello"));
        assert_eq!(
            hash_key("hello"),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
        assert_ne!(hash_key("hello"), hash_key("hello "));
    }
}
