//! Cache configuration management with precedence and validation
//!
//! Configuration is resolved from, in increasing precedence:
//! 1. built-in defaults
//! 2. `$XDG_CONFIG_HOME/filecache/config.json` (or the platform config dir)
//! 3. `FILECACHE_*` environment variables

use crate::core::DiskCache;
use crate::errors::{CacheError, RecoveryHint, Result, SerializationOp};
use crate::gc::{
    GarbageCollector, IntervalGc, NopGc, ProbabilityGc, DEFAULT_ON_INIT_DIVISOR,
    DEFAULT_ON_OPERATION_DIVISOR,
};
use crate::options::{InstanceOptions, Ttl};
use crate::paths::{
    FilteredKeyPath, HashedKeyPath, HashedKeySplitPath, PathGenerator, WithExt, DEFAULT_EXTENSION,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

pub const ENV_DIR: &str = "FILECACHE_DIR";
pub const ENV_DEFAULT_TTL: &str = "FILECACHE_DEFAULT_TTL";
pub const ENV_LAYOUT: &str = "FILECACHE_LAYOUT";
pub const ENV_EXTENSION: &str = "FILECACHE_EXT";
pub const ENV_GC: &str = "FILECACHE_GC";

/// Built-in key to path mappings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PathLayout {
    /// Key with path separators removed
    Filtered,
    /// Flat SHA-256 file names
    Hashed,
    /// SHA-256 split into `ab/cd/ef/<rest>`
    #[default]
    HashedSplit,
}

impl FromStr for PathLayout {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "filtered" => Ok(Self::Filtered),
            "hashed" => Ok(Self::Hashed),
            "hashed-split" | "split" => Ok(Self::HashedSplit),
            other => Err(CacheError::configuration(format!(
                "unknown path layout {other:?}, expected filtered, hashed or hashed-split"
            ))),
        }
    }
}

/// Garbage collector selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum GcConfig {
    Off,
    Probability { on_init: u32, on_operation: u32 },
    Interval { interval_ms: u64 },
}

impl Default for GcConfig {
    fn default() -> Self {
        Self::Probability {
            on_init: DEFAULT_ON_INIT_DIVISOR,
            on_operation: DEFAULT_ON_OPERATION_DIVISOR,
        }
    }
}

impl FromStr for GcConfig {
    type Err = CacheError;

    /// Parses `off`, `probability[:<on_init>:<on_operation>]` or
    /// `interval:<milliseconds>`
    fn from_str(s: &str) -> Result<Self> {
        let lowered = s.trim().to_lowercase();
        let mut parts = lowered.split(':');
        let mode = parts.next().unwrap_or_default();
        let args: Vec<&str> = parts.collect();

        let invalid = || CacheError::configuration(format!("invalid GC setting {s:?}"));
        let number = |raw: &str| raw.trim().parse::<u64>().map_err(|_| invalid());

        match (mode, args.as_slice()) {
            ("off" | "none", []) => Ok(Self::Off),
            ("probability", []) => Ok(Self::default()),
            ("probability", [on_init, on_operation]) => Ok(Self::Probability {
                on_init: u32::try_from(number(*on_init)?).map_err(|_| invalid())?,
                on_operation: u32::try_from(number(*on_operation)?).map_err(|_| invalid())?,
            }),
            ("interval", [interval_ms]) => Ok(Self::Interval {
                interval_ms: number(*interval_ms)?,
            }),
            _ => Err(invalid()),
        }
    }
}

/// Source of configuration for debugging and precedence tracking
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    #[default]
    Default,
    ConfigFile(PathBuf),
    EnvironmentVariable(String),
}

/// Everything needed to construct a [`DiskCache`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache root; unset means `<temp dir>/filecache`
    pub dir: Option<PathBuf>,
    /// Default item TTL in seconds; unset, zero or negative is eternal
    pub default_ttl_secs: Option<i64>,
    pub layout: PathLayout,
    /// Extension appended to content files; empty for none
    pub extension: String,
    pub gc: GcConfig,
    /// Where the last applied setting came from
    #[serde(skip)]
    pub source: ConfigSource,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: None,
            default_ttl_secs: None,
            layout: PathLayout::default(),
            extension: DEFAULT_EXTENSION.to_string(),
            gc: GcConfig::default(),
            source: ConfigSource::Default,
        }
    }
}

impl CacheConfig {
    pub fn default_ttl(&self) -> Ttl {
        match self.default_ttl_secs.and_then(|secs| u64::try_from(secs).ok()) {
            Some(secs) if secs > 0 => Ttl::After(Duration::from_secs(secs)),
            _ => Ttl::Eternal,
        }
    }

    pub fn path_generator(&self) -> Arc<dyn PathGenerator> {
        match self.layout {
            PathLayout::Filtered => Arc::new(WithExt::new(FilteredKeyPath, &self.extension)),
            PathLayout::Hashed => Arc::new(WithExt::new(HashedKeyPath, &self.extension)),
            PathLayout::HashedSplit => Arc::new(WithExt::new(HashedKeySplitPath, &self.extension)),
        }
    }

    /// Collector sweeping `root`
    pub fn garbage_collector(&self, root: &Path) -> Arc<dyn GarbageCollector> {
        match self.gc {
            GcConfig::Off => Arc::new(NopGc),
            GcConfig::Probability {
                on_init,
                on_operation,
            } => Arc::new(ProbabilityGc::new(root, on_init, on_operation)),
            GcConfig::Interval { interval_ms } => {
                Arc::new(IntervalGc::new(root, Duration::from_millis(interval_ms)))
            }
        }
    }

    /// Instance options for a cache rooted at `root`
    pub fn instance_options(&self, root: &Path) -> InstanceOptions {
        InstanceOptions {
            path_generator: Some(self.path_generator()),
            default_ttl: Some(self.default_ttl()),
            gc: Some(self.garbage_collector(root)),
        }
    }

    /// Construct the configured cache
    pub async fn build(&self) -> Result<DiskCache> {
        let dir = self.dir.clone().unwrap_or_default();
        let root = crate::core::resolve_root(&dir)?;
        let options = self.instance_options(&root);
        DiskCache::new(root, vec![options]).await
    }
}

/// Configuration loader that handles precedence
pub struct CacheConfigLoader;

impl CacheConfigLoader {
    /// Load configuration with full precedence handling
    pub fn load() -> Result<CacheConfig> {
        let mut config = CacheConfig::default();

        if let Some(path) = Self::config_file_path() {
            if path.exists() {
                config = Self::load_from_file(&path)?;
            }
        }

        Self::apply_env(&mut config, |name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Read a JSON configuration file; unset fields keep their defaults
    pub fn load_from_file(path: &Path) -> Result<CacheConfig> {
        let content = std::fs::read_to_string(path).map_err(|e| CacheError::Io {
            path: path.to_path_buf(),
            operation: "read config file",
            source: e,
            recovery_hint: RecoveryHint::CheckPermissions {
                path: path.to_path_buf(),
            },
        })?;

        let mut config: CacheConfig =
            serde_json::from_str(&content).map_err(|e| CacheError::Serialization {
                key: path.display().to_string(),
                operation: SerializationOp::Decode,
                source: Box::new(e),
                recovery_hint: RecoveryHint::Manual {
                    instructions: "Check config file syntax".to_string(),
                },
            })?;
        config.source = ConfigSource::ConfigFile(path.to_path_buf());
        Ok(config)
    }

    /// Override `config` with the `FILECACHE_*` variables `lookup` returns
    pub fn apply_env<F>(config: &mut CacheConfig, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut applied = false;

        if let Some(dir) = lookup(ENV_DIR) {
            config.dir = (!dir.trim().is_empty()).then(|| PathBuf::from(dir));
            applied = true;
        }

        if let Some(ttl) = lookup(ENV_DEFAULT_TTL) {
            let secs = ttl.trim().parse::<i64>().map_err(|_| {
                CacheError::configuration(format!(
                    "{ENV_DEFAULT_TTL} must be a number of seconds, got {ttl:?}"
                ))
            })?;
            config.default_ttl_secs = Some(secs);
            applied = true;
        }

        if let Some(layout) = lookup(ENV_LAYOUT) {
            config.layout = layout.parse()?;
            applied = true;
        }

        if let Some(ext) = lookup(ENV_EXTENSION) {
            config.extension = ext;
            applied = true;
        }

        if let Some(gc) = lookup(ENV_GC) {
            config.gc = gc.parse()?;
            applied = true;
        }

        if applied {
            config.source = ConfigSource::EnvironmentVariable("FILECACHE_*".to_string());
        }
        Ok(())
    }

    /// `$XDG_CONFIG_HOME/filecache/config.json`, falling back to the
    /// platform config directory
    pub fn config_file_path() -> Option<PathBuf> {
        let config_dir = match std::env::var_os("XDG_CONFIG_HOME") {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => dirs::config_dir()?,
        };
        Some(config_dir.join("filecache").join("config.json"))
    }
}
