//! Configuration precedence through the process environment

use filecache::config::{ENV_DEFAULT_TTL, ENV_DIR, ENV_EXTENSION, ENV_GC, ENV_LAYOUT};
use filecache::{
    CacheConfigLoader, ConfigSource, Context, GcConfig, ItemOptions, PathLayout, Ttl,
};
use serial_test::serial;
use std::time::Duration;
use tempfile::TempDir;

const ALL_VARS: [&str; 6] = [
    "XDG_CONFIG_HOME",
    ENV_DIR,
    ENV_DEFAULT_TTL,
    ENV_LAYOUT,
    ENV_EXTENSION,
    ENV_GC,
];

/// Restores the touched variables when dropped
struct EnvGuard {
    saved: Vec<(&'static str, Option<String>)>,
}

impl EnvGuard {
    fn new() -> Self {
        let saved = ALL_VARS
            .iter()
            .map(|name| (*name, std::env::var(name).ok()))
            .collect();
        for name in ALL_VARS {
            std::env::remove_var(name);
        }
        Self { saved }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (name, value) in &self.saved {
            match value {
                Some(value) => std::env::set_var(name, value),
                None => std::env::remove_var(name),
            }
        }
    }
}

fn write_config_file(config_home: &std::path::Path, json: &str) {
    let dir = config_home.join("filecache");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("config.json"), json).unwrap();
}

#[test]
#[serial]
fn test_defaults_without_file_or_env() {
    let _env = EnvGuard::new();
    let config_home = TempDir::new().unwrap();
    std::env::set_var("XDG_CONFIG_HOME", config_home.path());

    let config = CacheConfigLoader::load().unwrap();
    assert_eq!(config.source, ConfigSource::Default);
    assert_eq!(config.layout, PathLayout::HashedSplit);
    assert_eq!(config.default_ttl(), Ttl::Eternal);
    assert_eq!(
        CacheConfigLoader::config_file_path().unwrap(),
        config_home.path().join("filecache").join("config.json")
    );
}

#[test]
#[serial]
fn test_file_then_env_precedence() {
    let _env = EnvGuard::new();
    let config_home = TempDir::new().unwrap();
    write_config_file(
        config_home.path(),
        r#"{"dir":"/from/file","default_ttl_secs":10,"layout":"hashed","gc":{"mode":"off"}}"#,
    );
    std::env::set_var("XDG_CONFIG_HOME", config_home.path());

    let config = CacheConfigLoader::load().unwrap();
    assert_eq!(config.dir.as_deref(), Some(std::path::Path::new("/from/file")));
    assert_eq!(config.layout, PathLayout::Hashed);
    assert!(matches!(config.source, ConfigSource::ConfigFile(_)));

    std::env::set_var(ENV_DEFAULT_TTL, "120");
    std::env::set_var(ENV_GC, "interval:1000");
    let config = CacheConfigLoader::load().unwrap();
    assert_eq!(config.dir.as_deref(), Some(std::path::Path::new("/from/file")));
    assert_eq!(config.default_ttl(), Ttl::After(Duration::from_secs(120)));
    assert_eq!(config.gc, GcConfig::Interval { interval_ms: 1000 });
    assert!(matches!(config.source, ConfigSource::EnvironmentVariable(_)));
}

#[test]
#[serial]
fn test_invalid_env_is_reported() {
    let _env = EnvGuard::new();
    let config_home = TempDir::new().unwrap();
    std::env::set_var("XDG_CONFIG_HOME", config_home.path());
    std::env::set_var(ENV_GC, "whenever");

    let err = CacheConfigLoader::load().unwrap_err();
    assert!(err.is_configuration());
}

#[tokio::test]
#[serial]
async fn test_loaded_config_builds_working_cache() {
    let _env = EnvGuard::new();
    let config_home = TempDir::new().unwrap();
    let cache_dir = TempDir::new().unwrap();
    std::env::set_var("XDG_CONFIG_HOME", config_home.path());
    std::env::set_var(ENV_DIR, cache_dir.path());
    std::env::set_var(ENV_LAYOUT, "filtered");
    std::env::set_var(ENV_EXTENSION, "bin");
    std::env::set_var(ENV_GC, "off");

    let cache = CacheConfigLoader::load().unwrap().build().await.unwrap();
    let ctx = Context::background();
    cache
        .write_data(&ctx, "blob", b"bytes", ItemOptions::new())
        .await
        .unwrap();

    assert!(cache_dir.path().join("blob.bin").is_file());
    assert_eq!(cache.read(&ctx, "blob").await.unwrap().data(), b"bytes");
    cache.close().await.unwrap();
}
