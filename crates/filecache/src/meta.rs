//! Metadata sidecar records and their codec
//!
//! Short JSON field names keep the sidecar files small:
//! `k` key, `c` created-at, `n` name, `t` TTL in nanoseconds (`-1` is
//! eternal) and `f` auxiliary fields.

use crate::errors::{CacheError, RecoveryHint, Result, SerializationOp};
use crate::options::{ItemOptions, Ttl};
use crate::values::Values;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Metadata of one cache entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Original, non-hashed key
    #[serde(rename = "k")]
    pub key: String,

    /// When the entry was written; only the write path sets it
    #[serde(rename = "c")]
    pub created_at: DateTime<Utc>,

    #[serde(rename = "n", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(rename = "t", with = "ttl_nanos")]
    pub ttl: Ttl,

    #[serde(rename = "f", default, skip_serializing_if = "Values::is_empty")]
    pub fields: Values,
}

impl Metadata {
    /// Stamp a new record for `key`, resolving the TTL against `default_ttl`
    pub(crate) fn new(key: &str, options: ItemOptions, default_ttl: Ttl) -> Self {
        Self {
            key: key.to_string(),
            created_at: Utc::now(),
            name: options.name,
            ttl: Ttl::or_default(options.ttl, default_ttl),
            fields: options.fields,
        }
    }

    /// Whether the entry is past its TTL
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        let Some(ttl) = self.ttl.duration() else {
            return false;
        };
        let Ok(ttl) = chrono::Duration::from_std(ttl) else {
            return false;
        };
        match self.created_at.checked_add_signed(ttl) {
            Some(expires_at) => now > expires_at,
            None => false,
        }
    }

    /// The item options this record was written with (TTL resolved)
    pub fn to_options(&self) -> ItemOptions {
        ItemOptions {
            name: self.name.clone(),
            ttl: Some(self.ttl),
            fields: self.fields.clone(),
        }
    }

    /// Serialize the record
    pub fn encode(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| CacheError::Serialization {
            key: self.key.clone(),
            operation: SerializationOp::Encode,
            source: Box::new(e),
            recovery_hint: RecoveryHint::Manual {
                instructions: "Check that metadata fields are serializable".to_string(),
            },
        })
    }

    /// Deserialize a record.
    ///
    /// A record with an empty key is rejected like any malformed input.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let meta: Self = serde_json::from_slice(bytes)?;
        if meta.key.is_empty() {
            return Err(CacheError::Serialization {
                key: String::new(),
                operation: SerializationOp::Decode,
                source: "metadata record has an empty key".into(),
                recovery_hint: RecoveryHint::Ignore,
            });
        }
        Ok(meta)
    }

    /// Read and decode a metadata file.
    ///
    /// Missing, unreadable and corrupt files all yield `None`: callers must
    /// treat them the same way.
    pub async fn load(path: &Path) -> Option<Self> {
        let bytes = tokio::fs::read(path).await.ok()?;
        match Self::decode(&bytes) {
            Ok(meta) => Some(meta),
            Err(e) => {
                tracing::debug!("Ignoring invalid metadata {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Blocking variant of [`Metadata::load`] for directory walks
    pub fn load_blocking(path: &Path) -> Option<Self> {
        let bytes = std::fs::read(path).ok()?;
        Self::decode(&bytes).ok()
    }
}

/// TTL as signed nanoseconds with `-1` for eternal
mod ttl_nanos {
    use super::{Duration, Ttl};
    use serde::{Deserialize, Deserializer, Serializer};

    const ETERNAL: i64 = -1;

    pub fn serialize<S: Serializer>(ttl: &Ttl, serializer: S) -> Result<S::Ok, S::Error> {
        let nanos = match ttl {
            Ttl::Eternal => ETERNAL,
            Ttl::After(duration) => i64::try_from(duration.as_nanos()).unwrap_or(i64::MAX),
        };
        serializer.serialize_i64(nanos)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Ttl, D::Error> {
        let nanos = i64::deserialize(deserializer)?;
        // Non-positive values never expire; only -1 is ever written.
        Ok(match u64::try_from(nanos) {
            Ok(nanos) if nanos > 0 => Ttl::After(Duration::from_nanos(nanos)),
            _ => Ttl::Eternal,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(ttl: Ttl) -> Metadata {
        Metadata::new(
            "https://zh.wikipedia.org/wiki/%E5%BA%9E",
            ItemOptions::new()
                .with_name("TestName")
                .with_fields(Values::from_pairs([("f1", "v1"), ("f2", "v2")])),
            ttl,
        )
    }

    #[test]
    fn test_encode_decode() {
        let meta = record(Ttl::After(Duration::from_secs(1)));
        let bytes = meta.encode().unwrap();
        let decoded = Metadata::decode(&bytes).unwrap();

        assert_eq!(decoded, meta);
        assert_eq!(decoded.fields.get_str("f1"), Some("v1"));
    }

    #[test]
    fn test_decode_known_document() {
        let json = br#"{"k":"pages/1","c":"2019-12-12T03:16:32Z","n":"TestName","t":1000000000,"f":{"f1":{"s":"v1"},"f2":{"i":2}}}"#;
        let meta = Metadata::decode(json).unwrap();

        assert_eq!(meta.key, "pages/1");
        assert_eq!(meta.name.as_deref(), Some("TestName"));
        assert_eq!(meta.ttl, Ttl::After(Duration::from_secs(1)));
        assert_eq!(meta.created_at.timestamp(), 1_576_120_592);
        assert_eq!(meta.fields.get_i64("f2"), Some(2));
        assert!(meta.is_expired());
    }

    #[test]
    fn test_eternal_sentinel_on_the_wire() {
        let meta = record(Ttl::Eternal);
        let value: serde_json::Value = serde_json::from_slice(&meta.encode().unwrap()).unwrap();
        assert_eq!(value["t"], serde_json::json!(-1));
        assert!(value.get("n").is_some());

        let decoded = Metadata::decode(&meta.encode().unwrap()).unwrap();
        assert_eq!(decoded.ttl, Ttl::Eternal);
    }

    #[test]
    fn test_decode_fails_closed() {
        assert!(Metadata::decode(br#"{"bad":"json"}"#).is_err());
        assert!(Metadata::decode(b"not json at all").is_err());
        assert!(Metadata::decode(br#"{"k":"","c":"2019-12-12T03:16:32Z","t":-1}"#).is_err());
    }

    #[test]
    fn test_expiry() {
        let now = Utc::now();
        let mut meta = record(Ttl::After(Duration::from_secs(3 * 3600)));
        meta.created_at = now - chrono::Duration::hours(2);
        assert!(!meta.is_expired_at(now));

        meta.ttl = Ttl::After(Duration::from_secs(3600));
        assert!(meta.is_expired_at(now));

        meta.ttl = Ttl::Eternal;
        assert!(!meta.is_expired_at(now));
    }

    #[test]
    fn test_ttl_falls_back_to_default() {
        let meta = Metadata::new("k", ItemOptions::new(), Ttl::After(Duration::from_secs(5)));
        assert_eq!(meta.ttl, Ttl::After(Duration::from_secs(5)));
        assert_eq!(meta.to_options().ttl, Some(Ttl::After(Duration::from_secs(5))));
    }
}
