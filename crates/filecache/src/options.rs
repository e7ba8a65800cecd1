//! Instance and item options

use crate::gc::GarbageCollector;
use crate::paths::PathGenerator;
use crate::values::Values;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Time-to-live of a cache item
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Ttl {
    /// The item never expires
    #[default]
    Eternal,
    /// The item expires this long after it was written
    After(Duration),
}

impl Ttl {
    /// Resolve against the instance default: a zero duration means "use the default"
    pub(crate) fn or_default(ttl: Option<Self>, default: Self) -> Self {
        match ttl {
            None | Some(Self::After(Duration::ZERO)) => default,
            Some(ttl) => ttl,
        }
    }

    /// Whether this TTL can ever expire
    pub fn is_eternal(&self) -> bool {
        matches!(self, Self::Eternal)
    }

    /// The duration, or `None` for eternal items
    pub fn duration(&self) -> Option<Duration> {
        match self {
            Self::Eternal => None,
            Self::After(duration) => Some(*duration),
        }
    }
}

impl From<Duration> for Ttl {
    fn from(duration: Duration) -> Self {
        Self::After(duration)
    }
}

/// Options of a single cache item
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemOptions {
    /// Human-readable item name
    pub name: Option<String>,
    /// Item TTL; `None` or a zero duration uses the instance default
    pub ttl: Option<Ttl>,
    /// Any other metadata fields
    pub fields: Values,
}

impl ItemOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_ttl(mut self, ttl: impl Into<Ttl>) -> Self {
        self.ttl = Some(ttl.into());
        self
    }

    #[must_use]
    pub fn with_fields(mut self, fields: Values) -> Self {
        self.fields = fields;
        self
    }
}

/// Options of a cache instance
#[derive(Clone, Default)]
pub struct InstanceOptions {
    /// Key to path mapping; defaults to `ab/cd/ef/<hash>.cache`
    pub path_generator: Option<Arc<dyn PathGenerator>>,
    /// TTL of items written without one; defaults to [`Ttl::Eternal`]
    pub default_ttl: Option<Ttl>,
    /// Garbage collector; defaults to a probabilistic collector
    pub gc: Option<Arc<dyn GarbageCollector>>,
}

impl InstanceOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_path_generator(mut self, generator: impl PathGenerator + 'static) -> Self {
        self.path_generator = Some(Arc::new(generator));
        self
    }

    #[must_use]
    pub fn with_default_ttl(mut self, ttl: impl Into<Ttl>) -> Self {
        self.default_ttl = Some(ttl.into());
        self
    }

    #[must_use]
    pub fn with_gc(mut self, gc: Arc<dyn GarbageCollector>) -> Self {
        self.gc = Some(gc);
        self
    }
}

impl fmt::Debug for InstanceOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceOptions")
            .field(
                "path_generator",
                &self.path_generator.as_ref().map(|_| "<generator>"),
            )
            .field("default_ttl", &self.default_ttl)
            .field("gc", &self.gc)
            .finish()
    }
}
