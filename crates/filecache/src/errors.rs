//! Error handling for the file cache
//!
//! Every failure carries a [`RecoveryHint`] so callers can decide whether to
//! retry, fix permissions, or treat the cache as unavailable.

mod conversions;
mod display;
mod recovery;
mod types;

pub use types::*;
