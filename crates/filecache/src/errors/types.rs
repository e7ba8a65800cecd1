//! Core error types for the file cache

use std::path::PathBuf;
use std::time::Duration;

/// Result type for cache operations
pub type Result<T> = std::result::Result<T, CacheError>;

/// Re-export CacheError as Error for convenience
pub use CacheError as Error;

/// Error type for cache operations
///
/// A missing, expired or corrupt entry is never an error: lookups report it
/// as a miss. Errors are reserved for configuration problems, cancellation
/// and genuine I/O failures.
#[derive(Debug)]
pub enum CacheError {
    /// I/O errors during cache operations
    Io {
        path: PathBuf,
        operation: &'static str,
        source: std::io::Error,
        recovery_hint: RecoveryHint,
    },

    /// Metadata encoding errors
    Serialization {
        key: String,
        operation: SerializationOp,
        source: Box<dyn std::error::Error + Send + Sync>,
        recovery_hint: RecoveryHint,
    },

    /// Invalid cache key
    InvalidKey {
        key: String,
        reason: String,
        recovery_hint: RecoveryHint,
    },

    /// Invalid or conflicting construction options, or an unusable root directory
    Configuration {
        message: String,
        recovery_hint: RecoveryHint,
    },

    /// The caller's context was canceled or its deadline passed
    Cancelled {
        operation: &'static str,
        reason: CancelReason,
        recovery_hint: RecoveryHint,
    },

    /// A background task ended abnormally
    TaskFailed {
        task: &'static str,
        reason: String,
        recovery_hint: RecoveryHint,
    },
}

/// Why an operation observed cancellation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// The context's cancellation token fired
    Cancelled,
    /// The context's deadline passed
    DeadlineExceeded,
}

/// Recovery hints for error handling
#[derive(Debug, Clone)]
pub enum RecoveryHint {
    /// Retry the operation
    Retry { after: Duration },

    /// Check file permissions
    CheckPermissions { path: PathBuf },

    /// Check disk space and clean up if needed
    CheckDiskSpace,

    /// Update cache configuration
    UpdateConfiguration,

    /// The caller gave up; retry with a fresh context if still needed
    RetryWithNewContext,

    /// No automated recovery possible
    Manual { instructions: String },

    /// Operation can be safely ignored
    Ignore,
}

/// Serialization operation types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerializationOp {
    Encode,
    Decode,
}

impl CacheError {
    /// Build a cancellation error for `operation`
    pub fn cancelled(operation: &'static str, reason: CancelReason) -> Self {
        Self::Cancelled {
            operation,
            reason,
            recovery_hint: RecoveryHint::RetryWithNewContext,
        }
    }

    /// Build an I/O error with a hint derived from the error kind
    pub fn io(path: impl Into<PathBuf>, operation: &'static str, source: std::io::Error) -> Self {
        let path = path.into();
        let recovery_hint = match source.kind() {
            std::io::ErrorKind::PermissionDenied => RecoveryHint::CheckPermissions {
                path: path.clone(),
            },
            std::io::ErrorKind::StorageFull => RecoveryHint::CheckDiskSpace,
            std::io::ErrorKind::Interrupted
            | std::io::ErrorKind::WouldBlock
            | std::io::ErrorKind::TimedOut => RecoveryHint::Retry {
                after: Duration::from_millis(100),
            },
            _ => RecoveryHint::Manual {
                instructions: format!("Check that '{}' is accessible", path.display()),
            },
        };

        Self::Io {
            path,
            operation,
            source,
            recovery_hint,
        }
    }

    /// Build a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            recovery_hint: RecoveryHint::UpdateConfiguration,
        }
    }
}
