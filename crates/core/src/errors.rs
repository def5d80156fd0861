//! Core error types for the resolution engine.
//!
//! This module defines backend-agnostic error types. Storage-specific
//! errors (from SQLite, etc.) are converted to [`CacheError`] by the
//! storage layer.

use thiserror::Error;

use cepfill_providers::LookupError;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the resolution engine.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Cache operation failed: {0}")]
    Cache(#[from] CacheError),

    #[error("Lookup failed: {0}")]
    Lookup(#[from] LookupError),
}

/// Backend-agnostic error type for cache operations.
///
/// This enum uses `String` for all error details, allowing cache
/// backends to convert storage-specific errors (SQLite, etc.) into
/// this format.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// The backend itself failed (connection, query, lock).
    #[error("Cache backend failed: {0}")]
    Backend(String),

    /// A stored entry could not be encoded or decoded.
    #[error("Cache entry codec failed: {0}")]
    Serialization(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_error_wraps_into_root_error() {
        let error: Error = CacheError::Backend("disk full".to_string()).into();
        assert!(matches!(error, Error::Cache(_)));
        assert_eq!(
            format!("{}", error),
            "Cache operation failed: Cache backend failed: disk full"
        );
    }

    #[test]
    fn test_lookup_error_wraps_into_root_error() {
        let error: Error = LookupError::Canceled.into();
        assert!(matches!(error, Error::Lookup(LookupError::Canceled)));
    }

    #[test]
    fn test_invalid_config_display() {
        let error = Error::InvalidConfig("Provider chain is empty".to_string());
        assert_eq!(
            format!("{}", error),
            "Invalid configuration: Provider chain is empty"
        );
    }
}
