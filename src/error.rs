//! Error types for the freqcache library.
//!
//! ## Key Components
//!
//! - [`CacheError`]: Returned by fallible cache operations (lookups and
//!   deletions of absent keys).
//! - [`InvariantError`]: Returned when internal data-structure invariants are
//!   violated (`check_invariants` methods).
//!
//! ## Example Usage
//!
//! ```
//! use freqcache::error::CacheError;
//! use freqcache::policy::lfu::LfuCache;
//!
//! let cache: LfuCache<&str, i32> = LfuCache::new("errors", 4);
//!
//! // Absent key without a data loader
//! assert_eq!(cache.value(&"missing", &[]).unwrap_err(), CacheError::KeyNotFound);
//! assert!(cache.delete(&"missing").is_err());
//! ```

use thiserror::Error;

/// Result alias used by every fallible cache operation.
pub type Result<T> = std::result::Result<T, CacheError>;

// ---------------------------------------------------------------------------
// CacheError
// ---------------------------------------------------------------------------

/// Recoverable failure of a cache operation.
///
/// Neither variant is fatal: callers branch on the outcome and carry on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CacheError {
    /// The key is not resident and no data loader is configured (reads), or
    /// the key is not resident (deletes).
    #[error("key not found in cache")]
    KeyNotFound,

    /// The key is not resident and the configured data loader declined to
    /// produce a value for it.
    #[error("key not found and could not be loaded into cache")]
    KeyNotFoundOrLoadable,
}

// ---------------------------------------------------------------------------
// InvariantError
// ---------------------------------------------------------------------------

/// Error returned when internal cache invariants are violated.
///
/// Produced by [`LfuCache::check_invariants`](crate::policy::lfu::LfuCache::check_invariants)
/// and [`FrequencyBuckets::check_invariants`](crate::ds::FrequencyBuckets::check_invariants).
/// Carries a human-readable description of which invariant failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct InvariantError(String);

impl InvariantError {
    /// Creates a new `InvariantError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- CacheError -------------------------------------------------------

    #[test]
    fn cache_error_display() {
        assert_eq!(CacheError::KeyNotFound.to_string(), "key not found in cache");
        assert_eq!(
            CacheError::KeyNotFoundOrLoadable.to_string(),
            "key not found and could not be loaded into cache"
        );
    }

    #[test]
    fn cache_error_variants_are_distinct() {
        assert_ne!(CacheError::KeyNotFound, CacheError::KeyNotFoundOrLoadable);
    }

    #[test]
    fn cache_error_implements_std_error() {
        fn assert_error<T: std::error::Error + Send + Sync + 'static>() {}
        assert_error::<CacheError>();
    }

    // -- InvariantError ---------------------------------------------------

    #[test]
    fn invariant_display_shows_message() {
        let err = InvariantError::new("bucket length mismatch");
        assert_eq!(err.to_string(), "bucket length mismatch");
    }

    #[test]
    fn invariant_message_accessor() {
        let err = InvariantError::new("test");
        assert_eq!(err.message(), "test");
    }

    #[test]
    fn invariant_clone_and_eq() {
        let a = InvariantError::new("x");
        let b = a.clone();
        assert_eq!(a, b);
    }
}
