//! Cache error types.

use thiserror::Error;

/// Errors raised by the cache registry.
///
/// Memoized calls never produce these; errors from wrapped functions pass
/// through unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("cache `{name}` already exists with value type {existing}, requested {requested}")]
    TypeMismatch {
        name: String,
        existing: &'static str,
        requested: &'static str,
    },
}
