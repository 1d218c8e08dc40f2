//! Cache service trait and error types.

use async_trait::async_trait;
use std::fmt;

/// Errors that can occur during cache operations.
#[derive(Debug)]
pub enum CacheError {
    ConnectionError(String),
    OperationError(String),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::ConnectionError(e) => write!(f, "Cache connection error: {}", e),
            Self::OperationError(e) => write!(f, "Cache operation error: {}", e),
        }
    }
}

impl std::error::Error for CacheError {}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Builds the cache key of a resource's public list at `generation`.
pub fn list_key(resource: &str, generation: u64) -> String {
    format!("{resource}:list:{generation}")
}

/// Builds the key holding a resource's current list generation.
pub fn generation_key(resource: &str) -> String {
    format!("{resource}:gen")
}

/// Trait for caching serialized content responses.
///
/// Values are opaque JSON strings. Implementations must be thread-safe and
/// fail open: a cache failure degrades to a database read, never to an error
/// response.
///
/// # Implementations
///
/// - [`crate::infrastructure::cache::RedisCache`] - Redis-backed cache with TTL support
/// - [`crate::infrastructure::cache::NullCache`] - No-op implementation for disabled caching
#[async_trait]
pub trait CacheService: Send + Sync {
    /// Retrieves a cached value.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(value))` on cache hit
    /// - `Ok(None)` on cache miss or error (fail-open behavior)
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Stores a value with optional TTL in seconds.
    ///
    /// `None` uses the implementation's default TTL. Errors are logged and
    /// swallowed.
    async fn set(&self, key: &str, value: &str, ttl_seconds: Option<u64>) -> CacheResult<()>;

    /// Current list generation of `resource`; `0` until first invalidated.
    ///
    /// List keys embed the generation read before the database query, so a
    /// write that lands in between leaves the late `set` on a dead key.
    /// Callers skip caching when this fails.
    async fn generation(&self, resource: &str) -> CacheResult<u64>;

    /// Moves `resource` to a new list generation.
    ///
    /// Used when a resource is created, modified or deleted. Entries of older
    /// generations are never read again and expire with their TTL.
    async fn invalidate(&self, resource: &str) -> CacheResult<()>;

    /// Checks if the cache backend is healthy.
    ///
    /// Used by health check endpoints to report cache status.
    async fn health_check(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys() {
        assert_eq!(list_key("heroes", 0), "heroes:list:0");
        assert_eq!(list_key("heroes", 7), "heroes:list:7");
        assert_eq!(generation_key("heroes"), "heroes:gen");
    }
}
