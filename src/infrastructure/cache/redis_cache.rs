//! Redis-backed cache implementation.

use super::service::{CacheError, CacheResult, CacheService, generation_key};
use async_trait::async_trait;
use metrics::counter;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use tracing::{debug, error, info, warn};

/// Redis cache for serialized content responses.
///
/// Uses `ConnectionManager` for connection reuse. `get` and `set` are
/// fail-open: errors are logged but don't propagate to callers. Generation
/// reads and bumps return their errors so callers can bypass the cache.
pub struct RedisCache {
    client: ConnectionManager,
    default_ttl: u64,
    key_prefix: String,
}

impl RedisCache {
    /// Connects to Redis, validates the connection with a PING, and configures the default TTL.
    ///
    /// # Arguments
    ///
    /// - `redis_url` - Redis connection string (e.g., `"redis://localhost:6379"`)
    /// - `default_ttl_seconds` - TTL applied when [`CacheService::set`] is called
    ///   with `ttl_seconds = None`; controlled via `CACHE_TTL_SECONDS`
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::ConnectionError`] if the URL is invalid, the connection cannot
    /// be established, or the PING health check fails.
    pub async fn connect(redis_url: &str, default_ttl_seconds: u64) -> CacheResult<Self> {
        info!("Connecting to Redis");

        let client = Client::open(redis_url).map_err(|e| {
            CacheError::ConnectionError(format!("Failed to create Redis client: {}", e))
        })?;

        let manager = ConnectionManager::new(client).await.map_err(|e| {
            CacheError::ConnectionError(format!("Failed to connect to Redis: {}", e))
        })?;

        let mut test_conn = manager.clone();
        test_conn
            .ping::<()>()
            .await
            .map_err(|e| CacheError::ConnectionError(format!("Redis PING failed: {}", e)))?;

        info!("✓ Connected to Redis");

        Ok(Self {
            client: manager,
            default_ttl: default_ttl_seconds,
            key_prefix: "content:".to_string(),
        })
    }

    fn build_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }
}

#[async_trait]
impl CacheService for RedisCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let full_key = self.build_key(key);
        let mut conn = self.client.clone();

        match conn.get::<_, Option<String>>(&full_key).await {
            Ok(Some(value)) => {
                debug!("Cache HIT: {}", key);
                counter!("cms_cache_hits_total").increment(1);
                Ok(Some(value))
            }
            Ok(None) => {
                debug!("Cache MISS: {}", key);
                counter!("cms_cache_misses_total").increment(1);
                Ok(None)
            }
            Err(e) => {
                error!("Redis GET error for {}: {}", key, e);
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &str, value: &str, ttl_seconds: Option<u64>) -> CacheResult<()> {
        let full_key = self.build_key(key);
        let mut conn = self.client.clone();
        let ttl = ttl_seconds.unwrap_or(self.default_ttl);

        match conn.set_ex::<_, _, ()>(&full_key, value, ttl).await {
            Ok(_) => {
                debug!("Cache SET: {} ({} bytes, TTL: {}s)", key, value.len(), ttl);
                Ok(())
            }
            Err(e) => {
                warn!("Redis SET error for {}: {}", key, e);
                Ok(())
            }
        }
    }

    async fn generation(&self, resource: &str) -> CacheResult<u64> {
        let full_key = self.build_key(&generation_key(resource));
        let mut conn = self.client.clone();

        conn.get::<_, Option<u64>>(&full_key)
            .await
            .map(Option::unwrap_or_default)
            .map_err(|e| {
                CacheError::OperationError(format!("Redis GET error for {}: {}", full_key, e))
            })
    }

    async fn invalidate(&self, resource: &str) -> CacheResult<()> {
        let full_key = self.build_key(&generation_key(resource));
        let mut conn = self.client.clone();

        match conn.incr::<_, _, u64>(&full_key, 1).await {
            Ok(generation) => {
                debug!("Cache INVALIDATE: {} (generation {})", resource, generation);
                Ok(())
            }
            Err(e) => Err(CacheError::OperationError(format!(
                "Redis INCR error for {}: {}",
                full_key, e
            ))),
        }
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.client.clone();
        conn.ping::<()>().await.is_ok()
    }
}
