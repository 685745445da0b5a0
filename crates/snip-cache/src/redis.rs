use async_trait::async_trait;
use redis::AsyncCommands;
use snip_core::cache::Result;
use snip_core::{CacheError, CacheKey, UrlCache};
use std::time::Duration;
use tracing::{debug, trace, warn};

/// A Redis-based implementation of [`UrlCache`].
///
/// URLs are stored as plain strings under the cache key, with the TTL set
/// atomically by `SET ... EX`.
#[derive(Debug, Clone)]
pub struct RedisUrlCache {
    conn: redis::aio::MultiplexedConnection,
}

fn map_redis_error(operation: &str, err: redis::RedisError) -> CacheError {
    let message = format!("{operation}: {err}");
    if message.to_ascii_lowercase().contains("timed out") {
        CacheError::Timeout(message)
    } else if err.is_io_error() {
        CacheError::Unavailable(message)
    } else {
        CacheError::Operation(message)
    }
}

/// Redis rejects `EX 0`; sub-second TTLs round up to one second.
fn ttl_seconds(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

impl RedisUrlCache {
    /// Creates a new Redis URL cache.
    ///
    /// # Arguments
    ///
    /// * `conn` - A multiplexed Redis connection
    pub fn new(conn: redis::aio::MultiplexedConnection) -> Self {
        Self { conn }
    }

    /// Opens a multiplexed connection to `redis_url` and wraps it.
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| CacheError::Initialization(format!("invalid redis url: {e}")))?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| map_redis_error("failed to connect to Redis", e))?;
        Ok(Self::new(conn))
    }
}

#[async_trait]
impl UrlCache for RedisUrlCache {
    async fn get_url(&self, key: &CacheKey) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        match conn.get::<_, Option<String>>(key.as_str()).await {
            Ok(Some(url)) => {
                debug!(key = %key, "Cache hit in Redis");
                Ok(Some(url))
            }
            Ok(None) => {
                trace!(key = %key, "Cache miss in Redis");
                Ok(None)
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Redis error on get");
                Err(map_redis_error("failed to fetch value from Redis", e))
            }
        }
    }

    async fn set_url(&self, key: &CacheKey, url: &str, ttl: Duration) -> Result<()> {
        let mut conn = self.conn.clone();
        match conn
            .set_ex::<_, _, ()>(key.as_str(), url, ttl_seconds(ttl))
            .await
        {
            Ok(()) => {
                debug!(key = %key, ttl_secs = ttl_seconds(ttl), "Cached URL in Redis");
                Ok(())
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to cache URL in Redis");
                Err(map_redis_error("failed to write value to Redis", e))
            }
        }
    }

    async fn del(&self, key: &CacheKey) -> Result<()> {
        let mut conn = self.conn.clone();
        match conn.del::<_, ()>(key.as_str()).await {
            Ok(()) => {
                trace!(key = %key, "Removed URL from Redis cache");
                Ok(())
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to remove URL from Redis cache");
                Err(map_redis_error("failed to delete value from Redis", e))
            }
        }
    }
}
