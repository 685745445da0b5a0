use async_trait::async_trait;
use snip_core::cache::Result;
use snip_core::{CacheKey, UrlCache};
use std::time::Duration;

/// A cache that stores nothing.
///
/// Used when caching is disabled: every read is a miss, so every resolution
/// goes to the store.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCache;

#[async_trait]
impl UrlCache for NoopCache {
    async fn get_url(&self, _key: &CacheKey) -> Result<Option<String>> {
        Ok(None)
    }

    async fn set_url(&self, _key: &CacheKey, _url: &str, _ttl: Duration) -> Result<()> {
        Ok(())
    }

    async fn del(&self, _key: &CacheKey) -> Result<()> {
        Ok(())
    }
}
