use async_trait::async_trait;
use snip_core::cache::Result;
use snip_core::{CacheKey, UrlCache};
use std::time::Duration;
use tracing::{debug, trace};

/// A multi-layer cache that composes two cache implementations.
///
/// L1 is typically a fast, local cache (e.g. [`MokaUrlCache`](crate::MokaUrlCache))
/// and L2 a slower, shared cache (e.g. [`RedisUrlCache`](crate::RedisUrlCache)).
///
/// # Operation Strategy
///
/// - **Get**: Try L1 first, if miss try L2. If L2 has the value, populate L1
///   with it for `backfill_ttl`. L2 does not report the remaining lifetime of
///   its entries, so keep `backfill_ttl` short.
/// - **Set**: Write to both L2 and L1 with the caller's TTL.
/// - **Delete**: Remove from both L1 and L2.
///
/// # Example
///
/// ```rust
/// use snip_cache::{LayeredCache, MokaUrlCache};
/// use std::time::Duration;
///
/// let l1 = MokaUrlCache::with_capacity(10_000);
/// let l2 = MokaUrlCache::with_capacity(100_000);
/// let cache = LayeredCache::new(l1, l2, Duration::from_secs(60));
/// ```
#[derive(Debug, Clone)]
pub struct LayeredCache<L1, L2> {
    l1: L1,
    l2: L2,
    backfill_ttl: Duration,
}

impl<L1, L2> LayeredCache<L1, L2> {
    /// Creates a new layered cache with the given L1 and L2 caches.
    pub fn new(l1: L1, l2: L2, backfill_ttl: Duration) -> Self {
        Self {
            l1,
            l2,
            backfill_ttl,
        }
    }

    /// Returns a reference to the L1 cache.
    pub fn l1(&self) -> &L1 {
        &self.l1
    }

    /// Returns a reference to the L2 cache.
    pub fn l2(&self) -> &L2 {
        &self.l2
    }

    /// Consumes the layered cache and returns the inner caches.
    pub fn into_inner(self) -> (L1, L2) {
        (self.l1, self.l2)
    }
}

#[async_trait]
impl<L1, L2> UrlCache for LayeredCache<L1, L2>
where
    L1: UrlCache,
    L2: UrlCache,
{
    async fn get_url(&self, key: &CacheKey) -> Result<Option<String>> {
        if let Some(url) = self.l1.get_url(key).await? {
            debug!(key = %key, "L1 cache hit");
            return Ok(Some(url));
        }
        trace!(key = %key, "L1 cache miss, trying L2");

        match self.l2.get_url(key).await? {
            Some(url) => {
                debug!(key = %key, "L2 cache hit, backfilling L1");
                self.l1.set_url(key, &url, self.backfill_ttl).await?;
                Ok(Some(url))
            }
            None => {
                trace!(key = %key, "L2 cache miss");
                Ok(None)
            }
        }
    }

    async fn set_url(&self, key: &CacheKey, url: &str, ttl: Duration) -> Result<()> {
        // L2 first so that L1 never holds a value the shared layer lacks.
        self.l2.set_url(key, url, ttl).await?;
        self.l1.set_url(key, url, ttl).await?;
        debug!(key = %key, "Stored URL in both cache layers");
        Ok(())
    }

    async fn del(&self, key: &CacheKey) -> Result<()> {
        self.l1.del(key).await?;
        self.l2.del(key).await?;
        trace!(key = %key, "Removed URL from both cache layers");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MokaUrlCache;
    use snip_core::ShortCode;

    const HOUR: Duration = Duration::from_secs(3600);

    fn key(s: &str) -> CacheKey {
        CacheKey::for_code(&ShortCode::new_unchecked(s))
    }

    fn create_test_cache() -> LayeredCache<MokaUrlCache, MokaUrlCache> {
        let l1 = MokaUrlCache::with_capacity(100);
        let l2 = MokaUrlCache::with_capacity(100);
        LayeredCache::new(l1, l2, Duration::from_secs(60))
    }

    #[tokio::test]
    async fn layered_cache_get_from_l1() {
        let cache = create_test_cache();
        let k = key("abc1234");

        cache.l1.set_url(&k, "https://example.com", HOUR).await.unwrap();

        let result = cache.get_url(&k).await.unwrap();
        assert_eq!(result.as_deref(), Some("https://example.com"));
    }

    #[tokio::test]
    async fn layered_cache_get_backfills_l1_from_l2() {
        let cache = create_test_cache();
        let k = key("abc1234");

        cache.l2.set_url(&k, "https://example.com", HOUR).await.unwrap();
        assert!(cache.l1.get_url(&k).await.unwrap().is_none());

        let result = cache.get_url(&k).await.unwrap();
        assert_eq!(result.as_deref(), Some("https://example.com"));

        assert_eq!(
            cache.l1.get_url(&k).await.unwrap().as_deref(),
            Some("https://example.com")
        );
    }

    #[tokio::test]
    async fn layered_cache_backfill_uses_backfill_ttl() {
        let l1 = MokaUrlCache::with_capacity(100);
        let l2 = MokaUrlCache::with_capacity(100);
        let cache = LayeredCache::new(l1, l2, Duration::from_millis(50));
        let k = key("abc1234");

        cache.l2.set_url(&k, "https://example.com", HOUR).await.unwrap();
        cache.get_url(&k).await.unwrap();

        tokio::time::sleep(Duration::from_millis(150)).await;

        assert!(cache.l1.get_url(&k).await.unwrap().is_none());
        assert!(cache.l2.get_url(&k).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn layered_cache_set_writes_to_both() {
        let cache = create_test_cache();
        let k = key("abc1234");

        cache.set_url(&k, "https://example.com", HOUR).await.unwrap();

        assert!(cache.l1.get_url(&k).await.unwrap().is_some());
        assert!(cache.l2.get_url(&k).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn layered_cache_del_removes_from_both() {
        let cache = create_test_cache();
        let k = key("abc1234");

        cache.set_url(&k, "https://example.com", HOUR).await.unwrap();
        cache.del(&k).await.unwrap();

        assert!(cache.l1.get_url(&k).await.unwrap().is_none());
        assert!(cache.l2.get_url(&k).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn layered_cache_miss_when_both_empty() {
        let cache = create_test_cache();

        assert!(cache.get_url(&key("abc1234")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn layered_cache_into_inner() {
        let cache = create_test_cache();
        let k = key("abc1234");
        cache.set_url(&k, "https://example.com", HOUR).await.unwrap();

        let (l1, l2) = cache.into_inner();

        assert!(l1.get_url(&k).await.unwrap().is_some());
        assert!(l2.get_url(&k).await.unwrap().is_some());
    }
}
