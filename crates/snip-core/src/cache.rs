use crate::error::CacheError;
use crate::shortcode::ShortCode;
use async_trait::async_trait;
use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;

/// Prefix shared by every resolution cache key.
pub const KEY_PREFIX: &str = "url:";

/// Key under which a resolved URL is cached: `"url:" + short code`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn for_code(code: &ShortCode) -> Self {
        Self(format!("{KEY_PREFIX}{code}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A TTL-bounded cache of resolved destination URLs.
///
/// Only the original URL string is cached, never the full record: the click
/// counter changes on every store read and would be stale immediately.
/// Callers treat every error from this trait as a cache miss.
#[async_trait]
pub trait UrlCache: Send + Sync + 'static {
    /// Get the cached URL.
    ///
    /// Returns `Ok(None)` if the key is not in the cache.
    async fn get_url(&self, key: &CacheKey) -> Result<Option<String>>;

    /// Store a URL that expires after `ttl`.
    async fn set_url(&self, key: &CacheKey, url: &str, ttl: Duration) -> Result<()>;

    /// Remove a cached URL.
    ///
    /// It is not an error if the key does not exist.
    async fn del(&self, key: &CacheKey) -> Result<()>;
}

#[async_trait]
impl<T: UrlCache + ?Sized> UrlCache for Arc<T> {
    async fn get_url(&self, key: &CacheKey) -> Result<Option<String>> {
        (**self).get_url(key).await
    }

    async fn set_url(&self, key: &CacheKey, url: &str, ttl: Duration) -> Result<()> {
        (**self).set_url(key, url, ttl).await
    }

    async fn del(&self, key: &CacheKey) -> Result<()> {
        (**self).del(key).await
    }
}
