use crate::config::{ClickPolicy, ShortenerConfig};
use async_trait::async_trait;
use jiff::Timestamp;
use snip_core::{
    CacheKey, ExpirationPolicy, NewUrlRecord, ShortCode, ShortenParams, Shortener,
    ShortenerError, StorageError, UrlCache, UrlRecord, UrlStore,
};
use snip_generator::Generator;
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

type Result<T> = std::result::Result<T, ShortenerError>;

/// The concrete [`Shortener`].
///
/// Wraps a [`UrlStore`], a [`UrlCache`] and a [`Generator`]:
/// - creation draws codes from the generator until one is free in the store,
///   bounded by [`ShortenerConfig::max_attempts`]
/// - resolution reads through the cache, populating it on a miss, and records
///   clicks with the store's atomic increment
///
/// The service holds no mutable state of its own, so it can be shared across
/// request tasks behind an `Arc`.
pub struct ShortenerService<S: ?Sized, C: ?Sized, G: ?Sized> {
    store: Arc<S>,
    cache: Arc<C>,
    generator: Arc<G>,
    config: ShortenerConfig,
}

impl<S, C, G> ShortenerService<S, C, G>
where
    S: UrlStore,
    C: UrlCache,
    G: Generator,
{
    /// Creates a service with the default [`ShortenerConfig`].
    pub fn new(store: S, cache: C, generator: G) -> Self {
        Self::from_shared(Arc::new(store), Arc::new(cache), Arc::new(generator))
    }
}

impl<S, C, G> ShortenerService<S, C, G>
where
    S: UrlStore + ?Sized,
    C: UrlCache + ?Sized,
    G: Generator + ?Sized,
{
    /// Creates a service from already shared collaborators, e.g. trait objects
    /// picked at startup.
    pub fn from_shared(store: Arc<S>, cache: Arc<C>, generator: Arc<G>) -> Self {
        Self {
            store,
            cache,
            generator,
            config: ShortenerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ShortenerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ShortenerConfig {
        &self.config
    }

    fn expires_at(now: Timestamp, expiration: &ExpirationPolicy) -> Result<Option<Timestamp>> {
        match expiration {
            ExpirationPolicy::Never => Ok(None),
            ExpirationPolicy::AfterDuration(duration) => now
                .checked_add(*duration)
                .map(Some)
                .map_err(|e| ShortenerError::InvalidRequest(format!("invalid expiration: {e}"))),
            ExpirationPolicy::AtTimestamp(timestamp) => Ok(Some(*timestamp)),
        }
    }

    /// Cache failures never fail a resolution; they read as a miss.
    async fn cached_url(&self, key: &CacheKey) -> Option<String> {
        match self.cache.get_url(key).await {
            Ok(url) => url,
            Err(e) => {
                warn!(key = %key, error = %e, "cache read failed, falling back to store");
                None
            }
        }
    }

    async fn remember(&self, key: &CacheKey, url: &str) {
        if let Err(e) = self.cache.set_url(key, url, self.config.cache_ttl).await {
            warn!(key = %key, error = %e, "failed to populate cache");
        }
    }

    async fn record_click(&self, code: &ShortCode) -> Result<()> {
        match self.store.increment_click_count(code).await {
            Ok(()) => Ok(()),
            Err(StorageError::NotFound(code)) => Err(ShortenerError::NotFound(code)),
            Err(e) => Err(e.into()),
        }
    }
}

impl<S: ?Sized, C: ?Sized, G: ?Sized> Clone for ShortenerService<S, C, G> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            cache: Arc::clone(&self.cache),
            generator: Arc::clone(&self.generator),
            config: self.config.clone(),
        }
    }
}

#[async_trait]
impl<S, C, G> Shortener for ShortenerService<S, C, G>
where
    S: UrlStore + ?Sized,
    C: UrlCache + ?Sized,
    G: Generator + ?Sized,
{
    async fn create_short_url(&self, params: ShortenParams) -> Result<UrlRecord> {
        let ShortenParams {
            original_url,
            expiration,
        } = params;

        if original_url.trim().is_empty() {
            return Err(ShortenerError::InvalidRequest(
                "original URL cannot be empty".to_string(),
            ));
        }

        let attempts = self.config.max_attempts;
        for attempt in 1..=attempts {
            let code: ShortCode = self.generator.generate().into();

            if self.store.find_by_code(&code).await?.is_some() {
                warn!(code = %code, attempt, "generated short code already taken, retrying");
                continue;
            }

            let created_at = Timestamp::now();
            let record = NewUrlRecord {
                original_url: original_url.clone(),
                short_code: code,
                created_at,
                expires_at: Self::expires_at(created_at, &expiration)?,
            };

            match self.store.insert(record).await {
                Ok(stored) => {
                    info!(
                        code = %stored.short_code,
                        id = stored.id,
                        attempt,
                        "created short URL"
                    );
                    return Ok(stored);
                }
                // Another creator claimed the code between the check and the insert.
                Err(StorageError::Conflict(code)) => {
                    warn!(code = %code, attempt, "lost insert race for short code, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        warn!(attempts, "gave up looking for a free short code");
        Err(ShortenerError::CodeSpaceExhausted { attempts })
    }

    async fn resolve_and_record_click(&self, code: &ShortCode) -> Result<String> {
        let key = CacheKey::for_code(code);

        if let Some(url) = self.cached_url(&key).await {
            trace!(code = %code, "resolved from cache");
            if self.config.click_policy == ClickPolicy::EveryResolution {
                self.record_click(code).await?;
            }
            return Ok(url);
        }

        let Some(record) = self.store.find_by_code(code).await? else {
            debug!(code = %code, "short code not found");
            return Err(ShortenerError::NotFound(code.to_string()));
        };

        self.remember(&key, &record.original_url).await;
        self.record_click(code).await?;

        trace!(code = %code, "resolved from store");
        Ok(record.original_url)
    }
}
