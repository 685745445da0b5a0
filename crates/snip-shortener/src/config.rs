use std::time::Duration;
use typed_builder::TypedBuilder;

/// Whether a resolution served from the cache counts as a click.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClickPolicy {
    /// Only resolutions that read the store increment the counter. Cache hits
    /// are not counted, so the counter undercounts while an entry is cached.
    #[default]
    StoreReadsOnly,
    /// Every successful resolution increments the counter, cached or not.
    EveryResolution,
}

/// Tuning knobs for [`ShortenerService`](crate::ShortenerService).
#[derive(Debug, Clone, TypedBuilder)]
pub struct ShortenerConfig {
    /// Generation attempts before giving up with `CodeSpaceExhausted`.
    /// Both pre-check hits and insert conflicts consume an attempt.
    #[builder(default = 16)]
    pub max_attempts: usize,
    /// How long a resolved URL stays in the cache.
    #[builder(default = Duration::from_secs(3600))]
    pub cache_ttl: Duration,
    #[builder(default)]
    pub click_policy: ClickPolicy,
}

impl Default for ShortenerConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}
