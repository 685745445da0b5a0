//! [`UrlCache`](snip_core::UrlCache) implementations for the resolution path.

pub mod layered;
pub mod moka;
pub mod noop;
pub mod redis;

pub use self::moka::{CacheConfig, MokaUrlCache};
pub use self::redis::RedisUrlCache;
pub use layered::LayeredCache;
pub use noop::NoopCache;
pub use snip_core::cache::Result;
pub use snip_core::{CacheError, CacheKey, UrlCache};
