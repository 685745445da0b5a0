//! URL shortener service implementation.
//!
//! [`ShortenerService`] mints collision-free short codes and resolves them
//! through a cache-aside read path that records clicks in the store. Core
//! types are re-exported from `snip_core`.

pub mod config;
pub mod service;

pub use config::{ClickPolicy, ShortenerConfig};
pub use service::ShortenerService;
pub use snip_core::{ExpirationPolicy, ShortenParams, Shortener, ShortenerError};
