//! Core types and traits for the snip URL shortener.
//!
//! This crate provides the data model, the error taxonomy and the collaborator
//! contracts (store, cache, shortener) shared by every other crate.

pub mod cache;
pub mod error;
pub mod shortcode;
pub mod shortener;
pub mod store;

pub use cache::{CacheKey, UrlCache};
pub use error::{CacheError, CoreError, ShortenerError, StorageError};
pub use shortcode::ShortCode;
pub use shortener::{ExpirationPolicy, ShortenParams, Shortener};
pub use store::{NewUrlRecord, ReadStore, UrlRecord, UrlStore};
