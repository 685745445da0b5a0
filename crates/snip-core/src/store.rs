use crate::error::StorageError;
use crate::shortcode::ShortCode;
use async_trait::async_trait;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// A stored URL record.
///
/// Only `click_count` ever changes after insertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlRecord {
    /// Identifier assigned by the store on insert.
    pub id: u64,
    /// The original URL that was shortened.
    pub original_url: String,
    /// The unique short code for this record.
    pub short_code: ShortCode,
    /// Number of recorded resolutions.
    pub click_count: u64,
    /// When the record was created.
    pub created_at: Timestamp,
    /// When the record expires, if ever.
    pub expires_at: Option<Timestamp>,
}

/// A record about to be inserted. The store assigns the id and starts the
/// click counter at zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUrlRecord {
    pub original_url: String,
    pub short_code: ShortCode,
    pub created_at: Timestamp,
    pub expires_at: Option<Timestamp>,
}

impl NewUrlRecord {
    /// Builds the stored form of this record with the given id.
    pub fn into_record(self, id: u64) -> UrlRecord {
        UrlRecord {
            id,
            original_url: self.original_url,
            short_code: self.short_code,
            click_count: 0,
            created_at: self.created_at,
            expires_at: self.expires_at,
        }
    }
}

/// A read-only view of a store.
#[async_trait]
pub trait ReadStore: Send + Sync + 'static {
    /// Retrieves the record for a given short code.
    /// Returns `None` if the code does not exist.
    async fn find_by_code(&self, code: &ShortCode) -> Result<Option<UrlRecord>>;

    /// Retrieves the oldest record pointing at `original_url`, if any.
    async fn find_by_original_url(&self, original_url: &str) -> Result<Option<UrlRecord>>;
}

/// Durable mapping from short code to [`UrlRecord`].
///
/// Implementations must be safe under concurrent use. In particular
/// [`increment_click_count`](UrlStore::increment_click_count) must be a single
/// atomic operation on the backend, never a read followed by a write.
#[async_trait]
pub trait UrlStore: ReadStore {
    /// Inserts a new record and returns it with its assigned id.
    /// Returns `Err(Conflict)` if the short code already exists.
    async fn insert(&self, record: NewUrlRecord) -> Result<UrlRecord>;

    /// Atomically adds one to the click counter of `code`.
    /// Returns `Err(NotFound)` if no record matches.
    async fn increment_click_count(&self, code: &ShortCode) -> Result<()>;
}

#[async_trait]
impl<T: ReadStore + ?Sized> ReadStore for Arc<T> {
    async fn find_by_code(&self, code: &ShortCode) -> Result<Option<UrlRecord>> {
        (**self).find_by_code(code).await
    }

    async fn find_by_original_url(&self, original_url: &str) -> Result<Option<UrlRecord>> {
        (**self).find_by_original_url(original_url).await
    }
}

#[async_trait]
impl<T: UrlStore + ?Sized> UrlStore for Arc<T> {
    async fn insert(&self, record: NewUrlRecord) -> Result<UrlRecord> {
        (**self).insert(record).await
    }

    async fn increment_click_count(&self, code: &ShortCode) -> Result<()> {
        (**self).increment_click_count(code).await
    }
}
