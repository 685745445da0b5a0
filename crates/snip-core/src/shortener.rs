use crate::shortcode::ShortCode;
use crate::store::UrlRecord;
use async_trait::async_trait;
use jiff::{SignedDuration, Timestamp};
use serde::{Deserialize, Serialize};

type Result<T> = std::result::Result<T, crate::error::ShortenerError>;

/// How the expiry timestamp of a new record is computed.
///
/// The timestamp is stored with the record; nothing in this workspace
/// enforces it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub enum ExpirationPolicy {
    /// The shortened URL never expires.
    #[default]
    Never,
    /// The shortened URL expires after a certain duration from now.
    AfterDuration(SignedDuration),
    /// The shortened URL expires at a specific timestamp.
    AtTimestamp(Timestamp),
}

/// Parameters for creating a shortened URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortenParams {
    /// The original URL to be shortened.
    pub original_url: String,
    /// The expiration policy for the shortened URL.
    pub expiration: ExpirationPolicy,
}

impl ShortenParams {
    /// Parameters for a URL that never expires.
    pub fn new(original_url: impl Into<String>) -> Self {
        Self {
            original_url: original_url.into(),
            expiration: ExpirationPolicy::Never,
        }
    }
}

#[async_trait]
pub trait Shortener: Send + Sync + 'static {
    /// Mints a fresh, unique short code for the URL and persists the record.
    async fn create_short_url(&self, params: ShortenParams) -> Result<UrlRecord>;

    /// Resolves a short code to its original URL, recording a click.
    ///
    /// Fails with `NotFound` if the code does not exist.
    async fn resolve_and_record_click(&self, code: &ShortCode) -> Result<String>;
}
