use jiff::{SignedDuration, Timestamp};
use serde::{Deserialize, Serialize};
use snip_core::{ExpirationPolicy, ShortenParams, ShortenerError, UrlRecord};

#[derive(Debug, Deserialize)]
pub struct CreateUrlRequest {
    pub original_url: String,
    /// Lifetime of the short URL. Omitted means it never expires.
    #[serde(default)]
    pub expires_in_secs: Option<u64>,
}

impl CreateUrlRequest {
    /// Validates the request and turns it into shortener parameters.
    pub fn into_params(self) -> Result<ShortenParams, ShortenerError> {
        validate_url(&self.original_url)?;

        let expiration = match self.expires_in_secs {
            None => ExpirationPolicy::Never,
            Some(secs) => {
                let secs = i64::try_from(secs).map_err(|_| {
                    ShortenerError::InvalidRequest(format!("expires_in_secs is too large: {secs}"))
                })?;
                ExpirationPolicy::AfterDuration(SignedDuration::from_secs(secs))
            }
        };

        Ok(ShortenParams {
            original_url: self.original_url,
            expiration,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateUrlResponse {
    pub short_code: String,
    pub short_url: String,
    pub original_url: String,
    pub created_at: Timestamp,
    pub expires_at: Option<Timestamp>,
}

impl CreateUrlResponse {
    pub fn new(record: UrlRecord, base_url: &str) -> Self {
        Self {
            short_url: record.short_code.to_url(base_url),
            short_code: record.short_code.to_string(),
            original_url: record.original_url,
            created_at: record.created_at,
            expires_at: record.expires_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Checks that the URL has an http(s) scheme and a host, and that it can be
/// sent back verbatim in a `Location` header.
pub fn validate_url(url: &str) -> Result<(), ShortenerError> {
    if url.trim().is_empty() {
        return Err(ShortenerError::InvalidRequest(
            "URL cannot be empty".to_string(),
        ));
    }

    if url.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(ShortenerError::InvalidRequest(format!(
            "URL must not contain whitespace or control characters: {url:?}"
        )));
    }

    let Some((scheme, rest)) = url.split_once("://") else {
        return Err(ShortenerError::InvalidRequest(format!(
            "URL must have a valid scheme and host: {url}"
        )));
    };

    let scheme = scheme.to_ascii_lowercase();
    if scheme != "http" && scheme != "https" {
        return Err(ShortenerError::InvalidRequest(format!(
            "URL scheme must be http or https: {scheme}"
        )));
    }

    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let host = authority.rsplit('@').next().unwrap_or_default();
    if host.is_empty() || host.starts_with(':') {
        return Err(ShortenerError::InvalidRequest(format!(
            "URL must have a host: {url}"
        )));
    }

    Ok(())
}
