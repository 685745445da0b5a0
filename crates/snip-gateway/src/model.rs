mod url;

pub use url::{validate_url, CreateUrlRequest, CreateUrlResponse, ErrorResponse, HealthResponse};
