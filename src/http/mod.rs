//! Authenticated HTTP client and request plumbing.

pub mod client;
pub mod request;

pub use client::ApiClient;
pub use request::{FileUpload, MultipartBody, RequestBody, RequestDescriptor, RequestOptions};

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};

use crate::error::InsurError;

/// Build the base reqwest client shared by API calls and token refresh.
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client, InsurError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .pool_max_idle_per_host(10)
        .default_headers(default_headers())
        .build()
        .map_err(|err| InsurError::Configuration(format!("failed to build HTTP client: {err}")))
}

/// JSON headers applied to every request; multipart bodies override the
/// content type per request.
pub fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers
}

/// Parse a response body: empty → `Null`, JSON → value, anything else → string.
pub fn parse_body(text: &str) -> serde_json::Value {
    if text.trim().is_empty() {
        return serde_json::Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| serde_json::Value::String(text.to_string()))
}
