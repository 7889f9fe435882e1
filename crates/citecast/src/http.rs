//! Shared reqwest plumbing for the LLM adapters and bibliographic lookups.

use std::time::Duration;

use log::warn;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value;

use crate::error::{CitecastError, Result};
use crate::sanitize::sanitize_body;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Maximum length of an upstream error body quoted in logs.
const MAX_ERROR_BODY_LENGTH: usize = 200;

/// Builds a client whose requests are cut off after `timeout`.
pub fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .connect_timeout(CONNECT_TIMEOUT.min(timeout))
        .timeout(timeout)
        .user_agent(concat!("citecast/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| CitecastError::Application {
            message: format!("Failed to build HTTP client: {}", e),
            source: Some(Box::new(e)),
        })
}

/// Reads a `Retry-After` header given in whole seconds.
pub fn parse_retry_after(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

/// Sends `request` and decodes a JSON body, mapping failures onto the error
/// taxonomy: 429 is a rate limit, other non-2xx carry their status, and
/// transport problems carry none.
pub async fn send_json(service: &str, request: RequestBuilder) -> Result<(StatusCode, Value)> {
    let response = request.send().await.map_err(|e| {
        let message = if e.is_timeout() {
            format!("{} request timed out", service)
        } else {
            format!("{} request failed: {}", service, e)
        };
        CitecastError::external(service, None, message)
    })?;

    let status = response.status();

    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(CitecastError::RateLimit {
            service: service.to_string(),
            retry_after_seconds: parse_retry_after(response.headers()),
        });
    }

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        warn!(
            "{} returned {}: {}",
            service,
            status.as_u16(),
            sanitize_body(&body, MAX_ERROR_BODY_LENGTH)
        );
        return Err(CitecastError::external(
            service,
            Some(status.as_u16()),
            format!("{} request failed with status {}", service, status.as_u16()),
        ));
    }

    let payload = response.json::<Value>().await.map_err(|e| {
        CitecastError::external(
            service,
            Some(status.as_u16()),
            format!("{} returned an unreadable body: {}", service, e),
        )
    })?;

    Ok((status, payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_parse_retry_after_seconds() {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static(" 7 "));
        assert_eq!(parse_retry_after(&headers), Some(7));
    }

    #[test]
    fn test_parse_retry_after_ignores_dates() {
        let mut headers = HeaderMap::new();
        headers.insert(
            RETRY_AFTER,
            HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"),
        );
        assert_eq!(parse_retry_after(&headers), None);
        assert_eq!(parse_retry_after(&HeaderMap::new()), None);
    }

    #[test]
    fn test_build_client() {
        assert!(build_client(Duration::from_millis(500)).is_ok());
    }
}
