//! HTTP fetching
//!
//! A thin wrapper over reqwest: one GET per call, redirects followed,
//! no retries. Status >= 400 and transport failures both surface as
//! [`Error::Fetch`]; retry policy belongs to the caller.

use crate::error::Error;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Result of a single GET request
///
/// Produced once per request and consumed by the content-type router.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Response body as text
    pub body: String,
    /// Raw `content-type` response header, when present
    pub content_type: Option<String>,
    /// HTTP status code
    pub status: u16,
    /// Final URL after redirects; relative links on the page resolve
    /// against this, not the request URL
    pub url: Url,
}

/// Build the HTTP client used for both the robots.txt and the content
/// request
///
/// The User-Agent is installed as a default header so both requests
/// carry the same identity. The timeout applies independently to each
/// request made through the client.
pub fn build_client(
    user_agent: &str,
    timeout: Duration,
    proxy_url: Option<&str>,
) -> Result<reqwest::Client, Error> {
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_str(user_agent)
            .unwrap_or_else(|_| HeaderValue::from_static("fetch-markdown")),
    );

    let mut builder = reqwest::Client::builder()
        .default_headers(headers)
        .timeout(timeout);

    if let Some(proxy) = proxy_url {
        builder = builder.proxy(reqwest::Proxy::all(proxy).map_err(Error::ClientBuild)?);
    }

    builder.build().map_err(Error::ClientBuild)
}

/// Perform one GET request and return body, content type and status
pub async fn fetch_page(client: &reqwest::Client, url: &Url) -> Result<FetchedPage, Error> {
    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|e| Error::transport(url.as_str(), e))?;

    let status = response.status().as_u16();
    if status >= 400 {
        return Err(Error::status(url.as_str(), status));
    }

    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());
    let final_url = response.url().clone();

    let body = response
        .text()
        .await
        .map_err(|e| Error::transport(url.as_str(), e))?;

    debug!(status, content_type = content_type.as_deref(), bytes = body.len(), "fetched page");

    Ok(FetchedPage {
        body,
        content_type,
        status,
        url: final_url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_client_defaults() {
        let client = build_client("test-agent/1.0", Duration::from_secs(5), None);
        assert!(client.is_ok());
    }

    #[test]
    fn test_build_client_with_proxy() {
        let client = build_client(
            "test-agent/1.0",
            Duration::from_secs(5),
            Some("http://127.0.0.1:8080"),
        );
        assert!(client.is_ok());
    }

    #[test]
    fn test_build_client_rejects_bad_proxy() {
        let result = build_client("test-agent/1.0", Duration::from_secs(5), Some("not a url"));
        assert!(matches!(result, Err(Error::ClientBuild(_))));
    }
}
