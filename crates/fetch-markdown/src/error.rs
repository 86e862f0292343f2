//! Error types for fetch-markdown

use thiserror::Error;

/// Errors that can occur while fetching and simplifying a page
#[derive(Debug, Error)]
pub enum Error {
    /// URL is missing
    #[error("Missing required parameter: url")]
    MissingUrl,

    /// URL has invalid scheme
    #[error("Invalid URL: must start with http:// or https://")]
    InvalidUrlScheme,

    /// robots.txt forbids fetching the page for the configured user-agent
    #[error("{0}")]
    PolicyDenied(String),

    /// Failed to build HTTP client
    #[error("Failed to create HTTP client")]
    ClientBuild(#[source] reqwest::Error),

    /// Transport failure or error status on the robots.txt or content request
    #[error("Failed to fetch {url}: {reason}")]
    Fetch {
        /// URL that was being fetched
        url: String,
        /// Human-readable cause, includes the status code for HTTP errors
        reason: String,
        /// Underlying transport error, when there is one
        #[source]
        source: Option<reqwest::Error>,
    },

    /// Payload declared as non-HTML when HTML input was required
    #[error("Received non-html content type {0}")]
    ContentType(String),

    /// Payload is not a recognizable HTML document
    #[error("Not a valid HTML document. Here are the first characters:\n{0}")]
    ToMarkdown(String),
}

impl Error {
    /// Wrap a transport-level reqwest error for the given URL
    pub(crate) fn transport(url: &str, err: reqwest::Error) -> Self {
        let reason = if err.is_timeout() {
            "request timed out".to_string()
        } else if err.is_connect() {
            "failed to connect to server".to_string()
        } else {
            err.to_string()
        };
        Error::Fetch {
            url: url.to_string(),
            reason,
            source: Some(err),
        }
    }

    /// Error for an HTTP response with status >= 400
    pub(crate) fn status(url: &str, status: u16) -> Self {
        Error::Fetch {
            url: url.to_string(),
            reason: format!("status code {}", status),
            source: None,
        }
    }
}
