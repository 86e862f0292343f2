//! Pipeline orchestration
//!
//! Sequences the policy check, the fetch, content-type routing and the
//! simplify/raw paths into a single call: a request either fails with a
//! typed error or yields a complete output string, never partial
//! output. Extraction finding nothing is the one documented soft
//! failure and yields [`EXTRACTION_FAILED_PLACEHOLDER`](crate::EXTRACTION_FAILED_PLACEHOLDER)
//! instead of an error, so batch callers are not interrupted by a
//! single bad page.

use crate::classify::{classify, ContentDecision, HTML_TAG_THRESHOLD};
use crate::error::Error;
use crate::extract::extract;
use crate::render::{render, RenderOptions};
use crate::{http, robots, DEFAULT_USER_AGENT, EXTRACTION_FAILED_PLACEHOLDER};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Options for a fetch-and-simplify run
///
/// All fields are independently settable; `Default` gives the standard
/// behavior: project user-agent, 30 second timeout, robots.txt
/// honored, relative links rewritten.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Custom User-Agent, defaults to a project-identifying string
    pub user_agent: Option<String>,
    /// Timeout applied to each network call
    pub timeout: Duration,
    /// HTTP/HTTPS proxy URL
    pub proxy_url: Option<String>,
    /// Skip the robots.txt check entirely
    pub ignore_robots_txt: bool,
    /// Return the raw body without simplification
    pub force_raw: bool,
    /// Base URL for relative-link rewriting, inferred from the fetched
    /// URL when omitted
    pub base_url: Option<String>,
    /// Rewrite relative links against the base URL (default true)
    pub rewrite_relative_urls: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            user_agent: None,
            timeout: Duration::from_secs(30),
            proxy_url: None,
            ignore_robots_txt: false,
            force_raw: false,
            base_url: None,
            rewrite_relative_urls: true,
        }
    }
}

/// Fetch a URL and return its main content as Markdown
///
/// Uses default options. See [`fetch_markdown_with_options`].
pub async fn fetch_markdown(url: &str) -> Result<String, Error> {
    fetch_markdown_with_options(url, FetchOptions::default()).await
}

/// Fetch a URL and return its main content as Markdown, with options
///
/// Pipeline: policy check (unless `ignore_robots_txt`), fetch,
/// content-type routing, then either readability extraction plus
/// Markdown rendering or raw pass-through. Non-HTML payloads are
/// returned raw behind a note naming the content type; forced-raw HTML
/// is returned verbatim.
pub async fn fetch_markdown_with_options(
    url: &str,
    options: FetchOptions,
) -> Result<String, Error> {
    if url.is_empty() {
        return Err(Error::MissingUrl);
    }
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(Error::InvalidUrlScheme);
    }
    let parsed = Url::parse(url).map_err(|_| Error::InvalidUrlScheme)?;

    let user_agent = options.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT);
    let client = http::build_client(user_agent, options.timeout, options.proxy_url.as_deref())?;

    if options.ignore_robots_txt {
        debug!(%url, "robots.txt check skipped");
    } else {
        robots::check_may_fetch(&client, &parsed, user_agent).await?;
    }

    let page = http::fetch_page(&client, &parsed).await?;

    match classify(&page.body, page.content_type.as_deref(), options.force_raw) {
        ContentDecision::Simplify => {
            // Base on the URL the page was actually served from, so
            // relative links survive redirects
            let render_options = RenderOptions {
                base_url: options.base_url.clone().or_else(|| Some(page.url.to_string())),
                rewrite_relative_urls: options.rewrite_relative_urls,
            };
            Ok(simplify(&page.body, &render_options))
        }
        ContentDecision::RawHtmlForced => Ok(page.body),
        ContentDecision::NonHtmlRaw { content_type } => Ok(format!(
            "Content type {} cannot be simplified to markdown, but here is the raw content:\n{}",
            content_type, page.body
        )),
    }
}

/// Convert an HTML string directly to Markdown, bypassing fetch and
/// policy checks
///
/// This is the entry point for local files and caller-supplied HTML.
/// A declared non-HTML content type is rejected with
/// [`Error::ContentType`]; a payload that does not open like an HTML
/// document is rejected with [`Error::ToMarkdown`].
pub fn html_to_markdown(
    html: &str,
    content_type: Option<&str>,
    options: &FetchOptions,
) -> Result<String, Error> {
    if let Some(ct) = content_type {
        if !ct.is_empty() && !ct.to_lowercase().contains("text/html") {
            return Err(Error::ContentType(ct.to_string()));
        }
    }
    let head: String = html.chars().take(HTML_TAG_THRESHOLD).collect();
    if !head.to_lowercase().contains("<html") {
        return Err(Error::ToMarkdown(head));
    }

    let render_options = RenderOptions {
        base_url: options.base_url.clone(),
        rewrite_relative_urls: options.rewrite_relative_urls,
    };
    Ok(simplify(html, &render_options))
}

/// Extract and render, soft-failing to the placeholder
fn simplify(html: &str, render_options: &RenderOptions) -> String {
    let article = extract(html);
    if article.content_html.is_empty() {
        warn!("extraction found no substantive content");
        return EXTRACTION_FAILED_PLACEHOLDER.to_string();
    }
    render(&article.content_html, render_options)
}
