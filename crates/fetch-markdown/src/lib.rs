//! fetch-markdown - fetch web pages as clean, article-only Markdown
//!
//! This crate fetches a web page (or accepts local HTML), verifies the
//! fetch against the site's robots.txt policy, decides whether the
//! payload is simplifiable HTML, reduces it to its main readable
//! content with a readability-style heuristic, and renders the result
//! as Markdown.
//!
//! ## Pipeline
//!
//! Policy gate → HTTP fetch → content-type routing → readability
//! extraction → Markdown rendering. Non-HTML payloads pass through raw
//! behind a note naming their content type; a page where extraction
//! finds nothing yields a fixed placeholder string rather than an
//! error.
//!
//! ## Example
//!
//! ```no_run
//! use fetch_markdown::{fetch_markdown_with_options, FetchOptions};
//!
//! # async fn run() -> Result<(), fetch_markdown::Error> {
//! let markdown = fetch_markdown_with_options(
//!     "https://example.com/article",
//!     FetchOptions::default(),
//! )
//! .await?;
//! println!("{}", markdown);
//! # Ok(())
//! # }
//! ```

pub mod classify;
mod client;
pub mod dom;
mod error;
pub mod extract;
mod http;
pub mod render;
pub mod robots;

pub use classify::{classify, ContentDecision};
pub use client::{fetch_markdown, fetch_markdown_with_options, html_to_markdown, FetchOptions};
pub use error::Error;
pub use extract::{extract, ExtractedArticle};
pub use http::FetchedPage;
pub use render::{render, RenderOptions};
pub use robots::RobotsPolicy;

/// Default User-Agent string
pub const DEFAULT_USER_AGENT: &str = "fetch-markdown/0.1";

/// Placeholder returned when extraction finds no substantive content
///
/// This is a successful outcome at the type level, not an error: batch
/// callers still receive a string result for pages that cannot be
/// simplified.
pub const EXTRACTION_FAILED_PLACEHOLDER: &str =
    "<error>Page failed to be simplified from HTML</error>";
