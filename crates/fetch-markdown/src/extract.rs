//! Readability-style main content extraction
//!
//! Reduces a full HTML document to a minimal fragment holding the
//! page's primary readable content. Candidates are ranked by a
//! content-density score (text volume plus punctuation, penalized by
//! link density) that is propagated up the ancestor chain, and the
//! winning container is merged with qualifying siblings.
//!
//! Extraction failure is soft: a page with nothing substantive yields
//! an [`ExtractedArticle`] with empty `content_html`, never an error.

use crate::dom::{Dom, NodeData, NodeId};
use std::collections::HashMap;
use tracing::debug;

/// Minimum text length for a block to credit its ancestors
const MIN_BLOCK_LENGTH: usize = 25;

/// Minimum text length for a sibling paragraph to be merged on its own
const SIBLING_PARAGRAPH_LENGTH: usize = 80;

/// Siblings above this fraction of the winner's score are merged in
const SIBLING_SCORE_FRACTION: f64 = 0.2;

/// Link-density ceiling for merged siblings
const SIBLING_LINK_DENSITY: f64 = 0.25;

/// Blocks that directly carry prose and seed the scoring pass
const TEXT_BLOCK_TAGS: &[&str] = &["p", "pre", "td", "blockquote"];

/// Elements dropped outright before scoring
const NOISE_TAGS: &[&str] = &[
    "script", "style", "noscript", "iframe", "svg", "canvas", "form", "button", "input", "select",
    "textarea", "video", "audio", "nav", "aside", "footer", "header",
];

/// Class/id fragments that mark likely boilerplate
const UNLIKELY_PATTERNS: &[&str] = &[
    "banner", "breadcrumb", "combx", "comment", "community", "cover-wrap", "disqus", "extra",
    "legends", "menu", "modal", "related", "remark", "replies", "rss", "shoutbox", "sidebar",
    "skyscraper", "social", "sponsor", "supplemental", "ad-break", "agegate", "pagination",
    "pager", "popup", "promo", "share", "masthead",
];

/// Class/id fragments that rescue an otherwise unlikely element
const LIKELY_PATTERNS: &[&str] = &[
    "article", "body", "column", "content", "main", "shadow", "post", "text", "blog", "story",
];

/// Tags never stripped on a class/id match
const PROTECTED_TAGS: &[&str] = &["html", "body", "article", "main"];

/// Tags allowed through into the output fragment
const KEEP_TAGS: &[&str] = &[
    "h1", "h2", "h3", "h4", "h5", "h6", "p", "ul", "ol", "li", "blockquote", "pre", "code", "a",
    "img", "em", "i", "strong", "b", "br", "hr",
];

/// Result of readability extraction
///
/// `content_html` is a minimal fragment retaining headings, paragraphs,
/// lists, blockquotes, images and links. An empty string signals that
/// nothing worth extracting was found; that is a sentinel state, not an
/// error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedArticle {
    /// Page title, from the most specific non-empty `<h1>`/`<title>`
    pub title: Option<String>,
    /// Author, from meta tags or a labeled byline element
    pub byline: Option<String>,
    /// Cleaned main-content fragment, empty on soft failure
    pub content_html: String,
}

/// Reduce a full HTML document to its main readable content
pub fn extract(html: &str) -> ExtractedArticle {
    let mut dom = Dom::parse(html);

    let title = find_title(&dom);
    let byline = find_byline(&dom);

    strip_noise(&mut dom);

    let scores = score_candidates(&dom);
    let winner = scores
        .iter()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(&id, &score)| (id, score));

    let mut content_html = match winner {
        Some((id, score)) if score > 0.0 => {
            debug!(score, "selected content candidate");
            serialize_with_siblings(&dom, id, score, &scores)
        }
        _ => {
            // No block cleared the scoring pass; fall back to whatever
            // is left of the body after noise removal.
            debug!("no scored candidate, falling back to body");
            let root = dom
                .elements_by_tag("body")
                .first()
                .copied()
                .unwrap_or_else(|| dom.root());
            serialize_children(&dom, root)
        }
    };

    if fragment_text(&content_html).trim().is_empty() {
        content_html = String::new();
    }

    ExtractedArticle {
        title,
        byline,
        content_html,
    }
}

/// Pick the page title from `<h1>` and `<title>` candidates
fn find_title(dom: &Dom) -> Option<String> {
    let h1s: Vec<String> = dom
        .elements_by_tag("h1")
        .into_iter()
        .map(|id| collapse(&dom.text_content(id)))
        .filter(|t| !t.is_empty())
        .collect();
    // A single h1 is the most specific signal; the title tag often
    // carries site-name suffixes.
    if h1s.len() == 1 {
        return Some(h1s[0].clone());
    }
    let doc_title = dom
        .elements_by_tag("title")
        .first()
        .map(|&id| collapse(&dom.text_content(id)))
        .filter(|t| !t.is_empty());
    doc_title.or_else(|| h1s.into_iter().next())
}

/// Pick the byline from author meta tags or a labeled element
fn find_byline(dom: &Dom) -> Option<String> {
    for id in dom.elements_by_tag("meta") {
        let name = dom
            .attr(id, "name")
            .or_else(|| dom.attr(id, "property"))
            .unwrap_or("");
        if name.eq_ignore_ascii_case("author") || name.eq_ignore_ascii_case("article:author") {
            if let Some(content) = dom.attr(id, "content") {
                let content = collapse(content);
                if !content.is_empty() {
                    return Some(content);
                }
            }
        }
    }
    for id in dom.descendants(dom.root()) {
        if dom.tag(id).is_none() {
            continue;
        }
        let marker = format!(
            "{} {} {}",
            dom.attr(id, "class").unwrap_or(""),
            dom.attr(id, "id").unwrap_or(""),
            dom.attr(id, "rel").unwrap_or("")
        )
        .to_lowercase();
        if marker.contains("author") || marker.contains("byline") {
            let text = collapse(&dom.text_content(id));
            if !text.is_empty() && text.chars().count() < 120 {
                return Some(text);
            }
        }
    }
    None
}

/// Drop non-content elements and likely boilerplate containers
fn strip_noise(dom: &mut Dom) {
    for id in dom.descendants(dom.root()) {
        let Some(tag) = dom.tag(id) else {
            continue;
        };
        if NOISE_TAGS.contains(&tag) {
            dom.detach(id);
            continue;
        }
        if PROTECTED_TAGS.contains(&tag) {
            continue;
        }
        let marker = format!(
            "{} {}",
            dom.attr(id, "class").unwrap_or(""),
            dom.attr(id, "id").unwrap_or("")
        )
        .to_lowercase();
        if UNLIKELY_PATTERNS.iter().any(|p| marker.contains(p))
            && !LIKELY_PATTERNS.iter().any(|p| marker.contains(p))
        {
            dom.detach(id);
        }
    }
}

/// Initial weight a container brings to its own candidacy
fn tag_weight(tag: &str) -> f64 {
    match tag {
        "article" | "main" => 8.0,
        "div" | "section" => 5.0,
        "pre" | "td" | "blockquote" => 3.0,
        "address" | "ul" | "ol" | "dl" | "dd" | "dt" | "li" => -3.0,
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "th" => -5.0,
        _ => 0.0,
    }
}

/// Content-density scoring with ancestor propagation
///
/// Each substantial text block earns points for length and comma
/// density and credits its ancestors with a decreasing share: the
/// parent in full, the grandparent half, the great-grandparent a sixth.
/// Final candidate scores are discounted by link density.
fn score_candidates(dom: &Dom) -> HashMap<NodeId, f64> {
    let mut scores: HashMap<NodeId, f64> = HashMap::new();

    for id in dom.descendants(dom.root()) {
        let Some(tag) = dom.tag(id) else {
            continue;
        };
        if !TEXT_BLOCK_TAGS.contains(&tag) {
            continue;
        }
        let text = dom.text_content(id);
        let text = text.trim();
        let len = text.chars().count();
        if len < MIN_BLOCK_LENGTH {
            continue;
        }
        let commas = text.matches(',').count() as f64;
        let block_score = 1.0 + commas + (len as f64 / 100.0).min(3.0);

        let mut ancestor = dom.parent(id);
        let mut level = 0usize;
        while let Some(aid) = ancestor {
            if level >= 3 {
                break;
            }
            let Some(ancestor_tag) = dom.tag(aid) else {
                break;
            };
            let divisor = match level {
                0 => 1.0,
                1 => 2.0,
                _ => (level * 3) as f64,
            };
            *scores.entry(aid).or_insert_with(|| tag_weight(ancestor_tag)) += block_score / divisor;
            ancestor = dom.parent(aid);
            level += 1;
        }
    }

    for (&id, score) in scores.iter_mut() {
        *score *= 1.0 - link_density(dom, id);
    }
    scores
}

/// Ratio of anchor text to total text within a subtree
fn link_density(dom: &Dom, id: NodeId) -> f64 {
    let total = dom.text_content(id).chars().count();
    if total == 0 {
        return 0.0;
    }
    let mut linked = 0usize;
    for desc in dom.descendants(id) {
        if dom.tag(desc) == Some("a") {
            linked += dom.text_content(desc).chars().count();
        }
    }
    linked as f64 / total as f64
}

/// Serialize the winner plus siblings that look like split-off parts of
/// the same article
fn serialize_with_siblings(
    dom: &Dom,
    winner: NodeId,
    winner_score: f64,
    scores: &HashMap<NodeId, f64>,
) -> String {
    let Some(parent) = dom.parent(winner) else {
        let mut out = String::new();
        serialize_node(dom, winner, &mut out);
        return out;
    };
    let threshold = (winner_score * SIBLING_SCORE_FRACTION).max(10.0);
    let mut out = String::new();
    for &sibling in dom.children(parent) {
        let include = sibling == winner
            || match scores.get(&sibling) {
                Some(&score) => {
                    score >= threshold && link_density(dom, sibling) < SIBLING_LINK_DENSITY
                }
                None => {
                    dom.tag(sibling) == Some("p")
                        && dom.text_content(sibling).trim().chars().count()
                            >= SIBLING_PARAGRAPH_LENGTH
                        && link_density(dom, sibling) < SIBLING_LINK_DENSITY
                }
            };
        if include {
            serialize_node(dom, sibling, &mut out);
        }
    }
    out
}

fn serialize_children(dom: &Dom, id: NodeId) -> String {
    let mut out = String::new();
    for &child in dom.children(id) {
        serialize_node(dom, child, &mut out);
    }
    out
}

/// Emit a minimal fragment: structural tags from the allowlist with
/// their link/media attributes, everything else unwrapped, layout and
/// scripting attributes discarded
fn serialize_node(dom: &Dom, id: NodeId, out: &mut String) {
    match &dom.node(id).data {
        NodeData::Text(text) => out.push_str(&escape_html(text)),
        NodeData::Element { name, .. } => {
            if KEEP_TAGS.contains(&name.as_str()) {
                out.push('<');
                out.push_str(name);
                if name == "a" {
                    if let Some(href) = dom.attr(id, "href") {
                        out.push_str(&format!(" href=\"{}\"", escape_attr(href)));
                    }
                }
                if name == "img" {
                    if let Some(src) = dom.attr(id, "src") {
                        out.push_str(&format!(" src=\"{}\"", escape_attr(src)));
                    }
                    if let Some(alt) = dom.attr(id, "alt") {
                        out.push_str(&format!(" alt=\"{}\"", escape_attr(alt)));
                    }
                }
                if matches!(name.as_str(), "br" | "hr" | "img") {
                    out.push_str("/>");
                    return;
                }
                out.push('>');
                for &child in dom.children(id) {
                    serialize_node(dom, child, out);
                }
                out.push_str("</");
                out.push_str(name);
                out.push('>');
            } else {
                // Unwrap containers the fragment does not keep
                for &child in dom.children(id) {
                    serialize_node(dom, child, out);
                }
            }
        }
        NodeData::Document => {
            for &child in dom.children(id) {
                serialize_node(dom, child, out);
            }
        }
    }
}

/// Plain text of a serialized fragment, used for the emptiness check
fn fragment_text(fragment: &str) -> String {
    let dom = Dom::parse(fragment);
    dom.text_content(dom.root())
}

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(value: &str) -> String {
    escape_html(value).replace('"', "&quot;")
}
