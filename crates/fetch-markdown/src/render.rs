//! Markdown rendering of extracted article fragments
//!
//! Walks a cleaned HTML fragment and emits Markdown: ATX headings,
//! fenced code blocks, `-`/`1.` list markers with nesting, `>` quote
//! prefixes, and `[text](href)` / `![alt](src)` links and images.
//! Relative URLs are resolved against a base URL when rewriting is
//! enabled, which is the default.

use crate::dom::{Dom, NodeData, NodeId};
use url::Url;

/// Options controlling Markdown output
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Base URL that relative `href`/`src` values are resolved against
    pub base_url: Option<String>,
    /// Resolve relative URLs against `base_url` (default true)
    pub rewrite_relative_urls: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            base_url: None,
            rewrite_relative_urls: true,
        }
    }
}

/// Render an extracted HTML fragment as Markdown
pub fn render(article_html: &str, options: &RenderOptions) -> String {
    let dom = Dom::parse(article_html);
    let renderer = Renderer {
        dom: &dom,
        base: options
            .base_url
            .as_deref()
            .and_then(|raw| Url::parse(raw).ok()),
        rewrite: options.rewrite_relative_urls,
    };
    let mut out = String::new();
    for &child in dom.children(dom.root()) {
        renderer.block(child, &mut out);
    }
    tidy(&out)
}

struct Renderer<'a> {
    dom: &'a Dom,
    base: Option<Url>,
    rewrite: bool,
}

impl Renderer<'_> {
    /// Render a node in block position
    fn block(&self, id: NodeId, out: &mut String) {
        let Some(tag) = self.dom.tag(id) else {
            self.inline(id, out);
            return;
        };
        match tag {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = tag[1..].parse::<usize>().unwrap_or(1);
                let mut text = String::new();
                self.inline_children(id, &mut text);
                out.push_str("\n\n");
                out.push_str(&"#".repeat(level));
                out.push(' ');
                out.push_str(text.trim());
                out.push_str("\n\n");
            }
            "p" => {
                let mut text = String::new();
                self.inline_children(id, &mut text);
                out.push_str("\n\n");
                out.push_str(text.trim());
                out.push_str("\n\n");
            }
            "hr" => out.push_str("\n\n---\n\n"),
            "pre" => {
                let code = self.dom.text_content(id);
                out.push_str("\n\n```\n");
                out.push_str(code.trim_matches('\n'));
                out.push_str("\n```\n\n");
            }
            "blockquote" => {
                let mut inner = String::new();
                for &child in self.dom.children(id) {
                    self.block(child, &mut inner);
                }
                out.push_str("\n\n");
                for line in tidy(&inner).lines() {
                    if line.is_empty() {
                        out.push_str(">\n");
                    } else {
                        out.push_str("> ");
                        out.push_str(line);
                        out.push('\n');
                    }
                }
                out.push('\n');
            }
            "ul" => {
                out.push('\n');
                self.list(id, 0, false, out);
                out.push('\n');
            }
            "ol" => {
                out.push('\n');
                self.list(id, 0, true, out);
                out.push('\n');
            }
            _ => {
                if is_inline_tag(tag) {
                    self.inline(id, out);
                } else {
                    for &child in self.dom.children(id) {
                        self.block(child, out);
                    }
                }
            }
        }
    }

    /// Render the items of a list, recursing for nested lists
    fn list(&self, id: NodeId, depth: usize, ordered: bool, out: &mut String) {
        let mut index = 1usize;
        for &item in self.dom.children(id) {
            if self.dom.tag(item) != Some("li") {
                continue;
            }
            let mut line = String::new();
            let mut nested = String::new();
            for &child in self.dom.children(item) {
                match self.dom.tag(child) {
                    Some("ul") => self.list(child, depth + 1, false, &mut nested),
                    Some("ol") => self.list(child, depth + 1, true, &mut nested),
                    _ => self.inline(child, &mut line),
                }
            }
            out.push('\n');
            out.push_str(&"  ".repeat(depth));
            if ordered {
                out.push_str(&format!("{}. ", index));
                index += 1;
            } else {
                out.push_str("- ");
            }
            out.push_str(line.trim());
            out.push_str(&nested);
        }
    }

    fn inline_children(&self, id: NodeId, out: &mut String) {
        for &child in self.dom.children(id) {
            self.inline(child, out);
        }
    }

    /// Render a node in inline position
    fn inline(&self, id: NodeId, out: &mut String) {
        match &self.dom.node(id).data {
            NodeData::Text(text) => push_collapsed(out, text),
            NodeData::Document => self.inline_children(id, out),
            NodeData::Element { name, .. } => match name.as_str() {
                "br" => out.push('\n'),
                "a" => {
                    let mut text = String::new();
                    self.inline_children(id, &mut text);
                    let text = text.trim();
                    match self.dom.attr(id, "href") {
                        Some(href) if !href.is_empty() => {
                            out.push('[');
                            out.push_str(text);
                            out.push_str("](");
                            out.push_str(&self.resolve(href));
                            out.push(')');
                        }
                        _ => out.push_str(text),
                    }
                }
                "img" => {
                    let alt = self.dom.attr(id, "alt").unwrap_or("");
                    let src = self.dom.attr(id, "src").unwrap_or("");
                    out.push_str("![");
                    out.push_str(alt);
                    out.push_str("](");
                    out.push_str(&self.resolve(src));
                    out.push(')');
                }
                "strong" | "b" => {
                    let mut text = String::new();
                    self.inline_children(id, &mut text);
                    out.push_str("**");
                    out.push_str(text.trim());
                    out.push_str("**");
                }
                "em" | "i" => {
                    let mut text = String::new();
                    self.inline_children(id, &mut text);
                    out.push('*');
                    out.push_str(text.trim());
                    out.push('*');
                }
                "code" => {
                    out.push('`');
                    push_collapsed(out, &self.dom.text_content(id));
                    out.push('`');
                }
                _ => self.inline_children(id, out),
            },
        }
    }

    /// Resolve a possibly relative URL against the base
    ///
    /// Already absolute URLs, fragment-only anchors and non-fetchable
    /// schemes pass through untouched.
    fn resolve(&self, href: &str) -> String {
        if !self.rewrite {
            return href.to_string();
        }
        let Some(base) = &self.base else {
            return href.to_string();
        };
        if href.starts_with('#')
            || href.contains("://")
            || href.starts_with("mailto:")
            || href.starts_with("data:")
        {
            return href.to_string();
        }
        match base.join(href) {
            Ok(resolved) => resolved.to_string(),
            Err(_) => href.to_string(),
        }
    }
}

fn is_inline_tag(tag: &str) -> bool {
    matches!(
        tag,
        "a" | "img" | "strong" | "b" | "em" | "i" | "code" | "br" | "span"
    )
}

/// Append text with whitespace runs collapsed to a single space
fn push_collapsed(out: &mut String, text: &str) {
    for c in text.chars() {
        if c.is_whitespace() {
            if !out.is_empty() && !out.ends_with(' ') && !out.ends_with('\n') {
                out.push(' ');
            }
        } else {
            out.push(c);
        }
    }
}

/// Normalize the assembled Markdown: strip trailing spaces per line and
/// allow at most one blank line between blocks
fn tidy(markdown: &str) -> String {
    let mut out = String::new();
    let mut blank_run = 0usize;
    for line in markdown.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 || out.is_empty() {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }
    out.trim_end().to_string()
}
