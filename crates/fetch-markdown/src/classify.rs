//! Content-type routing
//!
//! Decides whether a fetched payload goes through HTML simplification
//! or is passed through raw. The content-type header and a sniff of the
//! body are independent signals; both must look like an HTML document
//! before the heuristic extraction path runs.

/// Number of leading characters inspected for the `<html` tag
pub const HTML_TAG_THRESHOLD: usize = 100;

/// How a fetched payload should be handled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentDecision {
    /// HTML document, run readability extraction and markdown rendering
    Simplify,
    /// Caller forced raw output, skip simplification
    RawHtmlForced,
    /// Payload does not look like an HTML document, pass through raw
    NonHtmlRaw {
        /// Declared content type, may be empty when the header was absent
        content_type: String,
    },
}

/// Classify a payload by content-type header and body sniff
pub fn classify(body: &str, content_type: Option<&str>, force_raw: bool) -> ContentDecision {
    if force_raw {
        return ContentDecision::RawHtmlForced;
    }

    let declared = content_type.unwrap_or("");
    if !declared.is_empty() && !declared.to_lowercase().contains("text/html") {
        return ContentDecision::NonHtmlRaw {
            content_type: declared.to_string(),
        };
    }

    // Mislabeled payloads are common; require the body itself to open
    // like an HTML document before running extraction.
    let head: String = body.chars().take(HTML_TAG_THRESHOLD).collect();
    if head.to_lowercase().contains("<html") {
        ContentDecision::Simplify
    } else {
        ContentDecision::NonHtmlRaw {
            content_type: declared.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_force_raw_wins() {
        let decision = classify("<html><body></body></html>", Some("text/html"), true);
        assert_eq!(decision, ContentDecision::RawHtmlForced);

        let decision = classify("{}", Some("application/json"), true);
        assert_eq!(decision, ContentDecision::RawHtmlForced);
    }

    #[test]
    fn test_non_html_header() {
        for ct in ["application/json", "text/plain", "image/png", "TEXT/CSS"] {
            let decision = classify("<html></html>", Some(ct), false);
            assert_eq!(
                decision,
                ContentDecision::NonHtmlRaw {
                    content_type: ct.to_string()
                }
            );
        }
    }

    #[test]
    fn test_html_header_is_case_insensitive() {
        let decision = classify("<html></html>", Some("Text/HTML; charset=utf-8"), false);
        assert_eq!(decision, ContentDecision::Simplify);
    }

    #[test]
    fn test_sniff_required_even_with_html_header() {
        // Declared HTML but the body does not open like a document
        let decision = classify("just some text", Some("text/html"), false);
        assert_eq!(
            decision,
            ContentDecision::NonHtmlRaw {
                content_type: "text/html".to_string()
            }
        );
    }

    #[test]
    fn test_missing_header_defaults_to_sniff() {
        let decision = classify("<!DOCTYPE html><HTML><body></body></HTML>", None, false);
        assert_eq!(decision, ContentDecision::Simplify);

        let decision = classify("plain text body", None, false);
        assert_eq!(
            decision,
            ContentDecision::NonHtmlRaw {
                content_type: String::new()
            }
        );
    }

    #[test]
    fn test_sniff_only_checks_leading_characters() {
        let padding = " ".repeat(HTML_TAG_THRESHOLD);
        let body = format!("{}<html><body></body></html>", padding);
        let decision = classify(&body, Some("text/html"), false);
        assert_eq!(
            decision,
            ContentDecision::NonHtmlRaw {
                content_type: "text/html".to_string()
            }
        );
    }
}
