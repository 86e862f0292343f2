//! Integration tests for the fetch-and-simplify pipeline using wiremock

use fetch_markdown::{
    fetch_markdown, fetch_markdown_with_options, Error, FetchOptions, EXTRACTION_FAILED_PLACEHOLDER,
};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ARTICLE_HTML: &str = r#"<html>
<head><title>Test Article</title></head>
<body>
<nav><a href="/">Home</a> <a href="/tags">Tags</a> <a href="/feed">Feed</a></nav>
<div id="content">
<h1>Test Article</h1>
<p>The opening paragraph sets the scene at length, with commas, clauses, and
enough running prose for the content scorer to notice it properly.</p>
<p>A second paragraph keeps the argument going, piling on detail, commas, and
more sentences so the article container wins the density contest.</p>
<p>The closing paragraph wraps things up, as articles do, with a final thought
and a <a href="../related.html">related link</a> for good measure.</p>
</div>
<footer>Site footer boilerplate</footer>
</body></html>"#;

fn allow_all_robots() -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string("User-agent: *\nAllow: /")
        .insert_header("content-type", "text/plain")
}

#[tokio::test]
async fn test_simplifies_html_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(allow_all_robots())
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/article"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(ARTICLE_HTML, "text/html"))
        .mount(&server)
        .await;

    let markdown = fetch_markdown(&format!("{}/article", server.uri()))
        .await
        .unwrap();

    assert!(markdown.contains("opening paragraph"));
    assert!(markdown.contains("closing paragraph"));
    // Navigation and footer are boilerplate
    assert!(!markdown.contains("Site footer"));
    assert!(!markdown.contains("/tags"));
}

#[tokio::test]
async fn test_relative_links_resolved_against_fetch_url() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(allow_all_robots())
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/blog/article"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(ARTICLE_HTML, "text/html"))
        .mount(&server)
        .await;

    let markdown = fetch_markdown(&format!("{}/blog/article", server.uri()))
        .await
        .unwrap();

    // "../related.html" relative to "/blog/article" resolves to "/related.html"
    assert!(markdown.contains(&format!("]({}/related.html)", server.uri())));
}

#[tokio::test]
async fn test_relative_links_resolved_against_redirect_target() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(allow_all_robots())
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/article"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/blog/post/article"))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/blog/post/article"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(ARTICLE_HTML, "text/html"))
        .mount(&server)
        .await;

    let markdown = fetch_markdown(&format!("{}/article", server.uri()))
        .await
        .unwrap();

    // "../related.html" resolves against the final URL "/blog/post/article",
    // not the pre-redirect "/article"
    assert!(markdown.contains(&format!("]({}/blog/related.html)", server.uri())));
}

#[tokio::test]
async fn test_robots_disallow_denies_fetch() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private/"),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/public/page"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(ARTICLE_HTML, "text/html"))
        .mount(&server)
        .await;

    let denied = fetch_markdown(&format!("{}/private/page", server.uri())).await;
    assert!(matches!(denied, Err(Error::PolicyDenied(_))));

    let allowed = fetch_markdown(&format!("{}/public/page", server.uri())).await;
    assert!(allowed.is_ok());
}

#[tokio::test]
async fn test_robots_forbidden_status_denies_fetch() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let result = fetch_markdown(&format!("{}/page", server.uri())).await;
    match result {
        Err(Error::PolicyDenied(reason)) => {
            assert!(reason.contains("forbids autonomous fetching"));
        }
        other => panic!("expected PolicyDenied, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn test_missing_robots_allows_fetch() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/article"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(ARTICLE_HTML, "text/html"))
        .mount(&server)
        .await;

    let markdown = fetch_markdown(&format!("{}/article", server.uri()))
        .await
        .unwrap();
    assert!(markdown.contains("opening paragraph"));
}

#[tokio::test]
async fn test_ignore_robots_makes_no_robots_request() {
    let server = MockServer::start().await;

    // Must never be hit when the robots check is bypassed
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(allow_all_robots())
        .expect(0)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/article"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(ARTICLE_HTML, "text/html"))
        .expect(1)
        .mount(&server)
        .await;

    let options = FetchOptions {
        ignore_robots_txt: true,
        ..Default::default()
    };
    let markdown = fetch_markdown_with_options(&format!("{}/article", server.uri()), options)
        .await
        .unwrap();
    assert!(markdown.contains("opening paragraph"));
}

#[tokio::test]
async fn test_robots_transport_failure_is_fetch_error() {
    // Port 1 refuses connections; without a policy decision the fetch
    // must not proceed, so this surfaces as a fetch error on the
    // robots.txt request rather than a silent allow
    let result = fetch_markdown("http://127.0.0.1:1/page").await;
    match result {
        Err(err @ Error::Fetch { .. }) => {
            assert!(err.to_string().contains("robots.txt"));
        }
        other => panic!("expected Fetch error, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn test_content_404_is_fetch_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(allow_all_robots())
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
        .mount(&server)
        .await;

    let result = fetch_markdown(&format!("{}/missing", server.uri())).await;
    match result {
        Err(err @ Error::Fetch { .. }) => {
            assert!(err.to_string().contains("404"));
        }
        other => panic!("expected Fetch error, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn test_non_html_content_passes_through_with_note() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(allow_all_robots())
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/data.json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(r#"{"key": "value"}"#, "application/json"),
        )
        .mount(&server)
        .await;

    let output = fetch_markdown(&format!("{}/data.json", server.uri()))
        .await
        .unwrap();

    assert!(output.starts_with("Content type application/json cannot be simplified to markdown"));
    assert!(output.contains(r#"{"key": "value"}"#));
}

#[tokio::test]
async fn test_force_raw_returns_html_verbatim() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(allow_all_robots())
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/article"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(ARTICLE_HTML, "text/html"))
        .mount(&server)
        .await;

    let options = FetchOptions {
        force_raw: true,
        ..Default::default()
    };
    let output = fetch_markdown_with_options(&format!("{}/article", server.uri()), options)
        .await
        .unwrap();

    // Raw body, no prefix note
    assert_eq!(output, ARTICLE_HTML);
}

#[tokio::test]
async fn test_empty_page_yields_placeholder() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(allow_all_robots())
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/empty"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<html></html>", "text/html"))
        .mount(&server)
        .await;

    let output = fetch_markdown(&format!("{}/empty", server.uri()))
        .await
        .unwrap();
    assert_eq!(output, EXTRACTION_FAILED_PLACEHOLDER);
}

#[tokio::test]
async fn test_same_user_agent_on_both_requests() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .and(header("user-agent", "custom-bot/1.0"))
        .respond_with(allow_all_robots())
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/article"))
        .and(header("user-agent", "custom-bot/1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(ARTICLE_HTML, "text/html"))
        .expect(1)
        .mount(&server)
        .await;

    let options = FetchOptions {
        user_agent: Some("custom-bot/1.0".to_string()),
        ..Default::default()
    };
    let result =
        fetch_markdown_with_options(&format!("{}/article", server.uri()), options).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_mislabeled_html_passes_through_raw() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(allow_all_robots())
        .mount(&server)
        .await;

    // Declared HTML but the body is plain text; the sniff protects the
    // extraction path from mislabeled payloads
    Mock::given(method("GET"))
        .and(path("/mislabeled"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("plain text, no markup here")
                .insert_header("content-type", "text/html"),
        )
        .mount(&server)
        .await;

    let output = fetch_markdown(&format!("{}/mislabeled", server.uri()))
        .await
        .unwrap();
    assert!(output.contains("cannot be simplified to markdown"));
    assert!(output.contains("plain text, no markup here"));
}
