// End-to-end crawl tests against a mock HTTP server.

use async_trait::async_trait;
use honyaku_engine::error::{EngineError, Result};
use honyaku_engine::{Crawler, SharedTranslator, Translate};
use std::collections::HashMap;
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Returns its input untouched.
struct IdentityTranslator;

#[async_trait]
impl Translate for IdentityTranslator {
    async fn translate(&self, text: &str, _target_lang: &str) -> Result<String> {
        Ok(text.to_string())
    }
}

/// Translates via a fixed lookup table, passing unknown text through.
struct MapTranslator(HashMap<String, String>);

#[async_trait]
impl Translate for MapTranslator {
    async fn translate(&self, text: &str, _target_lang: &str) -> Result<String> {
        Ok(self.0.get(text).cloned().unwrap_or_else(|| text.to_string()))
    }
}

/// Fails for one specific text, identity for everything else.
struct FailingTranslator(String);

#[async_trait]
impl Translate for FailingTranslator {
    async fn translate(&self, text: &str, _target_lang: &str) -> Result<String> {
        if text == self.0 {
            Err(EngineError::TranslationError("backend unavailable".to_string()))
        } else {
            Ok(text.to_string())
        }
    }
}

fn identity() -> SharedTranslator {
    Arc::new(IdentityTranslator)
}

async fn mount_html(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_bytes(body.as_bytes()),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn same_domain_links_followed_cross_domain_discarded() {
    let server = MockServer::start().await;

    let root = format!(
        r#"<html><body>
            <a href="{}/about">About</a>
            <a href="http://other.invalid/x">Elsewhere</a>
        </body></html>"#,
        server.uri()
    );
    mount_html(&server, "/", &root).await;
    mount_html(&server, "/about", "<html><body>About us</body></html>").await;

    let out = tempfile::tempdir().unwrap();
    let crawler = Crawler::new(identity(), out.path())
        .unwrap()
        .with_max_depth(1);

    let results = crawler.crawl(&server.uri(), 2).await.unwrap();

    let urls: Vec<&str> = results.iter().map(|r| r.url.as_str()).collect();
    assert_eq!(results.len(), 2, "expected base + about, got {:?}", urls);
    assert!(urls.iter().any(|u| u.ends_with("/about")));
    assert!(!urls.iter().any(|u| u.contains("other.invalid")));

    // The cross-domain link was still discovered on the base page.
    let base = results.iter().find(|r| r.depth == 0).unwrap();
    assert!(
        base.links_found.iter().any(|l| l.contains("other.invalid")),
        "cross-domain link should be discovered, just not fetched"
    );

    assert!(out.path().join("index").exists());
    assert!(out.path().join("about").exists());
}

#[tokio::test]
async fn duplicate_links_fetch_once() {
    let server = MockServer::start().await;

    let root = format!(
        r#"<html><body>
            <a href="{0}/dup">First</a>
            <a href="{0}/dup">Second</a>
            <a href="{0}/dup#frag">Third</a>
        </body></html>"#,
        server.uri()
    );
    mount_html(&server, "/", &root).await;

    Mock::given(method("GET"))
        .and(path("/dup"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_bytes(b"<html><body>Dup</body></html>".as_slice()),
        )
        .expect(1)
        .mount(&server)
        .await;

    let out = tempfile::tempdir().unwrap();
    let crawler = Crawler::new(identity(), out.path())
        .unwrap()
        .with_max_depth(1);

    let results = crawler.crawl(&server.uri(), 4).await.unwrap();
    let dup_count = results.iter().filter(|r| r.url.ends_with("/dup")).count();
    assert_eq!(dup_count, 1);

    server.verify().await;
}

#[tokio::test]
async fn depth_limit_discovers_but_never_fetches_next_ring() {
    let server = MockServer::start().await;

    let root = format!(
        r#"<html><body><a href="{}/a">A</a></body></html>"#,
        server.uri()
    );
    let page_a = format!(
        r#"<html><body><a href="{}/b">B</a></body></html>"#,
        server.uri()
    );
    mount_html(&server, "/", &root).await;
    mount_html(&server, "/a", &page_a).await;

    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let out = tempfile::tempdir().unwrap();
    let crawler = Crawler::new(identity(), out.path())
        .unwrap()
        .with_max_depth(1);

    let results = crawler.crawl(&server.uri(), 2).await.unwrap();

    let a = results.iter().find(|r| r.url.ends_with("/a")).unwrap();
    assert_eq!(a.depth, 1);
    // /b was discovered on /a but sits one ring past the limit.
    assert!(a.links_found.iter().any(|l| l.ends_with("/b")));
    assert!(!results.iter().any(|r| r.url.ends_with("/b")));

    server.verify().await;
}

#[tokio::test]
async fn text_nodes_are_rewritten_in_output() {
    let server = MockServer::start().await;
    mount_html(
        &server,
        "/",
        "<html><body><p>Hello</p></body></html>",
    )
    .await;

    let translator: SharedTranslator = Arc::new(MapTranslator(HashMap::from([(
        "Hello".to_string(),
        "\u{3053}\u{3093}\u{306b}\u{3061}\u{306f}".to_string(),
    )])));

    let out = tempfile::tempdir().unwrap();
    let crawler = Crawler::new(translator, out.path()).unwrap();
    let results = crawler.crawl(&server.uri(), 1).await.unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].nodes_translated, 1);
    assert_eq!(results[0].nodes_failed, 0);

    let written = std::fs::read_to_string(out.path().join("index")).unwrap();
    assert!(written.contains("<p>\u{3053}\u{3093}\u{306b}\u{3061}\u{306f}</p>"));
    assert!(!written.contains("Hello"));
}

#[tokio::test]
async fn node_translation_failure_keeps_original_and_continues() {
    let server = MockServer::start().await;
    mount_html(
        &server,
        "/",
        "<html><body><p>Foo</p><p>Bar</p></body></html>",
    )
    .await;

    let translator: SharedTranslator = Arc::new(FailingTranslator("Foo".to_string()));

    let out = tempfile::tempdir().unwrap();
    let crawler = Crawler::new(translator, out.path()).unwrap();
    let results = crawler.crawl(&server.uri(), 1).await.unwrap();

    assert_eq!(results[0].nodes_failed, 1);
    assert_eq!(results[0].nodes_translated, 1);

    // The page still made it to disk, failed node untouched, sibling intact.
    let written = std::fs::read_to_string(out.path().join("index")).unwrap();
    assert!(written.contains("<p>Foo</p>"));
    assert!(written.contains("<p>Bar</p>"));
}

#[tokio::test]
async fn failed_fetches_produce_no_output_file() {
    let server = MockServer::start().await;

    let root = format!(
        r#"<html><body><a href="{}/missing">Missing</a></body></html>"#,
        server.uri()
    );
    mount_html(&server, "/", &root).await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let out = tempfile::tempdir().unwrap();
    let crawler = Crawler::new(identity(), out.path())
        .unwrap()
        .with_max_depth(1);

    let results = crawler.crawl(&server.uri(), 2).await.unwrap();

    let missing = results.iter().find(|r| r.url.ends_with("/missing")).unwrap();
    assert_eq!(missing.status_code, 404);
    assert!(!missing.is_scraped());
    assert!(missing.error.as_deref().unwrap_or("").starts_with("fetch:"));

    assert!(out.path().join("index").exists());
    assert!(!out.path().join("missing").exists());
}

#[tokio::test]
async fn identity_translator_reproduces_serialized_input() {
    let input = "<html><head><title>T</title></head>\
        <body><div class=\"x\"><p>One</p><p>Two</p></div></body></html>";

    let server = MockServer::start().await;
    mount_html(&server, "/", input).await;

    let out = tempfile::tempdir().unwrap();
    let crawler = Crawler::new(identity(), out.path()).unwrap();
    crawler.crawl(&server.uri(), 1).await.unwrap();

    let written = std::fs::read(out.path().join("index")).unwrap();
    let expected = honyaku_engine::dom::serialize_dom(
        honyaku_engine::dom::html_to_dom(input.as_bytes(), None).unwrap(),
    )
    .unwrap();
    assert_eq!(written, expected);
}

#[tokio::test]
async fn colliding_basenames_overwrite_in_schedule_order() {
    let server = MockServer::start().await;

    let root = format!(
        r#"<html><body>
            <a href="{0}/a/page">A</a>
            <a href="{0}/b/page">B</a>
        </body></html>"#,
        server.uri()
    );
    mount_html(&server, "/home", &root).await;
    mount_html(&server, "/a/page", "<html><body>from a</body></html>").await;
    mount_html(&server, "/b/page", "<html><body>from b</body></html>").await;

    let out = tempfile::tempdir().unwrap();
    let crawler = Crawler::new(identity(), out.path())
        .unwrap()
        .with_max_depth(1);

    // Single worker keeps queue order deterministic: /a/page then /b/page.
    crawler
        .crawl(&format!("{}/home", server.uri()), 1)
        .await
        .unwrap();

    let written = std::fs::read_to_string(out.path().join("page")).unwrap();
    assert!(written.contains("from b"));
}

#[tokio::test]
async fn non_html_responses_are_not_persisted() {
    let server = MockServer::start().await;

    let root = format!(
        r#"<html><body><a href="{}/data.json">Data</a></body></html>"#,
        server.uri()
    );
    mount_html(&server, "/", &root).await;
    Mock::given(method("GET"))
        .and(path("/data.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/json")
                .set_body_string(r#"{"k":"v"}"#),
        )
        .mount(&server)
        .await;

    let out = tempfile::tempdir().unwrap();
    let crawler = Crawler::new(identity(), out.path())
        .unwrap()
        .with_max_depth(1);

    let results = crawler.crawl(&server.uri(), 2).await.unwrap();

    let json = results.iter().find(|r| r.url.ends_with("/data.json")).unwrap();
    assert_eq!(json.status_code, 200);
    assert!(!json.is_scraped());
    assert!(!out.path().join("data.json").exists());
}

#[tokio::test]
async fn invalid_base_url_is_fatal() {
    let out = tempfile::tempdir().unwrap();
    let crawler = Crawler::new(identity(), out.path()).unwrap();
    let result = crawler.crawl("not a url", 1).await;
    assert!(matches!(result, Err(EngineError::InvalidUrl(_))));
}

#[tokio::test]
async fn raised_shutdown_flag_stops_scheduling() {
    use std::sync::atomic::{AtomicBool, Ordering};

    let server = MockServer::start().await;
    mount_html(&server, "/", "<html><body>Home</body></html>").await;

    let flag = Arc::new(AtomicBool::new(false));
    flag.store(true, Ordering::Release);

    let out = tempfile::tempdir().unwrap();
    let crawler = Crawler::new(identity(), out.path())
        .unwrap()
        .with_shutdown_flag(flag);

    // Flag raised before the run: workers exit without fetching anything.
    let results = crawler.crawl(&server.uri(), 2).await.unwrap();
    assert!(results.is_empty());
    assert!(!out.path().join("index").exists());
}
