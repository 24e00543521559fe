//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use page_spider::config::Config;
use page_spider::config::HttpConfig;
use page_spider::crawler::{
    build_http_client, crawl, Coordinator, Diagnostic, DiagnosticSink, Fetcher, Page,
    MAX_REDIRECT_HOPS,
};
use page_spider::{FetchError, SpiderError};
use std::sync::{Arc, Mutex};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Records every diagnostic as (is_problem, message)
#[derive(Clone, Default)]
struct RecordingSink {
    events: Arc<Mutex<Vec<(bool, String)>>>,
}

impl RecordingSink {
    fn problems(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|(problem, _)| *problem)
            .map(|(_, message)| message.clone())
            .collect()
    }

    fn messages(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|(_, message)| message.clone())
            .collect()
    }
}

impl DiagnosticSink for RecordingSink {
    fn emit(&mut self, diagnostic: &Diagnostic<'_>) {
        self.events
            .lock()
            .unwrap()
            .push((diagnostic.is_problem(), diagnostic.to_string()));
    }
}

/// An HTML response
fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/html")
}

/// Mounts an HTML page that must be fetched exactly once
async fn mount_page(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html(body))
        .expect(1)
        .mount(server)
        .await;
}

/// Mounts a redirect from `route` to `location`
async fn mount_redirect(server: &MockServer, route: &str, status: u16, location: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status).insert_header("Location", location))
        .mount(server)
        .await;
}

/// Mounts a route that must never be requested
async fn mount_forbidden(server: &MockServer, route: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html("<p>should not be fetched</p>"))
        .expect(0)
        .mount(server)
        .await;
}

fn root_config(server: &MockServer) -> Config {
    Config::new(format!("{}/", server.uri()))
}

/// Runs a crawl, returning the verdict, the URLs handed to the callback and the coordinator
async fn run(config: Config) -> (bool, Vec<String>, Coordinator) {
    let mut coordinator = Coordinator::new(config).expect("Failed to create coordinator");
    let mut pages = Vec::new();

    let success = coordinator
        .start(|page: &Page| {
            pages.push(page.url.to_string());
            Ok(())
        })
        .await;

    (success, pages, coordinator)
}

fn done(coordinator: &Coordinator) -> Vec<String> {
    coordinator.done().iter().map(|u| u.to_string()).collect()
}

#[tokio::test]
async fn test_one_link() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", r#"<a href="foo.html">foo</a>"#).await;
    mount_page(&server, "/foo.html", "").await;

    let (success, pages, coordinator) = run(root_config(&server)).await;

    assert!(success);
    assert_eq!(pages, vec![format!("{base}/"), format!("{base}/foo.html")]);
    assert_eq!(done(&coordinator), pages);
    assert!(coordinator.todo().is_empty());
}

#[tokio::test]
async fn test_link_with_anchor_only() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", r##"<a href="#something">something</a>"##).await;

    let (success, pages, coordinator) = run(root_config(&server)).await;

    assert!(success);
    assert_eq!(pages, vec![format!("{base}/")]);
    assert_eq!(done(&coordinator), vec![format!("{base}/")]);
}

#[tokio::test]
async fn test_duplicate_links_collapsed() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        r#"
        <ul>
        <li><a href="foo.html">foo</a>
        <li><a href="foo.html">foo</a>
        <li><a href="foo.html#bar">bar</a>
        </ul>
        "#,
    )
    .await;
    mount_page(&server, "/foo.html", "").await;

    let (success, pages, coordinator) = run(root_config(&server)).await;

    assert!(success);
    assert_eq!(pages, vec![format!("{base}/"), format!("{base}/foo.html")]);
    assert_eq!(done(&coordinator), pages);
}

#[tokio::test]
async fn test_lifo_visit_order() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        r#"<a href="/foo.html">foo</a> <a href="/bar.html">bar</a>"#,
    )
    .await;
    mount_page(
        &server,
        "/foo.html",
        r#"<a href="/">home</a> <a href="/bar.html">bar</a>"#,
    )
    .await;
    mount_page(
        &server,
        "/bar.html",
        r#"<a href="/">home</a> <a href="/foo.html">foo</a>"#,
    )
    .await;

    let (success, pages, coordinator) = run(root_config(&server)).await;

    let expected = vec![
        format!("{base}/"),
        format!("{base}/bar.html"),
        format!("{base}/foo.html"),
    ];
    assert!(success);
    assert_eq!(pages, expected);
    assert_eq!(done(&coordinator), expected);
}

#[tokio::test]
async fn test_depth_leaning_traversal() {
    let server = MockServer::start().await;
    let base = server.uri();

    // The most recently discovered link is explored before older siblings
    mount_page(&server, "/", r#"<a href="/a">a</a> <a href="/b">b</a>"#).await;
    mount_page(&server, "/b", r#"<a href="/b/deep">deep</a>"#).await;
    mount_page(&server, "/b/deep", "").await;
    mount_page(&server, "/a", "").await;

    let (success, pages, _) = run(root_config(&server)).await;

    assert!(success);
    assert_eq!(
        pages,
        vec![
            format!("{base}/"),
            format!("{base}/b"),
            format!("{base}/b/deep"),
            format!("{base}/a"),
        ]
    );
}

#[tokio::test]
async fn test_redirect_recorded_by_final_url() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", r#"<a href="foo">foo</a>"#).await;
    mount_redirect(&server, "/foo", 301, "/foo/").await;
    mount_page(&server, "/foo/", "<p>the real page</p>").await;

    let (success, pages, coordinator) = run(root_config(&server)).await;

    assert!(success);
    assert_eq!(pages, vec![format!("{base}/"), format!("{base}/foo/")]);

    let done = done(&coordinator);
    assert!(done.contains(&format!("{base}/foo/")));
    assert!(!done.contains(&format!("{base}/foo")));
}

#[tokio::test]
async fn test_redirected_start_is_resolved() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_redirect(&server, "/foo", 302, "/foo/").await;
    mount_page(&server, "/foo/", "").await;

    let config = Config::new(format!("{base}/foo"));
    let (success, pages, coordinator) = run(config).await;

    assert!(success);
    assert_eq!(pages, vec![format!("{base}/foo/")]);
    assert_eq!(done(&coordinator), vec![format!("{base}/foo/")]);
}

#[tokio::test]
async fn test_redirect_to_visited_page_is_not_revisited() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", r#"<a href="/alias">alias</a>"#).await;
    mount_redirect(&server, "/alias", 302, "/").await;

    let (success, pages, coordinator) = run(root_config(&server)).await;

    assert!(success);
    assert_eq!(pages, vec![format!("{base}/")]);
    assert_eq!(done(&coordinator), vec![format!("{base}/")]);
}

#[tokio::test]
async fn test_redirect_target_fragment_is_ignored() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", r#"<a href="/x">x</a> <a href="/old">old</a>"#).await;
    mount_redirect(&server, "/old", 301, "/x#section").await;
    mount_page(&server, "/x", "<p>x</p>").await;

    let (success, pages, coordinator) = run(root_config(&server)).await;

    assert!(success);
    assert_eq!(pages, vec![format!("{base}/"), format!("{base}/x")]);
    assert_eq!(
        done(&coordinator),
        vec![format!("{base}/"), format!("{base}/x")]
    );
}

#[tokio::test]
async fn test_starting_point_fragment_is_ignored() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", r#"<a href="/">home</a>"#).await;

    let config = Config::new(format!("{base}/#top")).with_whitelist([".*"]);
    let (success, pages, coordinator) = run(config).await;

    assert!(success);
    assert_eq!(pages, vec![format!("{base}/")]);
    assert_eq!(done(&coordinator), vec![format!("{base}/")]);
}

#[tokio::test]
async fn test_too_many_redirects_fail_the_page() {
    let server = MockServer::start().await;

    mount_page(&server, "/", r#"<a href="/loop">loop</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/loop"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/loop"))
        .expect(MAX_REDIRECT_HOPS as u64 + 1)
        .mount(&server)
        .await;

    let (success, pages, coordinator) = run(root_config(&server)).await;

    assert!(!success);
    assert_eq!(pages.len(), 1);
    assert_eq!(coordinator.failures().len(), 1);
    assert!(matches!(
        coordinator.failures()[0].error,
        FetchError::TooManyRedirects { .. }
    ));
}

#[tokio::test]
async fn test_start_not_found() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/dead-link"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let config = Config::new(format!("{base}/dead-link"));
    let (success, pages, coordinator) = run(config).await;

    assert!(!success);
    assert!(pages.is_empty());
    assert!(coordinator.todo().is_empty());
    assert_eq!(done(&coordinator), vec![format!("{base}/dead-link")]);

    let failures = coordinator.failures();
    assert_eq!(failures.len(), 1);
    assert!(matches!(
        failures[0].error,
        FetchError::Status { status: 404, .. }
    ));
}

#[tokio::test]
async fn test_broken_link_does_not_stop_the_crawl() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        r#"<a href="/good.html">good</a> <a href="/nowhere.html">broken</a>"#,
    )
    .await;
    mount_page(&server, "/good.html", "<p>fine</p>").await;
    Mock::given(method("GET"))
        .and(path("/nowhere.html"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let (success, pages, coordinator) = run(root_config(&server)).await;

    assert!(!success);
    assert_eq!(
        pages,
        vec![format!("{base}/"), format!("{base}/good.html")]
    );
    assert_eq!(
        done(&coordinator),
        vec![
            format!("{base}/"),
            format!("{base}/nowhere.html"),
            format!("{base}/good.html"),
        ]
    );
    assert_eq!(
        coordinator.failures()[0].url.as_str(),
        format!("{base}/nowhere.html")
    );
}

#[tokio::test]
async fn test_callback_errors_do_not_fail_the_crawl() {
    let server = MockServer::start().await;

    mount_page(&server, "/", r#"<a href="/a">a</a> <a href="/b">b</a>"#).await;
    mount_page(&server, "/a", "").await;
    mount_page(&server, "/b", "").await;

    let sink = RecordingSink::default();
    let mut coordinator = Coordinator::new(root_config(&server))
        .unwrap()
        .with_sink(Box::new(sink.clone()));

    let mut calls = 0;
    let success = coordinator
        .start(|page| {
            calls += 1;
            anyhow::bail!("cannot handle {}", page.url)
        })
        .await;

    assert!(success);
    assert_eq!(calls, 3);
    assert_eq!(coordinator.done().len(), 3);
    assert_eq!(sink.problems().len(), 3);
    assert!(sink.problems()[0].starts_with("Callback error for"));
}

#[tokio::test]
async fn test_non_html_is_a_leaf() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", r#"<a href="/manual.pdf">manual</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/manual.pdf"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(r#"<a href="/hidden">not a link</a>"#, "application/pdf"),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_forbidden(&server, "/hidden").await;

    let (success, pages, coordinator) = run(root_config(&server)).await;

    assert!(success);
    assert_eq!(pages, vec![format!("{base}/")]);
    assert_eq!(
        done(&coordinator),
        vec![format!("{base}/"), format!("{base}/manual.pdf")]
    );
}

#[tokio::test]
async fn test_default_whitelist_is_starting_point_prefix() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/docs/",
        r#"
        <a href="intro.html">intro</a>
        <a href="/blog/">blog</a>
        <a href="http://elsewhere.invalid/docs/">elsewhere</a>
        "#,
    )
    .await;
    mount_page(&server, "/docs/intro.html", "").await;
    mount_forbidden(&server, "/blog/").await;

    let config = Config::new(format!("{base}/docs/"));
    let (success, pages, _) = run(config).await;

    assert!(success);
    assert_eq!(
        pages,
        vec![format!("{base}/docs/"), format!("{base}/docs/intro.html")]
    );
}

#[tokio::test]
async fn test_explicit_whitelist_overrides_default() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/docs/", r#"<a href="/blog/">blog</a>"#).await;
    mount_page(&server, "/blog/", "").await;

    let config = Config::new(format!("{base}/docs/"))
        .with_whitelist([format!("^{}/", regex_escape(&base))]);
    let (success, pages, _) = run(config).await;

    assert!(success);
    assert_eq!(
        pages,
        vec![format!("{base}/docs/"), format!("{base}/blog/")]
    );
}

#[tokio::test]
async fn test_blacklist_beats_whitelist() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        r#"<a href="/public.html">public</a> <a href="/secret/plans.html">secret</a>"#,
    )
    .await;
    mount_page(&server, "/public.html", "").await;
    mount_forbidden(&server, "/secret/plans.html").await;

    let config = root_config(&server)
        .with_whitelist([".*"])
        .with_blacklist(["/secret/"]);
    let (success, pages, _) = run(config).await;

    assert!(success);
    assert_eq!(
        pages,
        vec![format!("{base}/"), format!("{base}/public.html")]
    );
}

#[tokio::test]
async fn test_starting_point_is_not_filtered() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/start", r#"<a href="/start/next">next</a>"#).await;
    mount_forbidden(&server, "/start/next").await;

    let config = Config::new(format!("{base}/start"))
        .with_whitelist(["^https://nowhere\\.invalid/"])
        .with_blacklist(["start"]);
    let (success, pages, _) = run(config).await;

    assert!(success);
    assert_eq!(pages, vec![format!("{base}/start")]);
}

#[tokio::test]
async fn test_tracing_reports_skipped_links() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        r##"<a href="#top">top</a> <a href="mailto:me@example.com">mail</a> <a href="/x">x</a>"##,
    )
    .await;
    mount_page(&server, "/x", "").await;

    let sink = RecordingSink::default();
    let mut coordinator = Coordinator::new(root_config(&server).with_tracing(true))
        .unwrap()
        .with_sink(Box::new(sink.clone()));
    let success = coordinator.start(|_| Ok(())).await;

    assert!(success);
    let messages = sink.messages();
    assert!(messages.iter().any(|m| m.starts_with("Skipping #top")));
    assert!(messages
        .iter()
        .any(|m| m.starts_with("Skipping mailto:me@example.com")));
    assert!(messages
        .iter()
        .any(|m| m.starts_with("Adding 1 new links found at")));
    assert!(sink.problems().is_empty());
}

#[tokio::test]
async fn test_without_tracing_only_problems_are_reported() {
    let server = MockServer::start().await;

    mount_page(&server, "/", r##"<a href="#top">top</a> <a href="/gone">gone</a>"##).await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(410))
        .mount(&server)
        .await;

    let sink = RecordingSink::default();
    let mut coordinator = Coordinator::new(root_config(&server))
        .unwrap()
        .with_sink(Box::new(sink.clone()));
    let success = coordinator.start(|_| Ok(())).await;

    assert!(!success);
    let messages = sink.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("HTTP 410"));
}

#[tokio::test]
async fn test_each_crawl_starts_fresh() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<a href="/a">a</a>"#))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(html(""))
        .expect(2)
        .mount(&server)
        .await;

    let mut coordinator = Coordinator::new(root_config(&server)).unwrap();

    assert!(coordinator.start(|_| Ok(())).await);
    let first = done(&coordinator);

    assert!(coordinator.start(|_| Ok(())).await);
    assert_eq!(done(&coordinator), first);
    assert_eq!(first.len(), 2);
}

#[tokio::test]
async fn test_crawl_helper() {
    let server = MockServer::start().await;

    mount_page(&server, "/", r#"<title>Home</title><a href="/a">a</a>"#).await;
    mount_page(&server, "/a", "<title>A</title>").await;

    let mut titles = Vec::new();
    let success = crawl(root_config(&server), |page| {
        titles.push(page.title().unwrap_or_default());
        Ok(())
    })
    .await
    .unwrap();

    assert!(success);
    assert_eq!(titles, vec!["Home".to_string(), "A".to_string()]);
}

#[tokio::test]
async fn test_invalid_configuration_fetches_nothing() {
    let result = crawl(Config::new("definitely not a url"), |_| Ok(())).await;
    assert!(matches!(result, Err(SpiderError::Config(_))));
}

#[tokio::test]
async fn test_custom_fetcher_is_used() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("user-agent", "custom-agent/2.0"))
        .respond_with(html(r#"<a href="/a">a</a>"#))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/a"))
        .and(header("user-agent", "custom-agent/2.0"))
        .respond_with(html(""))
        .expect(1)
        .mount(&server)
        .await;

    let http = HttpConfig {
        user_agent: "custom-agent/2.0".to_string(),
        ..HttpConfig::default()
    };
    let fetcher = Fetcher::with_client(build_http_client(&http).unwrap());

    let mut coordinator = Coordinator::new(root_config(&server))
        .unwrap()
        .with_fetcher(fetcher);
    let success = coordinator.start(|_| Ok(())).await;

    assert!(success);
    assert_eq!(
        done(&coordinator),
        vec![format!("{base}/"), format!("{base}/a")]
    );
}

/// Escapes a URL for use as a literal regex prefix
fn regex_escape(s: &str) -> String {
    page_spider::url::default_whitelist_pattern(s)
        .trim_start_matches('^')
        .to_string()
}
