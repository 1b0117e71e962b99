//! Integration tests for the crawler
//!
//! These tests use wiremock to serve a small site and run the full
//! fetch, analyze, enqueue cycle over real HTTP.

use site_harvest::config::Config;
use site_harvest::crawler::{crawl, StopReason};
use site_harvest::output::write_outputs;
use site_harvest::state::FailureReason;
use std::path::Path;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// An HTML page with `title` whose body links to each of `links`
fn html_page(title: &str, links: &[String]) -> ResponseTemplate {
    let anchors: String = links
        .iter()
        .map(|href| format!(r#"<a href="{}">{}</a>"#, href, href))
        .collect();
    ResponseTemplate::new(200).set_body_raw(
        format!(
            "<html><head><title>{}</title></head><body><h1>{}</h1><p>Content of {}</p>{}</body></html>",
            title, title, title, anchors
        ),
        "text/html",
    )
}

async fn mount_page(server: &MockServer, page_path: &str, response: ResponseTemplate, hits: u64) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(response)
        .expect(hits)
        .mount(server)
        .await;
}

/// Creates a test configuration rooted at `seeds` with no politeness delay
fn create_test_config(seeds: Vec<String>, output_dir: &Path) -> Config {
    let mut config = Config {
        seeds,
        ..Config::default()
    };
    config.crawler.delay_secs = 0.0;
    config.crawler.request_timeout_secs = 5;
    config.output.output_dir = output_dir.to_path_buf();
    config
}

#[tokio::test]
async fn test_page_cap_keeps_breadth_first_prefix() {
    let server = MockServer::start().await;
    let base = server.uri();

    let children: Vec<String> = (1..10).map(|i| format!("/docs/p{}", i)).collect();
    mount_page(&server, "/docs/", html_page("Index", &children), 1).await;
    for i in 1..10 {
        // Only the first four children fit under a cap of five
        let hits = if i <= 4 { 1 } else { 0 };
        mount_page(&server, &format!("/docs/p{}", i), html_page(&format!("P{}", i), &[]), hits)
            .await;
    }

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(vec![format!("{}/docs/", base)], dir.path());
    config.crawler.max_pages = 5;

    let outcome = crawl(&config, CancellationToken::new()).await.unwrap();

    let urls: Vec<String> = outcome.pages.iter().map(|p| p.url.clone()).collect();
    let expected: Vec<String> = std::iter::once(format!("{}/docs/", base))
        .chain((1..=4).map(|i| format!("{}/docs/p{}", base, i)))
        .collect();
    assert_eq!(urls, expected);
    assert_eq!(outcome.counters.discovered, 10);
    assert_eq!(outcome.counters.completed, 5);
    assert_eq!(outcome.pending, 5);
    assert_eq!(outcome.stopped_by, StopReason::PageCap);
}

#[tokio::test]
async fn test_crawl_stays_under_base_path() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/docs/",
        html_page(
            "Index",
            &[
                "/docs/guide".to_string(),
                "/blog/post".to_string(),
                "/docs/admin/../manual.pdf".to_string(),
                "https://other.example/docs/".to_string(),
                "#top".to_string(),
            ],
        ),
        1,
    )
    .await;
    mount_page(&server, "/docs/guide", html_page("Guide", &["/docs/".to_string()]), 1).await;
    mount_page(&server, "/blog/post", html_page("Blog", &[]), 0).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(vec![format!("{}/docs/", base)], dir.path());

    let outcome = crawl(&config, CancellationToken::new()).await.unwrap();

    assert_eq!(outcome.pages.len(), 2);
    assert_eq!(outcome.pages[1].title, "Guide");
    assert_eq!(outcome.pages[1].h1.as_deref(), Some("Guide"));
    assert!(outcome.pages[1]
        .body_text
        .as_deref()
        .unwrap()
        .contains("Content of Guide"));
    assert_eq!(outcome.counters.discovered, 2);
    assert_eq!(outcome.stopped_by, StopReason::Exhausted);
}

#[tokio::test]
async fn test_exact_mode_fetches_only_seeds() {
    let server = MockServer::start().await;
    let base = server.uri();

    for name in ["a", "b", "c"] {
        mount_page(
            &server,
            &format!("/docs/{}", name),
            html_page(&name.to_uppercase(), &["/docs/unlisted".to_string()]),
            1,
        )
        .await;
    }
    mount_page(&server, "/docs/unlisted", html_page("Unlisted", &[]), 0).await;

    let dir = TempDir::new().unwrap();
    let seeds = ["a", "b", "c"]
        .iter()
        .map(|name| format!("{}/docs/{}", base, name))
        .collect();
    let mut config = create_test_config(seeds, dir.path());
    config.crawler.exact_urls = true;

    let outcome = crawl(&config, CancellationToken::new()).await.unwrap();

    let titles: Vec<&str> = outcome.pages.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, vec!["A", "B", "C"]);
    assert_eq!(outcome.counters.discovered, 3);
}

#[tokio::test]
async fn test_failed_pages_do_not_stop_the_crawl() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/docs/",
        html_page(
            "Index",
            &[
                "/docs/missing".to_string(),
                "/docs/report".to_string(),
                "/docs/ok".to_string(),
            ],
        ),
        1,
    )
    .await;
    mount_page(&server, "/docs/missing", ResponseTemplate::new(404), 1).await;
    mount_page(
        &server,
        "/docs/report",
        ResponseTemplate::new(200).set_body_raw(b"%PDF-1.4".to_vec(), "application/pdf"),
        1,
    )
    .await;
    mount_page(&server, "/docs/ok", html_page("Ok", &[]), 1).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(vec![format!("{}/docs/", base)], dir.path());

    let outcome = crawl(&config, CancellationToken::new()).await.unwrap();

    assert_eq!(outcome.counters.completed, 2);
    assert_eq!(outcome.counters.failed, 2);
    assert_eq!(outcome.failures.len(), 2);
    assert_eq!(outcome.failures[0].url, format!("{}/docs/missing", base));
    assert_eq!(outcome.failures[0].reason, FailureReason::HttpStatus(404));
    assert!(matches!(
        outcome.failures[1].reason,
        FailureReason::UnsupportedContent(_)
    ));
    assert_eq!(outcome.stopped_by, StopReason::Exhausted);
}

#[tokio::test]
async fn test_parallel_workers_keep_discovery_order() {
    let server = MockServer::start().await;
    let base = server.uri();

    let children: Vec<String> = (1..=12).map(|i| format!("/docs/p{}", i)).collect();
    mount_page(&server, "/docs/", html_page("Index", &children), 1).await;
    for i in 1..=12 {
        let grandchild = vec![format!("/docs/p{}/detail", i)];
        mount_page(&server, &format!("/docs/p{}", i), html_page(&format!("P{}", i), &grandchild), 1)
            .await;
        mount_page(
            &server,
            &format!("/docs/p{}/detail", i),
            html_page(&format!("D{}", i), &["/docs/".to_string()]),
            1,
        )
        .await;
    }

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(vec![format!("{}/docs/", base)], dir.path());
    config.crawler.workers = 4;

    let outcome = crawl(&config, CancellationToken::new()).await.unwrap();

    assert_eq!(outcome.pages.len(), 25);
    assert_eq!(outcome.counters.discovered, 25);
    let indexes: Vec<u64> = outcome.pages.iter().map(|p| p.discovery_index).collect();
    assert_eq!(indexes, (0..25).collect::<Vec<u64>>());
    // Every child is discovered from the index before any detail page
    assert_eq!(outcome.pages[12].title, "P12");
    assert!(outcome.pages[13].title.starts_with('D'));
}

#[tokio::test]
async fn test_crawl_writes_chunked_output() {
    let server = MockServer::start().await;
    let base = server.uri();

    let children: Vec<String> = (1..=4).map(|i| format!("/docs/p{}", i)).collect();
    mount_page(&server, "/docs/", html_page("Index", &children), 1).await;
    for i in 1..=4 {
        mount_page(&server, &format!("/docs/p{}", i), html_page(&format!("P{}", i), &[]), 1).await;
    }

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(vec![format!("{}/docs/", base)], dir.path());
    config.output.pages_per_file = 2;

    let outcome = crawl(&config, CancellationToken::new()).await.unwrap();
    let written = write_outputs(
        &config,
        vec![format!("{}/docs/*", base)],
        config.fingerprint().unwrap(),
        &outcome,
    )
    .unwrap();

    assert_eq!(written.chunks.len(), 3);
    let last = std::fs::read_to_string(&written.chunks[2]).unwrap();
    assert!(last.contains("(part 3/3)"));
    assert!(last.contains("Pages fetched: 5"));
    assert!(last.contains(&format!("URL: {}/docs/p4", base)));
    assert!(last.contains("Content of P4"));

    let report = std::fs::read_to_string(&written.report).unwrap();
    assert!(report.contains("| Fetched | 5 |"));
    assert!(report.contains("frontier exhausted"));
}
