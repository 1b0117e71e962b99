//! Checkpoint and resume over a real HTTP crawl

use site_harvest::config::Config;
use site_harvest::crawler::{analyzer_for, Dispatcher, HttpFetcher, StopReason};
use site_harvest::state::EntryState;
use site_harvest::storage::{self, CheckpointError};
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn html_page(title: &str, links: &[String]) -> ResponseTemplate {
    let anchors: String = links
        .iter()
        .map(|href| format!(r#"<a href="{}">link</a>"#, href))
        .collect();
    ResponseTemplate::new(200).set_body_raw(
        format!(
            "<html><head><title>{}</title></head><body><p>{} text</p>{}</body></html>",
            title, title, anchors
        ),
        "text/html",
    )
}

/// Serves `/docs/` linking to `/docs/p1`..`/docs/p{n}`; every page must be
/// fetched exactly once across all runs
async fn mount_site(server: &MockServer, n: usize) {
    mount_site_with_hits(server, n, Some(1)).await;
}

async fn mount_site_with_hits(server: &MockServer, n: usize, hits: Option<u64>) {
    let children: Vec<String> = (1..=n).map(|i| format!("/docs/p{}", i)).collect();
    let index = Mock::given(method("GET"))
        .and(path("/docs/"))
        .respond_with(html_page("Index", &children));
    match hits {
        Some(n) => index.expect(n).mount(server).await,
        None => index.mount(server).await,
    }
    for i in 1..=n {
        let page = Mock::given(method("GET"))
            .and(path(format!("/docs/p{}", i)))
            .respond_with(html_page(&format!("P{}", i), &[]));
        match hits {
            Some(n) => page.expect(n).mount(server).await,
            None => page.mount(server).await,
        }
    }
}

fn fetcher() -> HttpFetcher {
    HttpFetcher::new("site-harvest-test", Duration::from_secs(5)).unwrap()
}

fn create_test_config(base: &str, dir: &TempDir) -> Config {
    let mut config = Config {
        seeds: vec![format!("{}/docs/", base)],
        ..Config::default()
    };
    config.crawler.delay_secs = 0.0;
    config.output.output_dir = dir.path().to_path_buf();
    config.checkpoint.save_progress = Some(dir.path().join("progress.json"));
    config.checkpoint.every = 2;
    config
}

#[tokio::test]
async fn test_resume_continues_without_refetching() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_site(&server, 7).await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&base, &dir);
    config.crawler.max_pages = 3;

    let first = Dispatcher::new(&config, fetcher(), analyzer_for(config.crawler.mode))
        .unwrap()
        .run()
        .await
        .unwrap();
    assert_eq!(first.pages.len(), 3);
    assert_eq!(first.stopped_by, StopReason::PageCap);

    // A larger page cap does not change the fingerprint
    config.crawler.max_pages = 100;
    config.crawler.workers = 3;
    let checkpoint_path = dir.path().join("progress.json");
    let checkpoint = storage::load(&checkpoint_path, &config.fingerprint().unwrap()).unwrap();
    assert_eq!(checkpoint.pages.len(), 3);
    assert_eq!(checkpoint.frontier.pending.len(), 5);

    let dispatcher =
        Dispatcher::resume(&config, fetcher(), analyzer_for(config.crawler.mode), checkpoint)
            .unwrap();
    assert_eq!(
        dispatcher
            .frontier()
            .state_of(&format!("{}/docs/p1", base)),
        Some(EntryState::Visited)
    );

    let second = dispatcher.run().await.unwrap();

    assert_eq!(second.pages.len(), 8);
    assert_eq!(second.counters.discovered, 8);
    assert_eq!(second.stopped_by, StopReason::Exhausted);
    let indexes: Vec<u64> = second.pages.iter().map(|p| p.discovery_index).collect();
    assert_eq!(indexes, (0..8).collect::<Vec<u64>>());
    assert_eq!(second.pages[0].title, "Index");
    assert_eq!(second.pages[7].title, "P7");

    // The final checkpoint reflects the finished crawl
    let last = storage::load(&checkpoint_path, &config.fingerprint().unwrap()).unwrap();
    assert_eq!(last.frontier.counters.completed, 8);
    assert!(last.frontier.pending.is_empty());
}

#[tokio::test]
async fn test_checkpoint_from_other_scope_is_rejected() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_site(&server, 2).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&base, &dir);
    Dispatcher::new(&config, fetcher(), analyzer_for(config.crawler.mode))
        .unwrap()
        .run()
        .await
        .unwrap();

    let mut other = config.clone();
    other.scope.base_path = Some("/".to_string());

    let result = storage::load(
        &dir.path().join("progress.json"),
        &other.fingerprint().unwrap(),
    );
    assert!(matches!(result, Err(CheckpointError::Corrupt(_))));
}

#[tokio::test]
async fn test_rejected_checkpoint_survives_fresh_run() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_site_with_hits(&server, 4, None).await;

    let dir = TempDir::new().unwrap();
    let checkpoint_path = dir.path().join("progress.json");
    let mut config = create_test_config(&base, &dir);
    config.crawler.max_pages = 2;
    Dispatcher::new(&config, fetcher(), analyzer_for(config.crawler.mode))
        .unwrap()
        .run()
        .await
        .unwrap();
    let original = std::fs::read(&checkpoint_path).unwrap();

    // Same crawl restarted with a mistyped base path and no --save-progress
    let mut retry = config.clone();
    retry.scope.base_path = Some("/doc/".to_string());
    retry.checkpoint.save_progress = None;
    retry.checkpoint.resume_from = Some(checkpoint_path.clone());
    let fingerprint = retry.fingerprint().unwrap();

    assert!(storage::prepare_resume(&mut retry, &fingerprint).is_none());
    assert_eq!(retry.checkpoint.save_progress, None::<PathBuf>);

    let fresh = Dispatcher::new(&retry, fetcher(), analyzer_for(retry.crawler.mode))
        .unwrap()
        .run()
        .await
        .unwrap();
    assert_eq!(fresh.pages.len(), 1);

    assert_eq!(std::fs::read(&checkpoint_path).unwrap(), original);
    let kept = storage::load(&checkpoint_path, &config.fingerprint().unwrap()).unwrap();
    assert_eq!(kept.pages.len(), 2);
}
