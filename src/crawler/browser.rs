//! Headless-browser fetcher for JavaScript-rendered sites
//!
//! Only compiled with the `browser` feature.

use crate::crawler::fetcher::{FetchError, FetchedPage, Fetcher};
use crate::HarvestError;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Renders pages in headless Chromium before handing back the DOM
///
/// One Chromium process is shared by every clone; each fetch opens its own
/// tab and closes it afterwards.
#[derive(Clone)]
pub struct BrowserFetcher {
    browser: Arc<Browser>,
    timeout: Duration,
}

impl BrowserFetcher {
    /// Launches headless Chromium; every fetch is bounded by `timeout`
    pub async fn launch(timeout: Duration) -> Result<Self, HarvestError> {
        let mut builder = BrowserConfig::builder().no_sandbox().disable_default_args();
        if let Some(bin) = find_chrome_binary() {
            tracing::info!("Using Chrome binary: {}", bin.display());
            builder = builder.chrome_executable(bin);
        }

        let config = builder
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .build()
            .map_err(|e| HarvestError::Browser(format!("invalid browser config: {}", e)))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| HarvestError::Browser(format!("failed to launch Chromium: {}", e)))?;

        // The CDP connection only makes progress while the handler is polled
        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::warn!("Browser handler error: {}", e);
                    break;
                }
            }
        });

        Ok(Self {
            browser: Arc::new(browser),
            timeout,
        })
    }
}

/// `CHROME_BIN` first, then the usual install locations
fn find_chrome_binary() -> Option<PathBuf> {
    if let Ok(p) = std::env::var("CHROME_BIN") {
        let path = PathBuf::from(p);
        if path.exists() {
            return Some(path);
        }
    }

    [
        "/usr/bin/google-chrome-stable",
        "/usr/bin/google-chrome",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
        "/snap/chromium/current/usr/lib/chromium-browser/chrome",
    ]
    .iter()
    .map(PathBuf::from)
    .find(|p| p.exists())
}

/// Closes its tab when dropped
///
/// The close runs on a spawned task, so it still happens when the fetch
/// future is dropped mid-render by an outer timeout or a shutdown.
struct OpenTab(Option<Page>);

impl OpenTab {
    fn page(&self) -> Option<&Page> {
        self.0.as_ref()
    }
}

impl Drop for OpenTab {
    fn drop(&mut self) {
        let Some(page) = self.0.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = page.close().await {
                        tracing::debug!("Failed to close tab: {}", e);
                    }
                });
            }
            Err(_) => tracing::warn!("No runtime left to close a browser tab"),
        }
    }
}

impl Fetcher for BrowserFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        // A blank tab opens immediately; the slow navigation then happens
        // on a page we already hold
        let page = tokio::time::timeout(self.timeout, self.browser.new_page("about:blank"))
            .await
            .map_err(|_| FetchError::Timeout)?
            .map_err(|e| FetchError::Renderer(format!("could not open tab: {}", e)))?;
        let tab = OpenTab(Some(page));

        let render = async {
            let page = tab
                .page()
                .ok_or_else(|| FetchError::Renderer("tab already closed".to_string()))?;

            page.goto(url)
                .await
                .map_err(|e| FetchError::Renderer(format!("navigation failed: {}", e)))?;

            page.find_element("body")
                .await
                .map_err(|e| FetchError::Renderer(format!("page never rendered <body>: {}", e)))?;

            page.content()
                .await
                .map_err(|e| FetchError::Renderer(format!("could not read DOM: {}", e)))
        };

        let rendered = tokio::time::timeout(self.timeout, render).await;
        drop(tab);
        let body = rendered.map_err(|_| FetchError::Timeout)??;

        Ok(FetchedPage {
            final_url: url.to_string(),
            status: 200,
            body,
        })
    }
}
