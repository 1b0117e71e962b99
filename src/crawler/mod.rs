//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - Fetching pages over HTTP or through a headless browser
//! - HTML analysis and link extraction
//! - The worker pool that coordinates a crawl

#[cfg(feature = "browser")]
mod browser;
mod coordinator;
mod fetcher;
mod parser;

#[cfg(feature = "browser")]
pub use browser::BrowserFetcher;
pub use coordinator::{CrawlOutcome, Dispatcher, StopReason, BATCH_SIZE};
pub use fetcher::{build_http_client, AnyFetcher, FetchError, FetchedPage, Fetcher, HttpFetcher};
pub use parser::{AnalysisError, AnalyzedPage, HtmlAnalyzer, PageAnalyzer, UNTITLED};

use crate::config::{Config, CrawlMode};
use crate::HarvestError;
use tokio_util::sync::CancellationToken;

/// Analyzer matching the configured crawl mode
pub fn analyzer_for(mode: CrawlMode) -> HtmlAnalyzer {
    match mode {
        CrawlMode::FullText => HtmlAnalyzer::full_text(),
        CrawlMode::Sitemap => HtmlAnalyzer::metadata_only(),
    }
}

/// Runs a complete fresh crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Build the configured fetcher
/// 2. Seed the frontier
/// 3. Fetch and analyze pages with the configured worker pool
/// 4. Return the collected pages and failures
///
/// # Example
///
/// ```no_run
/// use site_harvest::config::load_config;
/// use site_harvest::crawler::crawl;
/// use std::path::Path;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("crawl.toml"))?;
/// let outcome = crawl(&config, CancellationToken::new()).await?;
/// println!("{} pages", outcome.pages.len());
/// # Ok(())
/// # }
/// ```
pub async fn crawl(
    config: &Config,
    shutdown: CancellationToken,
) -> Result<CrawlOutcome, HarvestError> {
    let fetcher = AnyFetcher::from_config(config).await?;
    tracing::debug!("Using {} fetcher", fetcher.kind());
    Dispatcher::new(config, fetcher, analyzer_for(config.crawler.mode))?
        .with_shutdown(shutdown)
        .run()
        .await
}
