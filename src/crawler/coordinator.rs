//! Fetch dispatcher - main crawl orchestration logic
//!
//! This module contains the worker pool that drives a crawl:
//! - Drawing batches of URLs from the shared frontier
//! - Fetching and analyzing pages outside the frontier lock
//! - Passing discovered links through the scope filter
//! - Periodic checkpoints and progress reporting
//! - Cooperative stop on page cap or shutdown

use crate::config::Config;
use crate::crawler::fetcher::{FetchError, Fetcher};
use crate::crawler::parser::PageAnalyzer;
use crate::state::{Counters, FailedPage, FailureReason, Frontier, FrontierTask, Outcome, Page};
use crate::storage::{self, Checkpoint};
use crate::url::ScopeFilter;
use crate::HarvestError;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use url::Url;

/// Number of URLs a worker takes from the frontier at once
pub const BATCH_SIZE: usize = 4;

/// Completed pages between progress log lines
const PROGRESS_EVERY: u64 = 10;

/// Why a crawl ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Nothing left to fetch
    Exhausted,

    /// The page cap was reached with URLs still pending
    PageCap,

    /// Shutdown was requested
    Shutdown,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Exhausted => "frontier exhausted",
            Self::PageCap => "page cap reached",
            Self::Shutdown => "shutdown requested",
        };
        f.write_str(s)
    }
}

/// Everything a finished crawl produced
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    /// Completed pages, in discovery order
    pub pages: Vec<Page>,

    /// Failed URLs, in discovery order
    pub failures: Vec<FailedPage>,

    pub counters: Counters,

    /// URLs still pending when the crawl ended
    pub pending: usize,

    pub elapsed: Duration,

    pub stopped_by: StopReason,
}

/// Run parameters taken from the configuration
#[derive(Debug, Clone)]
struct DispatchSettings {
    workers: usize,
    max_pages: Option<usize>,
    delay: Duration,
    request_timeout: Duration,
    expand: bool,
    checkpoint_every: u64,
    checkpoint_path: Option<PathBuf>,
}

impl DispatchSettings {
    fn from_config(config: &Config) -> Self {
        Self {
            workers: config.crawler.workers.max(1),
            max_pages: config.effective_max_pages(),
            delay: config.delay(),
            request_timeout: config.request_timeout(),
            expand: !config.crawler.exact_urls,
            checkpoint_every: config.checkpoint.every.max(1) as u64,
            checkpoint_path: config.checkpoint.save_progress.clone(),
        }
    }
}

/// Runs a fixed pool of workers over a shared [`Frontier`]
///
/// With one worker this is a plain sequential crawl; more workers run the
/// same loop concurrently.
pub struct Dispatcher<F, A> {
    fetcher: F,
    analyzer: A,
    frontier: Arc<Frontier>,
    scope: ScopeFilter,
    settings: DispatchSettings,
    fingerprint: String,
    pages: Mutex<Vec<Page>>,
    checkpoint_lock: Mutex<()>,
    shutdown: CancellationToken,
    started: Instant,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<F, A> Dispatcher<F, A>
where
    F: Fetcher + 'static,
    A: PageAnalyzer + 'static,
{
    /// Creates a dispatcher for a fresh crawl, seeded from `config.seeds`
    pub fn new(config: &Config, fetcher: F, analyzer: A) -> Result<Self, HarvestError> {
        let frontier = Frontier::new();
        for seed in &config.seeds {
            if !frontier.enqueue_if_new(seed) {
                tracing::debug!("Seed {} skipped (duplicate or invalid)", seed);
            }
        }
        Self::build(config, fetcher, analyzer, frontier, Vec::new())
    }

    /// Creates a dispatcher that continues from a validated checkpoint
    pub fn resume(
        config: &Config,
        fetcher: F,
        analyzer: A,
        checkpoint: Checkpoint,
    ) -> Result<Self, HarvestError> {
        let frontier = checkpoint.rehydrate();
        tracing::info!(
            "Resuming crawl: {} pages done, {} failed, {} pending",
            checkpoint.frontier.counters.completed,
            checkpoint.frontier.counters.failed,
            frontier.pending_len()
        );
        Self::build(config, fetcher, analyzer, frontier, checkpoint.pages)
    }

    fn build(
        config: &Config,
        fetcher: F,
        analyzer: A,
        frontier: Frontier,
        pages: Vec<Page>,
    ) -> Result<Self, HarvestError> {
        Ok(Self {
            fetcher,
            analyzer,
            frontier: Arc::new(frontier),
            scope: ScopeFilter::from_config(config)?,
            settings: DispatchSettings::from_config(config),
            fingerprint: config.fingerprint()?,
            pages: Mutex::new(pages),
            checkpoint_lock: Mutex::new(()),
            shutdown: CancellationToken::new(),
            started: Instant::now(),
        })
    }

    /// Uses `token` to request a graceful stop
    pub fn with_shutdown(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    /// Token that stops the crawl when cancelled
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn frontier(&self) -> &Arc<Frontier> {
        &self.frontier
    }

    /// Runs the crawl to completion
    ///
    /// Per-page failures are recorded, never returned. An `Err` here means a
    /// logic error or a worker task that died.
    pub async fn run(mut self) -> Result<CrawlOutcome, HarvestError> {
        self.started = Instant::now();
        let workers = self.settings.workers;
        tracing::info!(
            "Starting crawl: {} worker(s), page cap {}, {} scope(s)",
            workers,
            self.settings
                .max_pages
                .map_or_else(|| "none".to_string(), |n| n.to_string()),
            self.scope.scopes().len()
        );

        let dispatcher = Arc::new(self);
        let mut handles = Vec::with_capacity(workers);
        for id in 0..workers {
            let ctx = Arc::clone(&dispatcher);
            let fetcher = dispatcher.fetcher.clone();
            let analyzer = dispatcher.analyzer.clone();
            handles.push(tokio::spawn(async move {
                let result = Arc::clone(&ctx).worker(id, fetcher, analyzer).await;
                if result.is_err() {
                    // Unblock the others; the entries this worker held are stuck
                    ctx.shutdown.cancel();
                    ctx.frontier.wake_all();
                }
                result
            }));
        }

        let mut first_error = None;
        for handle in handles {
            let result = handle
                .await
                .map_err(|e| HarvestError::Worker(e.to_string()))
                .and_then(|r| r);
            if let Err(e) = result {
                tracing::error!("Worker stopped with error: {}", e);
                first_error.get_or_insert(e);
            }
        }

        dispatcher.checkpoint();

        if let Some(e) = first_error {
            return Err(e);
        }
        Ok(dispatcher.outcome())
    }

    async fn worker(
        self: Arc<Self>,
        id: usize,
        fetcher: F,
        analyzer: A,
    ) -> Result<(), HarvestError> {
        tracing::debug!("Worker {} started", id);
        loop {
            let changed = self.frontier.changed();
            if self.shutdown.is_cancelled() {
                break;
            }

            let batch = self
                .frontier
                .take_next_batch(BATCH_SIZE, self.settings.max_pages);
            if batch.is_empty() {
                if self.frontier.is_exhausted() {
                    break;
                }
                if !self.frontier.has_capacity(self.settings.max_pages)
                    && self.frontier.in_flight() == 0
                {
                    break;
                }
                tokio::select! {
                    _ = changed => {}
                    _ = self.shutdown.cancelled() => break,
                }
                continue;
            }
            drop(changed);

            for (i, task) in batch.iter().enumerate() {
                if self.shutdown.is_cancelled() {
                    self.frontier.release(&batch[i..])?;
                    break;
                }
                self.process(task, &fetcher, &analyzer).await?;
            }
        }
        tracing::debug!("Worker {} finished", id);
        Ok(())
    }

    /// Fetches, analyzes and records one URL
    async fn process(
        &self,
        task: &FrontierTask,
        fetcher: &F,
        analyzer: &A,
    ) -> Result<(), HarvestError> {
        if !self.settings.delay.is_zero() {
            tokio::time::sleep(self.settings.delay).await;
        }

        tracing::debug!("Fetching {} (#{})", task.url, task.discovery_index);
        let fetched = tokio::time::timeout(self.settings.request_timeout, fetcher.fetch(&task.url))
            .await
            .unwrap_or(Err(FetchError::Timeout));

        let analyzed = fetched.map_err(FailureReason::from).and_then(|fetched| {
            let page_url = Url::parse(&fetched.final_url)
                .or_else(|_| Url::parse(&task.url))
                .map_err(|e| FailureReason::Analysis(format!("unusable page URL: {}", e)))?;
            let analyzed = analyzer
                .analyze(&fetched.body, &page_url)
                .map_err(FailureReason::from)?;
            Ok((fetched.status, analyzed))
        });

        let (status, analyzed) = match analyzed {
            Ok(ok) => ok,
            Err(reason) => {
                tracing::warn!("Failed to crawl {}: {}", task.url, reason);
                self.frontier
                    .mark_state(&task.url, Outcome::Failed(reason))?;
                return Ok(());
            }
        };

        // Links go in before the page is marked, so the frontier never looks
        // exhausted while this page can still add to it
        if self.settings.expand {
            let mut added = 0;
            for link in &analyzed.links {
                if self.scope.accepts(link) && self.frontier.enqueue_if_new(link) {
                    added += 1;
                }
            }
            tracing::debug!("{}: {} links, {} new", task.url, analyzed.links.len(), added);
        }

        let page = Page {
            url: task.url.clone(),
            title: analyzed.title,
            h1: analyzed.h1,
            body_text: analyzed.body_text,
            status,
            discovery_index: task.discovery_index,
        };

        let counters = {
            let mut pages = lock(&self.pages);
            let counters = self.frontier.mark_state(&task.url, Outcome::Visited)?;
            pages.push(page);
            counters
        };

        if counters.completed % PROGRESS_EVERY == 0 {
            let rate = counters.completed as f64 / self.started.elapsed().as_secs_f64().max(0.001);
            tracing::info!(
                "Progress: {} pages crawled, {} failed, {} pending, {:.2} pages/sec",
                counters.completed,
                counters.failed,
                self.frontier.pending_len(),
                rate
            );
        }
        if counters.completed % self.settings.checkpoint_every == 0 {
            self.checkpoint();
        }

        Ok(())
    }

    /// Writes a checkpoint if a destination is configured
    ///
    /// Failures are logged; a crawl never stops because a checkpoint could
    /// not be written.
    fn checkpoint(&self) {
        let Some(path) = &self.settings.checkpoint_path else {
            return;
        };

        let checkpoint = {
            let pages = lock(&self.pages);
            Checkpoint::snapshot(&self.frontier, &self.fingerprint, &pages)
        };

        let _guard = lock(&self.checkpoint_lock);
        match storage::persist(&checkpoint, path) {
            Ok(()) => tracing::info!(
                "Checkpoint saved to {} ({} pages, {} pending)",
                path.display(),
                checkpoint.frontier.counters.completed,
                checkpoint.frontier.pending.len()
            ),
            Err(e) => tracing::error!("Failed to save checkpoint to {}: {}", path.display(), e),
        }
    }

    fn outcome(&self) -> CrawlOutcome {
        let mut pages = std::mem::take(&mut *lock(&self.pages));
        pages.sort_by_key(|p| p.discovery_index);

        let pending = self.frontier.pending_len();
        let stopped_by = if self.shutdown.is_cancelled() {
            StopReason::Shutdown
        } else if pending == 0 {
            StopReason::Exhausted
        } else {
            StopReason::PageCap
        };

        let outcome = CrawlOutcome {
            pages,
            failures: self.frontier.failures(),
            counters: self.frontier.counters(),
            pending,
            elapsed: self.started.elapsed(),
            stopped_by,
        };

        tracing::info!(
            "Crawl finished ({}): {} pages, {} failed, {} pending, in {:.1?}",
            outcome.stopped_by,
            outcome.counters.completed,
            outcome.counters.failed,
            outcome.pending,
            outcome.elapsed
        );
        outcome
    }
}
