//! Crawl statistics derived from a finished run
//!
//! This module turns a [`CrawlOutcome`] into the summary used by the report
//! and the end-of-run console output.

use crate::config::{Config, CrawlMode};
use crate::crawler::{CrawlOutcome, StopReason};
use crate::state::{Counters, FailedPage, FailureReason};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Summary statistics for a crawl
#[derive(Debug, Clone)]
pub struct CrawlSummary {
    /// Crawl scopes, e.g. `example.com/docs/*`
    pub scopes: Vec<String>,
    pub mode: CrawlMode,
    pub fingerprint: String,
    pub counters: Counters,
    pub pending: usize,
    pub elapsed: Duration,
    pub stopped_by: StopReason,
    pub failures: Vec<FailedPage>,

    /// Chunk files written for this run
    pub files: Vec<PathBuf>,
}

impl CrawlSummary {
    pub fn new(
        config: &Config,
        scopes: Vec<String>,
        fingerprint: String,
        outcome: &CrawlOutcome,
        files: Vec<PathBuf>,
    ) -> Self {
        Self {
            scopes,
            mode: config.crawler.mode,
            fingerprint,
            counters: outcome.counters,
            pending: outcome.pending,
            elapsed: outcome.elapsed,
            stopped_by: outcome.stopped_by,
            failures: outcome.failures.clone(),
            files,
        }
    }

    /// Share of attempted URLs that were fetched successfully, in percent
    pub fn success_rate(&self) -> f64 {
        let attempted = self.counters.completed + self.counters.failed;
        if attempted == 0 {
            return 0.0;
        }
        self.counters.completed as f64 / attempted as f64 * 100.0
    }

    /// Number of failures per kind of reason
    pub fn failure_breakdown(&self) -> BTreeMap<&'static str, usize> {
        let mut breakdown = BTreeMap::new();
        for failure in &self.failures {
            *breakdown.entry(failure_kind(&failure.reason)).or_insert(0) += 1;
        }
        breakdown
    }
}

fn failure_kind(reason: &FailureReason) -> &'static str {
    match reason {
        FailureReason::Timeout => "Timeout",
        FailureReason::Connection(_) => "Connection",
        FailureReason::HttpStatus(_) => "HTTP status",
        FailureReason::UnsupportedContent(_) => "Unsupported content",
        FailureReason::Renderer(_) => "Renderer",
        FailureReason::Analysis(_) => "Analysis",
    }
}

/// Prints a crawl summary to stdout
pub fn print_summary(summary: &CrawlSummary) {
    println!("=== Site-Harvest Crawl Summary ===\n");

    println!("Scope:");
    for scope in &summary.scopes {
        println!("  {}", scope);
    }
    println!("Mode: {}", summary.mode.as_str());
    println!("Stopped: {}", summary.stopped_by);
    println!("Duration: {:.1?}", summary.elapsed);
    println!();

    println!("Discovered: {}", summary.counters.discovered);
    println!("Fetched:    {}", summary.counters.completed);
    println!("Failed:     {}", summary.counters.failed);
    println!("Pending:    {}", summary.pending);
    println!("Success rate: {:.2}%", summary.success_rate());

    let breakdown = summary.failure_breakdown();
    if !breakdown.is_empty() {
        println!("\nFailures:");
        for (kind, count) in &breakdown {
            println!("  {:20} {}", kind, count);
        }
    }

    if !summary.files.is_empty() {
        println!("\nFiles written ({}):", summary.files.len());
        for (i, file) in summary.files.iter().enumerate() {
            println!("  {}. {}", i + 1, file.display());
        }
    }
}
