use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default page cap when `--no-limit` is not given
pub const DEFAULT_MAX_PAGES: usize = 1000;

/// Default number of pages written into a single output file
pub const DEFAULT_PAGES_PER_FILE: usize = 80;

/// Default number of completed pages between checkpoints
pub const DEFAULT_CHECKPOINT_EVERY: usize = 50;

/// Upper bound for the worker pool
pub const MAX_WORKERS: usize = 20;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// What a crawl produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CrawlMode {
    /// Extract page text into `.txt` chunks
    #[default]
    FullText,

    /// Record URL, status, title and H1 only, into `.csv` chunks
    Sitemap,
}

impl CrawlMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FullText => "full-text",
            Self::Sitemap => "sitemap",
        }
    }
}

/// Main configuration structure for Site-Harvest
///
/// Built from defaults, an optional TOML file, and command-line flags, in
/// that order of precedence. Immutable once a crawl starts.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Seed URLs the crawl starts from
    pub seeds: Vec<String>,
    pub crawler: CrawlerConfig,
    pub scope: ScopeConfig,
    pub output: OutputConfig,
    pub checkpoint: CheckpointConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Maximum number of pages to fetch successfully
    pub max_pages: usize,

    /// Disables the page cap entirely
    pub no_limit: bool,

    /// Page cap used instead of `max_pages` in sitemap mode
    pub sitemap_max_pages: Option<usize>,

    /// Delay each worker waits before each of its fetches (seconds)
    pub delay_secs: f64,

    /// Number of concurrent workers
    pub workers: usize,

    /// Render pages in a headless browser before extracting them
    pub javascript: bool,

    /// Fetch only the seed URLs, never follow links
    pub exact_urls: bool,

    /// Full-text or sitemap output
    pub mode: CrawlMode,

    /// Per-request timeout (seconds)
    pub request_timeout_secs: u64,

    /// User-Agent header sent by both fetchers
    pub user_agent: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_pages: DEFAULT_MAX_PAGES,
            no_limit: false,
            sitemap_max_pages: None,
            delay_secs: 1.0,
            workers: 1,
            javascript: false,
            exact_urls: false,
            mode: CrawlMode::FullText,
            request_timeout_secs: 30,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Crawl scope configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ScopeConfig {
    /// Explicit base path; derived from each seed when absent
    pub base_path: Option<String>,

    /// Path prefixes that are never crawled
    pub excluded_prefixes: Vec<String>,

    /// File extensions that are never crawled
    pub excluded_extensions: Vec<String>,
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            base_path: None,
            excluded_prefixes: ["/admin/", "/api/", "/wp-admin/", "/login/", "/logout/"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            excluded_extensions: [
                ".pdf", ".jpg", ".jpeg", ".png", ".gif", ".zip", ".doc", ".docx", ".xls", ".xlsx",
                ".mp4", ".mp3",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Directory the chunk files and report are written to
    pub output_dir: PathBuf,

    /// Maximum number of pages per output file
    pub pages_per_file: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            pages_per_file: DEFAULT_PAGES_PER_FILE,
        }
    }
}

/// Checkpoint configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CheckpointConfig {
    /// Where progress snapshots are written
    pub save_progress: Option<PathBuf>,

    /// Snapshot to resume from
    pub resume_from: Option<PathBuf>,

    /// Completed pages between snapshots
    pub every: usize,
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            save_progress: None,
            resume_from: None,
            every: DEFAULT_CHECKPOINT_EVERY,
        }
    }
}

impl Config {
    /// Returns the page cap in effect, or `None` when unlimited
    pub fn effective_max_pages(&self) -> Option<usize> {
        if self.crawler.no_limit {
            return None;
        }
        match (self.crawler.mode, self.crawler.sitemap_max_pages) {
            (CrawlMode::Sitemap, Some(cap)) => Some(cap),
            _ => Some(self.crawler.max_pages),
        }
    }

    /// Per-worker delay before each fetch
    pub fn delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.crawler.delay_secs).unwrap_or(Duration::ZERO)
    }

    /// Timeout applied to every fetch attempt
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.crawler.request_timeout_secs)
    }

    /// Fingerprint of the scope-defining fields, see
    /// [`compute_fingerprint`](crate::config::compute_fingerprint)
    pub fn fingerprint(&self) -> Result<String, crate::ConfigError> {
        super::parser::compute_fingerprint(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.crawler.workers, 1);
        assert_eq!(config.output.pages_per_file, 80);
        assert_eq!(config.checkpoint.every, 50);
        assert_eq!(config.effective_max_pages(), Some(1000));
        assert_eq!(config.delay(), Duration::from_secs(1));
        assert_eq!(config.scope.excluded_prefixes.len(), 5);
    }

    #[test]
    fn test_no_limit() {
        let mut config = Config::default();
        config.crawler.no_limit = true;
        config.crawler.sitemap_max_pages = Some(10);
        assert_eq!(config.effective_max_pages(), None);
    }

    #[test]
    fn test_sitemap_cap_only_in_sitemap_mode() {
        let mut config = Config::default();
        config.crawler.sitemap_max_pages = Some(10);
        assert_eq!(config.effective_max_pages(), Some(1000));

        config.crawler.mode = CrawlMode::Sitemap;
        assert_eq!(config.effective_max_pages(), Some(10));
    }

    #[test]
    fn test_negative_delay_clamps_to_zero() {
        let mut config = Config::default();
        config.crawler.delay_secs = -1.0;
        assert_eq!(config.delay(), Duration::ZERO);
    }
}
