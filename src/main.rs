//! Site-Harvest main entry point
//!
//! This is the command-line interface for the Site-Harvest scoped crawler.

use anyhow::Context;
use clap::{ArgGroup, Parser};
use site_harvest::config::{read_config, read_url_list, validate, Config, CrawlMode};
use site_harvest::crawler::{analyzer_for, AnyFetcher, Dispatcher};
use site_harvest::output::{print_summary, write_outputs};
use site_harvest::storage;
use site_harvest::url::ScopeFilter;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Site-Harvest: crawl one section of a website into upload-sized text files
///
/// Site-Harvest crawls every page under a base path of a site, extracts the
/// readable text, and writes it into numbered files of a bounded number of
/// pages each. Long crawls can be checkpointed and resumed.
#[derive(Parser, Debug)]
#[command(name = "site-harvest")]
#[command(version = "1.0.0")]
#[command(about = "Scoped site crawler and text extractor", long_about = None)]
#[command(group(ArgGroup::new("source").args(["url", "url_list"])))]
struct Cli {
    /// Website URL to start from
    #[arg(value_name = "URL")]
    url: Option<String>,

    /// File with one URL per line to start from (blank lines and # comments ignored)
    #[arg(long, value_name = "FILE")]
    url_list: Option<PathBuf>,

    /// Path to TOML configuration file; flags override its values
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Maximum number of pages to fetch (default: 1000)
    #[arg(long, value_name = "N", conflicts_with = "no_limit")]
    max_pages: Option<usize>,

    /// Disable the page limit
    #[arg(long)]
    no_limit: bool,

    /// Seconds each worker waits before each request (default: 1.0)
    #[arg(long, value_name = "SECS")]
    delay: Option<f64>,

    /// Only crawl under this path (default: the start URL's directory)
    #[arg(long, value_name = "PATH")]
    base_path: Option<String>,

    /// Pages per output file (default: 80)
    #[arg(long, value_name = "N")]
    pages_per_file: Option<usize>,

    /// Render pages in headless Chromium (requires the `browser` feature)
    #[arg(long)]
    javascript: bool,

    /// Fetch only the given URLs, never follow links
    #[arg(long)]
    exact_urls: bool,

    /// Record URL, status, title and H1 into CSV instead of extracting text
    #[arg(long)]
    sitemap: bool,

    /// Page limit used in sitemap mode
    #[arg(long, value_name = "N")]
    sitemap_max_pages: Option<usize>,

    /// Number of concurrent workers, 1-20 (default: 1)
    #[arg(short, long, value_name = "N")]
    workers: Option<usize>,

    /// Write progress checkpoints to this file
    #[arg(long, value_name = "FILE")]
    save_progress: Option<PathBuf>,

    /// Resume from a checkpoint written by --save-progress
    #[arg(long, value_name = "FILE")]
    resume_from: Option<PathBuf>,

    /// Completed pages between checkpoints (default: 50)
    #[arg(long, value_name = "K")]
    checkpoint_every: Option<usize>,

    /// Directory for output files (default: current directory)
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate configuration and show the crawl scope without fetching anything
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = build_config(&cli)?;
    if let Err(e) = validate(&config) {
        tracing::error!("Invalid configuration: {}", e);
        return Err(e.into());
    }

    if cli.dry_run {
        handle_dry_run(&config)?;
    } else {
        handle_crawl(config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("site_harvest=info,warn"),
            1 => EnvFilter::new("site_harvest=debug,info"),
            2 => EnvFilter::new("site_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Defaults, then the config file, then command-line flags
fn build_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            read_config(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?
        }
        None => Config::default(),
    };

    if let Some(url) = &cli.url {
        config.seeds = vec![url.clone()];
    }
    if let Some(path) = &cli.url_list {
        config.seeds = read_url_list(path)
            .with_context(|| format!("Failed to read URL list {}", path.display()))?;
        tracing::info!("Loaded {} URLs from {}", config.seeds.len(), path.display());
    }

    let crawler = &mut config.crawler;
    if let Some(n) = cli.max_pages {
        crawler.max_pages = n;
    }
    crawler.no_limit |= cli.no_limit;
    if let Some(delay) = cli.delay {
        crawler.delay_secs = delay;
    }
    crawler.javascript |= cli.javascript;
    crawler.exact_urls |= cli.exact_urls;
    if cli.sitemap {
        crawler.mode = CrawlMode::Sitemap;
    }
    if cli.sitemap_max_pages.is_some() {
        crawler.sitemap_max_pages = cli.sitemap_max_pages;
    }
    if let Some(n) = cli.workers {
        crawler.workers = n;
    }

    if cli.base_path.is_some() {
        config.scope.base_path = cli.base_path.clone();
    }

    if let Some(n) = cli.pages_per_file {
        config.output.pages_per_file = n;
    }
    if let Some(dir) = &cli.output_dir {
        config.output.output_dir = dir.clone();
    }

    if cli.save_progress.is_some() {
        config.checkpoint.save_progress = cli.save_progress.clone();
    }
    if cli.resume_from.is_some() {
        config.checkpoint.resume_from = cli.resume_from.clone();
    }
    if let Some(k) = cli.checkpoint_every {
        config.checkpoint.every = k;
    }

    Ok(config)
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    let scope = ScopeFilter::from_config(config)?;

    println!("=== Site-Harvest Dry Run ===\n");

    println!("Seeds ({}):", config.seeds.len());
    for seed in &config.seeds {
        println!("  - {}", seed);
    }

    println!("\nScope:");
    for site in scope.scopes() {
        println!("  - {}", site);
    }
    if scope.is_exact() {
        println!("  (exact URLs only, links are not followed)");
    }
    println!("  Excluded prefixes: {}", config.scope.excluded_prefixes.join(", "));
    println!(
        "  Excluded extensions: {}",
        config.scope.excluded_extensions.join(", ")
    );

    println!("\nCrawler:");
    println!("  Mode: {}", config.crawler.mode.as_str());
    match config.effective_max_pages() {
        Some(n) => println!("  Max pages: {}", n),
        None => println!("  Max pages: unlimited"),
    }
    println!("  Workers: {}", config.crawler.workers);
    println!("  Delay: {}s", config.crawler.delay_secs);
    println!("  JavaScript: {}", config.crawler.javascript);

    println!("\nOutput:");
    println!("  Directory: {}", config.output.output_dir.display());
    println!("  Pages per file: {}", config.output.pages_per_file);
    if let Some(path) = &config.checkpoint.save_progress {
        println!(
            "  Checkpoint: {} (every {} pages)",
            path.display(),
            config.checkpoint.every
        );
    }

    println!("\nConfig fingerprint: {}", config.fingerprint()?);
    println!("\n✓ Configuration is valid");

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(mut config: Config) -> anyhow::Result<()> {
    let fingerprint = config.fingerprint()?;
    let scopes: Vec<String> = ScopeFilter::from_config(&config)?
        .scopes()
        .iter()
        .map(ToString::to_string)
        .collect();
    tracing::info!("Crawling {} seed URL(s) within {}", config.seeds.len(), scopes.join(", "));

    let shutdown = CancellationToken::new();
    let token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received; finishing in-flight pages");
            token.cancel();
        }
    });

    let fetcher = AnyFetcher::from_config(&config)
        .await
        .context("Failed to set up the page fetcher")?;
    let analyzer = analyzer_for(config.crawler.mode);

    let dispatcher = match storage::prepare_resume(&mut config, &fingerprint) {
        Some(checkpoint) => Dispatcher::resume(&config, fetcher, analyzer, checkpoint)?,
        None => Dispatcher::new(&config, fetcher, analyzer)?,
    };

    let outcome = match dispatcher.with_shutdown(shutdown).run().await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            return Err(e.into());
        }
    };

    let written = write_outputs(&config, scopes, fingerprint, &outcome)
        .context("Failed to write output files")?;

    print_summary(&written.summary);
    println!("\nReport: {}", written.report.display());

    Ok(())
}
