//! Configuration module for Site-Harvest
//!
//! This module handles loading and validating crawl configuration, which
//! comes from built-in defaults, an optional TOML file, and CLI flags.
//!
//! # Example
//!
//! ```no_run
//! use site_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("crawl.toml")).unwrap();
//! println!("Crawler will use {} workers", config.crawler.workers);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    CheckpointConfig, Config, CrawlMode, CrawlerConfig, OutputConfig, ScopeConfig,
    DEFAULT_CHECKPOINT_EVERY, DEFAULT_MAX_PAGES, DEFAULT_PAGES_PER_FILE, MAX_WORKERS,
};

// Re-export parser functions
pub use parser::{compute_fingerprint, load_config, read_config, read_url_list};
pub use validation::validate;
