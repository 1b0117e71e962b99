//! Site-Harvest: a scoped site crawler that packs page text into upload-sized files
//!
//! This crate crawls the part of a website that lives under a base path,
//! extracts each page's text, and writes the results as ordered, page-count
//! bounded output chunks. Crawls can run with several workers and can be
//! checkpointed and resumed.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Site-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Invalid state transition for {url}: {from} -> {to}")]
    InvalidTransition {
        url: String,
        from: state::EntryState,
        to: state::EntryState,
    },

    #[error("Worker task failed: {0}")]
    Worker(String),

    #[error("Unknown frontier entry: {0}")]
    UnknownEntry(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

// Re-export commonly used types
pub use config::{Config, CrawlMode};
pub use crawler::Dispatcher;
pub use state::{EntryState, Frontier, Page};
pub use url::{normalize_url, ScopeFilter};
