//! Output writer traits and shared types
//!
//! This module defines the trait interface for chunk writers and the
//! run-level context every output file is stamped with.

use crate::config::Config;
use crate::output::chunk::OutputChunk;
use crate::url::{normalize_url, resolve_base_path};
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("No seed URL to name output files after")]
    NoSeed,
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Facts about the run shared by every file it writes
#[derive(Debug, Clone)]
pub struct OutputContext {
    /// Host of the first seed
    pub site: String,

    /// Base path of the first seed
    pub target_path: String,

    /// When output generation started
    pub generated_at: DateTime<Local>,

    /// URLs discovered during the crawl
    pub discovered: u64,

    /// Pages fetched successfully
    pub fetched: usize,

    /// Directory files are written to
    pub output_dir: PathBuf,

    /// Maximum pages per chunk
    pub pages_per_file: usize,
}

impl OutputContext {
    /// Builds the context for a crawl of `config`
    pub fn new(config: &Config, discovered: u64, fetched: usize) -> OutputResult<Self> {
        let seed = config
            .seeds
            .iter()
            .find_map(|s| normalize_url(s).ok())
            .ok_or(OutputError::NoSeed)?;

        Ok(Self {
            site: seed.host_str().unwrap_or_default().to_string(),
            target_path: resolve_base_path(&seed, config.scope.base_path.as_deref()),
            generated_at: Local::now(),
            discovered,
            fetched,
            output_dir: config.output.output_dir.clone(),
            pages_per_file: config.output.pages_per_file,
        })
    }

    /// `example_com_docs` for `example.com` under `/docs/`
    pub fn file_stem(&self) -> String {
        let host = self.site.replace('.', "_");
        let path = self.target_path.replace('/', "_");
        let path = path.trim_matches('_');
        if path.is_empty() {
            host
        } else {
            format!("{}_{}", host, path)
        }
    }

    /// `YYYYmmdd_HHMMSS` stamp shared by all files of this run
    pub fn timestamp(&self) -> String {
        self.generated_at.format("%Y%m%d_%H%M%S").to_string()
    }

    /// Path of chunk `part` of `total`, e.g.
    /// `example_com_docs_all_content_20240101_120000_part1_of_3.txt`
    pub fn chunk_path(&self, label: &str, extension: &str, part: usize, total: usize) -> PathBuf {
        self.output_dir.join(format!(
            "{}_{}_{}_part{}_of_{}.{}",
            self.file_stem(),
            label,
            self.timestamp(),
            part,
            total,
            extension
        ))
    }

    /// Path of the run report
    pub fn report_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}_report_{}.md", self.file_stem(), self.timestamp()))
    }
}

/// Writes one [`OutputChunk`] to a file
pub trait ChunkWriter {
    /// Label that goes into the file name, e.g. `all_content`
    fn label(&self) -> &'static str;

    /// File extension, without the dot
    fn extension(&self) -> &'static str;

    /// Writes `chunk` to `path`
    fn write_chunk(&self, chunk: &OutputChunk, ctx: &OutputContext, path: &Path)
        -> OutputResult<()>;
}
