//! Output module for writing crawl results
//!
//! This module handles:
//! - Splitting completed pages into page-count bounded chunks
//! - Writing chunks as text (full-text mode) or CSV (sitemap mode)
//! - Generating the markdown run report
//! - Summarizing crawl statistics

mod chunk;
mod markdown;
mod sitemap;
pub mod stats;
mod text;
mod traits;

pub use chunk::{assemble, OutputChunk};
pub use markdown::{format_markdown_report, generate_markdown_report};
pub use sitemap::{SitemapCsvWriter, SITEMAP_COLUMNS};
pub use stats::{print_summary, CrawlSummary};
pub use text::TextChunkWriter;
pub use traits::{ChunkWriter, OutputContext, OutputError, OutputResult};

use crate::config::{Config, CrawlMode};
use crate::crawler::CrawlOutcome;
use std::path::PathBuf;

/// Files produced by [`write_outputs`]
#[derive(Debug, Clone)]
pub struct WrittenOutput {
    /// Chunk files in part order
    pub chunks: Vec<PathBuf>,

    /// The markdown report
    pub report: PathBuf,

    pub summary: CrawlSummary,
}

/// Writes every chunk with `writer`, returning the file paths in part order
pub fn write_chunks<W: ChunkWriter>(
    writer: &W,
    chunks: &[OutputChunk],
    ctx: &OutputContext,
) -> OutputResult<Vec<PathBuf>> {
    let mut paths = Vec::with_capacity(chunks.len());
    for chunk in chunks {
        let path = ctx.chunk_path(writer.label(), writer.extension(), chunk.part, chunk.total);
        writer.write_chunk(chunk, ctx, &path)?;
        paths.push(path);
    }
    Ok(paths)
}

/// Writes the chunk files and the run report for a finished crawl
///
/// When the crawl produced no pages, no chunk files are written and a
/// warning is logged; the report is still written.
pub fn write_outputs(
    config: &Config,
    scopes: Vec<String>,
    fingerprint: String,
    outcome: &CrawlOutcome,
) -> OutputResult<WrittenOutput> {
    let ctx = OutputContext::new(config, outcome.counters.discovered, outcome.pages.len())?;
    std::fs::create_dir_all(&ctx.output_dir)?;

    let chunks = assemble(outcome.pages.clone(), ctx.pages_per_file);
    let files = if chunks.is_empty() {
        tracing::warn!("No pages were fetched; no content files written");
        Vec::new()
    } else {
        tracing::info!(
            "Writing {} pages into {} file(s), up to {} pages each",
            outcome.pages.len(),
            chunks.len(),
            ctx.pages_per_file
        );
        match config.crawler.mode {
            CrawlMode::FullText => write_chunks(&TextChunkWriter, &chunks, &ctx)?,
            CrawlMode::Sitemap => write_chunks(&SitemapCsvWriter, &chunks, &ctx)?,
        }
    };

    let summary = CrawlSummary::new(config, scopes, fingerprint, outcome, files.clone());
    let report = ctx.report_path();
    generate_markdown_report(&summary, &report)?;

    Ok(WrittenOutput {
        chunks: files,
        report,
        summary,
    })
}
