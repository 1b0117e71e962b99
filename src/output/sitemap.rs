//! CSV chunk files for sitemap crawls

use crate::output::chunk::OutputChunk;
use crate::output::traits::{ChunkWriter, OutputContext, OutputResult};
use std::path::Path;

/// Column names of every sitemap file
pub const SITEMAP_COLUMNS: [&str; 5] = ["index", "url", "status", "title", "h1"];

/// Writes each chunk as a `.csv` file with one row per page
#[derive(Debug, Clone, Copy, Default)]
pub struct SitemapCsvWriter;

impl ChunkWriter for SitemapCsvWriter {
    fn label(&self) -> &'static str {
        "sitemap"
    }

    fn extension(&self) -> &'static str {
        "csv"
    }

    fn write_chunk(
        &self,
        chunk: &OutputChunk,
        _ctx: &OutputContext,
        path: &Path,
    ) -> OutputResult<()> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(SITEMAP_COLUMNS)?;
        for page in &chunk.pages {
            writer.write_record([
                page.discovery_index.to_string(),
                page.url.clone(),
                page.status.to_string(),
                page.title.clone(),
                page.h1.clone().unwrap_or_default(),
            ])?;
        }
        writer.flush()?;

        tracing::info!("Wrote {} ({} rows)", path.display(), chunk.pages.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Page;
    use chrono::Local;
    use tempfile::TempDir;

    #[test]
    fn test_write_sitemap_chunk() {
        let dir = TempDir::new().unwrap();
        let ctx = OutputContext {
            site: "example.com".to_string(),
            target_path: "/".to_string(),
            generated_at: Local::now(),
            discovered: 2,
            fetched: 2,
            output_dir: dir.path().to_path_buf(),
            pages_per_file: 80,
        };
        let chunk = OutputChunk {
            part: 1,
            total: 1,
            pages: vec![
                Page {
                    url: "https://example.com/".to_string(),
                    title: "Home, sweet home".to_string(),
                    h1: Some("Welcome".to_string()),
                    body_text: None,
                    status: 200,
                    discovery_index: 0,
                },
                Page {
                    url: "https://example.com/about".to_string(),
                    title: "About".to_string(),
                    h1: None,
                    body_text: None,
                    status: 200,
                    discovery_index: 1,
                },
            ],
        };
        let path = dir.path().join("sitemap.csv");

        SitemapCsvWriter.write_chunk(&chunk, &ctx, &path).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(headers, SITEMAP_COLUMNS);

        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][1], "https://example.com/");
        assert_eq!(&rows[0][3], "Home, sweet home");
        assert_eq!(&rows[0][4], "Welcome");
        assert_eq!(&rows[1][0], "1");
        assert_eq!(&rows[1][4], "");
    }
}
