//! Plain-text chunk files for full-text crawls

use crate::output::chunk::OutputChunk;
use crate::output::traits::{ChunkWriter, OutputContext, OutputResult};
use crate::state::Page;
use std::fs;
use std::path::Path;

/// Writes each chunk as a `.txt` file: a header, then one block per page
#[derive(Debug, Clone, Copy, Default)]
pub struct TextChunkWriter;

impl TextChunkWriter {
    /// Renders a chunk exactly as it is written to disk
    pub fn render(&self, chunk: &OutputChunk, ctx: &OutputContext) -> String {
        let first = chunk.first_page_number(ctx.pages_per_file);
        let last = first + chunk.pages.len().saturating_sub(1);

        let mut out = String::new();
        out.push_str(&format!(
            "Full site content (part {}/{})\n",
            chunk.part, chunk.total
        ));
        out.push_str(&format!("Site: {}\n", ctx.site));
        out.push_str(&format!("Target path: {}*\n", ctx.target_path));
        out.push_str(&format!(
            "Extracted: {}\n",
            ctx.generated_at.format("%Y-%m-%d %H:%M:%S")
        ));
        out.push_str(&format!("Pages discovered: {}\n", ctx.discovered));
        out.push_str(&format!("Pages fetched: {}\n", ctx.fetched));
        out.push_str(&format!(
            "This file: {} pages (pages {}-{})\n\n",
            chunk.pages.len(),
            first,
            last
        ));
        out.push_str(&"=".repeat(80));
        out.push_str("\n\n");

        let blocks: Vec<String> = chunk.pages.iter().map(page_block).collect();
        out.push_str(&blocks.join("\n"));
        out
    }
}

fn page_block(page: &Page) -> String {
    let rule = "=".repeat(50);
    let mut block = format!("\n{}\nURL: {}\nTitle: {}\n", rule, page.url, page.title);
    if let Some(h1) = &page.h1 {
        block.push_str(&format!("H1: {}\n", h1));
    }
    block.push_str(&format!(
        "{}\n\n{}\n\n",
        rule,
        page.body_text.as_deref().unwrap_or("")
    ));
    block
}

impl ChunkWriter for TextChunkWriter {
    fn label(&self) -> &'static str {
        "all_content"
    }

    fn extension(&self) -> &'static str {
        "txt"
    }

    fn write_chunk(
        &self,
        chunk: &OutputChunk,
        ctx: &OutputContext,
        path: &Path,
    ) -> OutputResult<()> {
        let content = self.render(chunk, ctx);
        fs::write(path, content.as_bytes())?;
        tracing::info!(
            "Wrote {} ({} pages, {:.1} KB)",
            path.display(),
            chunk.pages.len(),
            content.len() as f64 / 1024.0
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn context(dir: &Path) -> OutputContext {
        OutputContext {
            site: "example.com".to_string(),
            target_path: "/docs/".to_string(),
            generated_at: Local::now(),
            discovered: 12,
            fetched: 3,
            output_dir: dir.to_path_buf(),
            pages_per_file: 2,
        }
    }

    fn chunk() -> OutputChunk {
        OutputChunk {
            part: 2,
            total: 2,
            pages: vec![Page {
                url: "https://example.com/docs/setup".to_string(),
                title: "Setup".to_string(),
                h1: Some("Installing".to_string()),
                body_text: Some("Run the installer.".to_string()),
                status: 200,
                discovery_index: 4,
            }],
        }
    }

    #[test]
    fn test_render_header_and_block() {
        let text = TextChunkWriter.render(&chunk(), &context(&PathBuf::from(".")));

        assert!(text.starts_with("Full site content (part 2/2)\n"));
        assert!(text.contains("Site: example.com\n"));
        assert!(text.contains("Target path: /docs/*\n"));
        assert!(text.contains("Pages discovered: 12\n"));
        assert!(text.contains("Pages fetched: 3\n"));
        assert!(text.contains("This file: 1 pages (pages 3-3)\n"));
        assert!(text.contains("URL: https://example.com/docs/setup\nTitle: Setup\nH1: Installing\n"));
        assert!(text.contains("\n\nRun the installer.\n\n"));
    }

    #[test]
    fn test_write_chunk() {
        let dir = TempDir::new().unwrap();
        let ctx = context(dir.path());
        let path = dir.path().join("part.txt");

        TextChunkWriter.write_chunk(&chunk(), &ctx, &path).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(written, TextChunkWriter.render(&chunk(), &ctx));
    }
}
