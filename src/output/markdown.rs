//! Markdown run report
//!
//! This module generates the human-readable report written next to the
//! chunk files: counters, stop reason, files, and every failed URL.

use crate::output::stats::CrawlSummary;
use crate::output::traits::OutputResult;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Failures listed individually before the table is cut off
const MAX_FAILURE_ROWS: usize = 200;

/// Writes the markdown report for `summary` to `output_path`
pub fn generate_markdown_report(summary: &CrawlSummary, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_report(summary);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    tracing::info!("Wrote report {}", output_path.display());
    Ok(())
}

/// Formats a crawl summary as markdown
pub fn format_markdown_report(summary: &CrawlSummary) -> String {
    let mut md = String::new();

    md.push_str("# Site-Harvest Crawl Report\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Mode**: {}\n", summary.mode.as_str()));
    md.push_str("- **Scope**:\n");
    for scope in &summary.scopes {
        md.push_str(&format!("  - `{}`\n", scope));
    }
    md.push_str(&format!(
        "- **Duration**: {:.1} seconds\n",
        summary.elapsed.as_secs_f64()
    ));
    md.push_str(&format!("- **Stopped**: {}\n", summary.stopped_by));
    md.push_str(&format!("- **Config Fingerprint**: {}\n\n", summary.fingerprint));

    // Overall statistics
    md.push_str("## Overall Statistics\n\n");
    md.push_str("| Metric | Count |\n");
    md.push_str("|--------|-------|\n");
    md.push_str(&format!("| Discovered | {} |\n", summary.counters.discovered));
    md.push_str(&format!("| Fetched | {} |\n", summary.counters.completed));
    md.push_str(&format!("| Failed | {} |\n", summary.counters.failed));
    md.push_str(&format!("| Pending | {} |\n\n", summary.pending));
    md.push_str(&format!(
        "**Success Rate**: {:.2}%\n\n",
        summary.success_rate()
    ));

    // Output files
    if !summary.files.is_empty() {
        md.push_str("## Output Files\n\n");
        for file in &summary.files {
            let name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| file.display().to_string());
            md.push_str(&format!("- {}\n", name));
        }
        md.push('\n');
    }

    // Failures
    if !summary.failures.is_empty() {
        md.push_str("## Failure Summary\n\n");
        md.push_str("| Reason | Count |\n");
        md.push_str("|--------|-------|\n");
        for (kind, count) in summary.failure_breakdown() {
            md.push_str(&format!("| {} | {} |\n", kind, count));
        }
        md.push('\n');

        md.push_str("## Failed URLs\n\n");
        md.push_str("| URL | Reason |\n");
        md.push_str("|-----|--------|\n");
        for failure in summary.failures.iter().take(MAX_FAILURE_ROWS) {
            md.push_str(&format!(
                "| {} | {} |\n",
                failure.url,
                failure.reason.to_string().replace('|', "\\|")
            ));
        }
        if summary.failures.len() > MAX_FAILURE_ROWS {
            md.push_str(&format!(
                "\n... and {} more\n",
                summary.failures.len() - MAX_FAILURE_ROWS
            ));
        }
        md.push('\n');
    }

    md
}
