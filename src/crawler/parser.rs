//! HTML analysis: title, heading, readable text and outgoing links
//!
//! This module handles parsing HTML content to extract:
//! - Page title and first `<h1>`
//! - The main readable text, with page chrome stripped
//! - Links to follow (from `<a>` tags)

use crate::state::FailureReason;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use url::Url;

/// Title used when a document has none
pub const UNTITLED: &str = "Untitled";

/// Containers that usually hold a page's main content, in priority order
const MAIN_CONTENT_SELECTORS: &[&str] = &[
    "main",
    "article",
    ".content",
    ".main-content",
    "#content",
    "#main",
    "[role=\"main\"]",
];

/// Elements whose text is never part of the extracted content
const EXCLUDED_TAGS: &[&str] = &[
    "script", "style", "nav", "footer", "header", "aside", "noscript",
];

/// Extracted information from an HTML page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzedPage {
    /// The page title, [`UNTITLED`] if missing
    pub title: String,

    /// Text of the first `<h1>`
    pub h1: Option<String>,

    /// Readable text; `None` when text extraction is off
    pub body_text: Option<String>,

    /// All links found on the page (absolute URLs, document order)
    pub links: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("document is empty")]
    EmptyDocument,
}

impl From<AnalysisError> for FailureReason {
    fn from(err: AnalysisError) -> Self {
        FailureReason::Analysis(err.to_string())
    }
}

/// Turns raw page content into an [`AnalyzedPage`]
pub trait PageAnalyzer: Send + Sync + Clone {
    fn analyze(&self, raw: &str, page_url: &Url) -> Result<AnalyzedPage, AnalysisError>;
}

/// [`PageAnalyzer`] backed by `scraper`
#[derive(Debug, Clone)]
pub struct HtmlAnalyzer {
    with_text: bool,
}

impl HtmlAnalyzer {
    /// Analyzer that also extracts body text (full-text mode)
    pub fn full_text() -> Self {
        Self { with_text: true }
    }

    /// Analyzer that only records title, heading and links (sitemap mode)
    pub fn metadata_only() -> Self {
        Self { with_text: false }
    }
}

impl PageAnalyzer for HtmlAnalyzer {
    fn analyze(&self, raw: &str, page_url: &Url) -> Result<AnalyzedPage, AnalysisError> {
        if raw.trim().is_empty() {
            return Err(AnalysisError::EmptyDocument);
        }

        let document = Html::parse_document(raw);

        let title = extract_title(&document).unwrap_or_else(|| UNTITLED.to_string());
        let h1 = extract_first(&document, "h1");
        let body_text = self.with_text.then(|| extract_text(&document));
        let links = extract_links(&document, page_url);

        Ok(AnalyzedPage {
            title,
            h1,
            body_text,
            links,
        })
    }
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    extract_first(document, "title")
}

/// Whitespace-collapsed text of the first element matching `selector`
fn extract_first(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;

    document
        .select(&selector)
        .next()
        .map(|element| {
            element
                .text()
                .flat_map(str::split_whitespace)
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|s| !s.is_empty())
}

/// Extracts readable text from the main content container, falling back to
/// `<body>` and then the whole document
fn extract_text(document: &Html) -> String {
    let root = MAIN_CONTENT_SELECTORS
        .iter()
        .chain(std::iter::once(&"body"))
        .filter_map(|s| Selector::parse(s).ok())
        .find_map(|selector| document.select(&selector).next())
        .unwrap_or_else(|| document.root_element());

    let mut lines = Vec::new();
    collect_text(root, &mut lines);
    while lines.last().is_some_and(String::is_empty) {
        lines.pop();
    }
    lines.join("\n")
}

/// Elements that start a new paragraph in the extracted text
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "blockquote", "br", "dd", "details", "div", "dl", "dt", "figcaption",
    "figure", "form", "h1", "h2", "h3", "h4", "h5", "h6", "hr", "li", "ol", "p", "pre", "section",
    "summary", "table", "tr", "ul",
];

/// Text as trimmed lines, with one empty line between blocks
fn collect_text(element: ElementRef<'_>, lines: &mut Vec<String>) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            let segments: Vec<&str> = text.split('\n').map(str::trim).collect();
            let last = segments.len() - 1;
            for (i, segment) in segments.iter().enumerate() {
                if !segment.is_empty() {
                    lines.push(segment.to_string());
                } else if i != 0 && i != last {
                    // A blank source line
                    paragraph_break(lines);
                }
            }
        } else if let Some(child) = ElementRef::wrap(child) {
            let name = child.value().name();
            if EXCLUDED_TAGS.contains(&name) {
                continue;
            }
            let block = BLOCK_TAGS.contains(&name);
            if block {
                paragraph_break(lines);
            }
            collect_text(child, lines);
            if block {
                paragraph_break(lines);
            }
        }
    }
}

/// Ends the current paragraph; never at the start and never twice in a row
fn paragraph_break(lines: &mut Vec<String>) {
    if lines.last().is_some_and(|line| !line.is_empty()) {
        lines.push(String::new());
    }
}

/// Extracts all followable links from `<a href>` tags
fn extract_links(document: &Html, base_url: &Url) -> Vec<String> {
    let Ok(a_selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&a_selector)
        .filter(|element| element.value().attr("download").is_none())
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_link(href, base_url))
        .collect()
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - fragment-only links
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
    {
        return None;
    }

    let mut absolute_url = base_url.join(href).ok()?;
    if absolute_url.scheme() != "http" && absolute_url.scheme() != "https" {
        return None;
    }
    absolute_url.set_fragment(None);
    Some(absolute_url.to_string())
}
