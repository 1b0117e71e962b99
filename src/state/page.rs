//! Records produced by the crawl: successful pages and failures

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result of successfully fetching and analyzing one URL
///
/// Never mutated after creation. `discovery_index` is the order in which
/// the URL first entered the frontier and drives output ordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// Canonical (normalized) URL
    pub url: String,

    /// Document title, `"Untitled"` when missing
    pub title: String,

    /// First `<h1>` text
    pub h1: Option<String>,

    /// Extracted body text; absent in sitemap mode
    pub body_text: Option<String>,

    /// HTTP status of the final response
    pub status: u16,

    /// Order in which the URL was first enqueued
    pub discovery_index: u64,
}

/// Why a URL ended up `Failed`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FailureReason {
    /// The request did not finish within the request timeout
    Timeout,

    /// Connection refused, DNS failure, TLS error, reset
    Connection(String),

    /// Non-2xx response
    HttpStatus(u16),

    /// Response was not HTML (documents, media, archives)
    UnsupportedContent(String),

    /// The rendering browser failed
    Renderer(String),

    /// The page analyzer could not make sense of the content
    Analysis(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "timeout"),
            Self::Connection(msg) => write!(f, "connection error: {}", msg),
            Self::HttpStatus(code) => write!(f, "HTTP {}", code),
            Self::UnsupportedContent(ct) => write!(f, "unsupported content type: {}", ct),
            Self::Renderer(msg) => write!(f, "renderer error: {}", msg),
            Self::Analysis(msg) => write!(f, "analysis error: {}", msg),
        }
    }
}

/// A URL that reached the `Failed` state, with its recorded reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedPage {
    pub url: String,
    pub discovery_index: u64,
    pub reason: FailureReason,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_reason_display() {
        assert_eq!(FailureReason::Timeout.to_string(), "timeout");
        assert_eq!(FailureReason::HttpStatus(404).to_string(), "HTTP 404");
        assert_eq!(
            FailureReason::UnsupportedContent("application/pdf".into()).to_string(),
            "unsupported content type: application/pdf"
        );
    }

    #[test]
    fn test_failure_reason_json_shape() {
        let json = serde_json::to_string(&FailureReason::HttpStatus(503)).unwrap();
        assert_eq!(json, r#"{"kind":"http_status","detail":503}"#);

        let json = serde_json::to_string(&FailureReason::Timeout).unwrap();
        assert_eq!(json, r#"{"kind":"timeout"}"#);
    }
}
