//! Page fetchers
//!
//! This module handles retrieving raw HTML for the crawler, including:
//! - Building HTTP clients with proper user agent strings
//! - GET requests to fetch page content
//! - Content-Type screening (only HTML is analyzed)
//! - Error classification into per-page failure reasons

use crate::config::Config;
use crate::state::FailureReason;
use crate::HarvestError;
use reqwest::{redirect::Policy, Client, Response};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

#[cfg(feature = "browser")]
use crate::crawler::browser::BrowserFetcher;

/// Raw result of a successful fetch
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub final_url: String,

    /// HTTP status code
    pub status: u16,

    /// Page body content
    pub body: String,
}

/// Why a fetch did not produce HTML
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("HTTP {0}")]
    HttpStatus(u16),

    #[error("unsupported content type: {0}")]
    UnsupportedContent(String),

    #[error("renderer failed: {0}")]
    Renderer(String),
}

impl From<FetchError> for FailureReason {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Timeout => FailureReason::Timeout,
            FetchError::Connection(msg) => FailureReason::Connection(msg),
            FetchError::HttpStatus(code) => FailureReason::HttpStatus(code),
            FetchError::UnsupportedContent(ct) => FailureReason::UnsupportedContent(ct),
            FetchError::Renderer(msg) => FailureReason::Renderer(msg),
        }
    }
}

/// Retrieves the raw HTML behind a URL
pub trait Fetcher: Send + Sync + Clone {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<FetchedPage, FetchError>> + Send;
}

/// Builds an HTTP client with proper configuration
///
/// Redirects are followed (up to 10 hops); the final URL is reported back
/// in [`FetchedPage::final_url`].
///
/// # Example
///
/// ```no_run
/// use site_harvest::crawler::build_http_client;
/// use std::time::Duration;
///
/// let client = build_http_client("SiteHarvest/1.0", Duration::from_secs(30)).unwrap();
/// ```
pub fn build_http_client(user_agent: &str, timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Plain HTTP fetcher backed by `reqwest`
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(user_agent, timeout)?,
        })
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let response = self.client.get(url).send().await.map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        let content_type = content_type(&response);
        if !is_html(&content_type) {
            return Err(FetchError::UnsupportedContent(content_type));
        }

        let final_url = response.url().to_string();
        let body = response.text().await.map_err(classify)?;

        Ok(FetchedPage {
            final_url,
            status: status.as_u16(),
            body,
        })
    }
}

fn content_type(response: &Response) -> String {
    response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string()
}

/// A missing Content-Type is given the benefit of the doubt
fn is_html(content_type: &str) -> bool {
    let ct = content_type.to_ascii_lowercase();
    ct.is_empty() || ct.contains("text/html") || ct.contains("application/xhtml+xml")
}

fn classify(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else if e.is_connect() {
        FetchError::Connection(format!("connection refused or unreachable: {}", e))
    } else {
        FetchError::Connection(e.to_string())
    }
}

/// The fetcher selected for this run
///
/// Chosen once from the configuration; the dispatcher only ever sees the
/// [`Fetcher`] interface.
#[derive(Clone)]
pub enum AnyFetcher {
    Http(HttpFetcher),
    #[cfg(feature = "browser")]
    Browser(BrowserFetcher),
}

impl AnyFetcher {
    /// Builds the fetcher requested by `config.crawler.javascript`
    pub async fn from_config(config: &Config) -> Result<Self, HarvestError> {
        if config.crawler.javascript {
            #[cfg(feature = "browser")]
            {
                let fetcher = BrowserFetcher::launch(config.request_timeout()).await?;
                return Ok(Self::Browser(fetcher));
            }
            #[cfg(not(feature = "browser"))]
            {
                return Err(crate::ConfigError::Validation(
                    "JavaScript rendering requires the `browser` feature".to_string(),
                )
                .into());
            }
        }

        let fetcher = HttpFetcher::new(&config.crawler.user_agent, config.request_timeout())?;
        Ok(Self::Http(fetcher))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Http(_) => "http",
            #[cfg(feature = "browser")]
            Self::Browser(_) => "browser",
        }
    }
}

impl Fetcher for AnyFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        match self {
            Self::Http(fetcher) => fetcher.fetch(url).await,
            #[cfg(feature = "browser")]
            Self::Browser(fetcher) => fetcher.fetch(url).await,
        }
    }
}
