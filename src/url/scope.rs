//! Scope filter deciding which discovered URLs may enter the frontier

use crate::config::Config;
use crate::url::matcher::{has_excluded_extension, matches_excluded_prefix};
use crate::url::{normalize_url, resolve_base_path};
use crate::UrlError;
use std::collections::HashSet;
use std::fmt;
use url::Url;

/// One crawlable area: a host (plus explicit port) and a base path under it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteScope {
    pub host: String,
    pub port: Option<u16>,
    pub base_path: String,
}

impl SiteScope {
    /// Builds the scope rooted at `seed`
    pub fn for_seed(seed: &Url, explicit_base: Option<&str>) -> Result<Self, UrlError> {
        let host = seed.host_str().ok_or(UrlError::MissingHost)?.to_string();
        Ok(Self {
            host,
            port: seed.port(),
            base_path: resolve_base_path(seed, explicit_base),
        })
    }

    fn contains(&self, url: &Url) -> bool {
        url.host_str() == Some(self.host.as_str())
            && url.port() == self.port
            && url.path().starts_with(&self.base_path)
    }
}

impl fmt::Display for SiteScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.port {
            Some(port) => write!(f, "{}:{}{}*", self.host, port, self.base_path),
            None => write!(f, "{}{}*", self.host, self.base_path),
        }
    }
}

/// Pure predicate over candidate URLs
///
/// The answer depends only on configuration, never on crawl progress, so a
/// link found on the first page and the same link found on the ten
/// thousandth page are judged identically.
#[derive(Debug, Clone)]
pub struct ScopeFilter {
    scopes: Vec<SiteScope>,
    excluded_prefixes: Vec<String>,
    excluded_extensions: Vec<String>,
    /// Normalized seed list; `Some` only in exact-URL mode
    exact: Option<HashSet<String>>,
}

impl ScopeFilter {
    /// Builds the filter for a validated configuration
    pub fn from_config(config: &Config) -> Result<Self, UrlError> {
        let seeds = config
            .seeds
            .iter()
            .map(|s| normalize_url(s))
            .collect::<Result<Vec<_>, _>>()?;

        let mut scopes: Vec<SiteScope> = Vec::new();
        for seed in &seeds {
            let scope = SiteScope::for_seed(seed, config.scope.base_path.as_deref())?;
            if !scopes.contains(&scope) {
                scopes.push(scope);
            }
        }

        let exact = config
            .crawler
            .exact_urls
            .then(|| seeds.iter().map(|s| s.to_string()).collect());

        Ok(Self {
            scopes,
            excluded_prefixes: config.scope.excluded_prefixes.clone(),
            excluded_extensions: config.scope.excluded_extensions.clone(),
            exact,
        })
    }

    /// Returns true if `candidate` may be crawled
    ///
    /// # Rules, in order
    ///
    /// 1. Must parse as an absolute http/https URL
    /// 2. Host (and explicit port) must equal a seed's exactly
    /// 3. Path must start with that seed's base path
    /// 4. Path must not start with an excluded prefix or end with an
    ///    excluded extension
    /// 5. In exact-URL mode, must be one of the seeds
    pub fn accepts(&self, candidate: &str) -> bool {
        let url = match normalize_url(candidate) {
            Ok(url) => url,
            Err(_) => return false,
        };

        if !self.scopes.iter().any(|scope| scope.contains(&url)) {
            return false;
        }

        let path = url.path();
        if matches_excluded_prefix(path, &self.excluded_prefixes)
            || has_excluded_extension(path, &self.excluded_extensions)
        {
            return false;
        }

        match &self.exact {
            Some(seeds) => seeds.contains(url.as_str()),
            None => true,
        }
    }

    /// The crawlable areas, one per distinct seed scope
    pub fn scopes(&self) -> &[SiteScope] {
        &self.scopes
    }

    /// Whether link expansion is disabled
    pub fn is_exact(&self) -> bool {
        self.exact.is_some()
    }
}
