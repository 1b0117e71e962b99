use crate::config::types::Config;
use crate::config::validation::validate;
use crate::url::{normalize_url, resolve_base_path};
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Reads and parses a TOML configuration file without validating it
///
/// Used by the CLI, which layers command-line overrides on top of the file
/// before validating the merged result.
pub fn read_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    Ok(config)
}

/// Loads, parses and validates a configuration file
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use site_harvest::config::load_config;
///
/// let config = load_config(Path::new("crawl.toml")).unwrap();
/// println!("Workers: {}", config.crawler.workers);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let config = read_config(path)?;
    validate(&config)?;
    Ok(config)
}

/// Reads a URL-list file: one URL per line, blank lines and `#` comments skipped
pub fn read_url_list(path: &Path) -> Result<Vec<String>, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

/// Computes the SHA-256 fingerprint of the scope-defining configuration
///
/// Two runs with the same fingerprint crawl the same URL space, so a
/// checkpoint written by one can be resumed by the other. Worker count,
/// delay, page cap and output settings are deliberately left out.
pub fn compute_fingerprint(config: &Config) -> Result<String, ConfigError> {
    let mut seeds = config
        .seeds
        .iter()
        .map(|seed| {
            let url = normalize_url(seed)
                .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed '{}': {}", seed, e)))?;
            let base = resolve_base_path(&url, config.scope.base_path.as_deref());
            Ok(format!("{}|{}", url, base))
        })
        .collect::<Result<Vec<_>, ConfigError>>()?;
    seeds.sort();

    let mut hasher = Sha256::new();
    for seed in &seeds {
        hasher.update(b"seed:");
        hasher.update(seed.as_bytes());
        hasher.update(b"\n");
    }
    hasher.update(format!("mode:{}\n", config.crawler.mode.as_str()).as_bytes());
    hasher.update(format!("exact:{}\n", config.crawler.exact_urls).as_bytes());
    for prefix in &config.scope.excluded_prefixes {
        hasher.update(format!("prefix:{}\n", prefix).as_bytes());
    }
    for ext in &config.scope.excluded_extensions {
        hasher.update(format!("ext:{}\n", ext.to_lowercase()).as_bytes());
    }
    Ok(hex::encode(hasher.finalize()))
}
