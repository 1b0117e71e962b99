use crate::config::types::{CheckpointConfig, Config, CrawlerConfig, OutputConfig, ScopeConfig, MAX_WORKERS};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
///
/// Runs before any network activity; every failure here is fatal.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_seeds(&config.seeds)?;
    validate_crawler_config(&config.crawler)?;
    validate_scope_config(&config.scope)?;
    validate_output_config(&config.output)?;
    validate_checkpoint_config(&config.checkpoint)?;
    Ok(())
}

/// Validates seed URLs
fn validate_seeds(seeds: &[String]) -> Result<(), ConfigError> {
    if seeds.is_empty() {
        return Err(ConfigError::Validation(
            "at least one seed URL is required".to_string(),
        ));
    }

    for seed in seeds {
        let url = Url::parse(seed)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e)))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::InvalidUrl(format!(
                "Seed URL '{}' must use http or https",
                seed
            )));
        }

        if url.host_str().is_none() {
            return Err(ConfigError::InvalidUrl(format!(
                "Seed URL '{}' has no host",
                seed
            )));
        }
    }

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.workers < 1 || config.workers > MAX_WORKERS {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and {}, got {}",
            MAX_WORKERS, config.workers
        )));
    }

    if !config.no_limit && config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max_pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    if config.sitemap_max_pages == Some(0) {
        return Err(ConfigError::Validation(
            "sitemap_max_pages must be >= 1".to_string(),
        ));
    }

    if !config.delay_secs.is_finite() || config.delay_secs < 0.0 {
        return Err(ConfigError::Validation(format!(
            "delay must be a non-negative number of seconds, got {}",
            config.delay_secs
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request_timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.javascript && !cfg!(feature = "browser") {
        return Err(ConfigError::Validation(
            "JavaScript rendering requires building with the `browser` feature".to_string(),
        ));
    }

    Ok(())
}

/// Validates scope configuration
fn validate_scope_config(config: &ScopeConfig) -> Result<(), ConfigError> {
    if let Some(base_path) = &config.base_path {
        if base_path.trim().is_empty() {
            return Err(ConfigError::Validation(
                "base_path cannot be empty".to_string(),
            ));
        }
    }

    for prefix in &config.excluded_prefixes {
        if !prefix.starts_with('/') {
            return Err(ConfigError::Validation(format!(
                "excluded prefix '{}' must start with '/'",
                prefix
            )));
        }
    }

    for ext in &config.excluded_extensions {
        if !ext.starts_with('.') || ext.len() < 2 {
            return Err(ConfigError::Validation(format!(
                "excluded extension '{}' must look like '.ext'",
                ext
            )));
        }
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.pages_per_file < 1 {
        return Err(ConfigError::Validation(format!(
            "pages_per_file must be >= 1, got {}",
            config.pages_per_file
        )));
    }

    if config.output_dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "output_dir cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates checkpoint configuration
fn validate_checkpoint_config(config: &CheckpointConfig) -> Result<(), ConfigError> {
    if config.every < 1 {
        return Err(ConfigError::Validation(format!(
            "checkpoint interval must be >= 1, got {}",
            config.every
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        Config {
            seeds: vec!["https://example.com/docs/".to_string()],
            ..Config::default()
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(validate(&valid_config()).is_ok());
    }

    #[test]
    fn test_missing_seeds() {
        let mut config = valid_config();
        config.seeds.clear();
        assert!(matches!(validate(&config), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_invalid_seeds() {
        for seed in ["not a url", "ftp://example.com/", "/relative/path"] {
            let mut config = valid_config();
            config.seeds = vec![seed.to_string()];
            assert!(
                matches!(validate(&config), Err(ConfigError::InvalidUrl(_))),
                "seed {} should be rejected",
                seed
            );
        }
    }

    #[test]
    fn test_worker_bounds() {
        let mut config = valid_config();
        config.crawler.workers = 0;
        assert!(validate(&config).is_err());

        config.crawler.workers = 21;
        assert!(validate(&config).is_err());

        config.crawler.workers = 20;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_zero_max_pages_allowed_only_with_no_limit() {
        let mut config = valid_config();
        config.crawler.max_pages = 0;
        assert!(validate(&config).is_err());

        config.crawler.no_limit = true;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_delay_must_be_non_negative() {
        let mut config = valid_config();
        config.crawler.delay_secs = -0.5;
        assert!(validate(&config).is_err());

        config.crawler.delay_secs = f64::NAN;
        assert!(validate(&config).is_err());

        config.crawler.delay_secs = 0.0;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_pages_per_file_and_interval() {
        let mut config = valid_config();
        config.output.pages_per_file = 0;
        assert!(validate(&config).is_err());

        let mut config = valid_config();
        config.checkpoint.every = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_exclusion_shapes() {
        let mut config = valid_config();
        config.scope.excluded_prefixes.push("private/".to_string());
        assert!(validate(&config).is_err());

        let mut config = valid_config();
        config.scope.excluded_extensions.push("tar".to_string());
        assert!(validate(&config).is_err());
    }

    #[cfg(not(feature = "browser"))]
    #[test]
    fn test_javascript_requires_browser_feature() {
        let mut config = valid_config();
        config.crawler.javascript = true;
        assert!(matches!(validate(&config), Err(ConfigError::Validation(_))));
    }
}
