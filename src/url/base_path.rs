use url::Url;

/// Resolves the base path that scopes a crawl started from `seed`
///
/// An explicit base path is normalized to start and end with `/`.
/// Otherwise the seed's directory is used: a seed ending in `/` is its own
/// base, anything else drops its last segment.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use site_harvest::url::resolve_base_path;
///
/// let seed = Url::parse("https://example.com/run/docs/fit-for-run").unwrap();
/// assert_eq!(resolve_base_path(&seed, None), "/run/docs/");
/// assert_eq!(resolve_base_path(&seed, Some("run")), "/run/");
/// ```
pub fn resolve_base_path(seed: &Url, explicit: Option<&str>) -> String {
    match explicit {
        Some(path) => normalize_base_path(path),
        None => directory_of(seed.path()),
    }
}

/// Adds the leading and trailing `/` a base path needs
pub fn normalize_base_path(path: &str) -> String {
    let trimmed = path.trim();
    let mut normalized = String::with_capacity(trimmed.len() + 2);
    if !trimmed.starts_with('/') {
        normalized.push('/');
    }
    normalized.push_str(trimmed);
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    normalized
}

fn directory_of(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }
    if path.ends_with('/') {
        return path.to_string();
    }
    match path.rfind('/') {
        Some(idx) => path[..=idx].to_string(),
        None => "/".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed(path: &str) -> Url {
        Url::parse(&format!("https://example.com{}", path)).unwrap()
    }

    #[test]
    fn test_directory_seed_is_its_own_base() {
        assert_eq!(resolve_base_path(&seed("/docs/"), None), "/docs/");
    }

    #[test]
    fn test_file_seed_uses_parent_directory() {
        assert_eq!(resolve_base_path(&seed("/run/docs/fit-for-run"), None), "/run/docs/");
        assert_eq!(resolve_base_path(&seed("/index.html"), None), "/");
    }

    #[test]
    fn test_root_seed() {
        assert_eq!(resolve_base_path(&seed(""), None), "/");
        assert_eq!(resolve_base_path(&seed("/"), None), "/");
    }

    #[test]
    fn test_explicit_base_path_is_normalized() {
        let s = seed("/docs/api/intro");
        assert_eq!(resolve_base_path(&s, Some("/docs/")), "/docs/");
        assert_eq!(resolve_base_path(&s, Some("docs")), "/docs/");
        assert_eq!(resolve_base_path(&s, Some("/docs")), "/docs/");
        assert_eq!(resolve_base_path(&s, Some("docs/")), "/docs/");
        assert_eq!(resolve_base_path(&s, Some("/")), "/");
    }
}
