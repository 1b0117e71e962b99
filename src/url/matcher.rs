/// Checks if a path starts with any of the excluded prefixes
///
/// Prefixes are matched against the start of the path, so `/api/` excludes
/// `/api/v1/users` but not `/docs/api/v1/users`.
///
/// # Examples
///
/// ```
/// use site_harvest::url::matches_excluded_prefix;
///
/// let prefixes = vec!["/admin/".to_string()];
/// assert!(matches_excluded_prefix("/admin/users", &prefixes));
/// assert!(!matches_excluded_prefix("/docs/admin/", &prefixes));
/// ```
pub fn matches_excluded_prefix(path: &str, prefixes: &[String]) -> bool {
    prefixes.iter().any(|prefix| path.starts_with(prefix.as_str()))
}

/// Checks if a path ends with any of the excluded file extensions
///
/// The comparison ignores ASCII case, so `.PDF` is excluded by `.pdf`.
pub fn has_excluded_extension(path: &str, extensions: &[String]) -> bool {
    let lower = path.to_ascii_lowercase();
    extensions
        .iter()
        .any(|ext| lower.ends_with(&ext.to_ascii_lowercase()))
}
