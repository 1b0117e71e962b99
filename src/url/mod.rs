//! URL handling module for Site-Harvest
//!
//! This module provides URL normalization, base-path resolution, exclusion
//! matching, and the scope filter that decides which links get crawled.

mod base_path;
mod matcher;
mod normalize;
mod scope;

// Re-export main functions
pub use base_path::{normalize_base_path, resolve_base_path};
pub use matcher::{has_excluded_extension, matches_excluded_prefix};
pub use normalize::normalize_url;
pub use scope::{ScopeFilter, SiteScope};
