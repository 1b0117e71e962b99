//! Checkpoint snapshots of a running crawl
//!
//! A checkpoint is a point-in-time copy of the frontier plus the pages
//! collected so far. It is validated as a whole before anything is restored
//! from it, so a damaged file never half-applies.

use crate::state::{Frontier, FrontierSnapshot, Page};
use crate::storage::CheckpointError;
use crate::url::normalize_url;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Current checkpoint format version
pub const CHECKPOINT_VERSION: u32 = 1;

/// Serializable crawl snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Format version, see [`CHECKPOINT_VERSION`]
    pub version: u32,

    /// Fingerprint of the scope-defining configuration
    pub fingerprint: String,

    /// When the snapshot was taken
    pub created_at: DateTime<Utc>,

    /// Frontier contents and counters
    #[serde(flatten)]
    pub frontier: FrontierSnapshot,

    /// Completed page records, one per visited URL
    pub pages: Vec<Page>,
}

impl Checkpoint {
    /// Captures the frontier together with the pages completed so far
    ///
    /// Callers must hold whatever guards `pages` while snapshotting, so that
    /// every visited URL in the frontier has its page in `pages`.
    pub fn snapshot(frontier: &Frontier, fingerprint: &str, pages: &[Page]) -> Self {
        let frontier = frontier.snapshot();
        let mut pages = pages.to_vec();
        pages.sort_by_key(|p| p.discovery_index);

        Self {
            version: CHECKPOINT_VERSION,
            fingerprint: fingerprint.to_string(),
            created_at: Utc::now(),
            frontier,
            pages,
        }
    }

    /// Checks that the checkpoint is internally consistent and belongs to a
    /// crawl with `expected_fingerprint`
    pub fn validate(&self, expected_fingerprint: &str) -> Result<(), CheckpointError> {
        if self.version != CHECKPOINT_VERSION {
            return Err(corrupt(format!(
                "unsupported version {} (expected {})",
                self.version, CHECKPOINT_VERSION
            )));
        }
        if self.fingerprint != expected_fingerprint {
            return Err(corrupt(
                "fingerprint does not match the current configuration".to_string(),
            ));
        }

        let snap = &self.frontier;
        let mut urls = HashSet::new();
        let mut indices = HashSet::new();

        let records = snap
            .visited
            .iter()
            .map(|r| (r.url.as_str(), r.discovery_index))
            .chain(
                snap.failed
                    .iter()
                    .map(|f| (f.url.as_str(), f.discovery_index)),
            )
            .chain(
                snap.pending
                    .iter()
                    .map(|r| (r.url.as_str(), r.discovery_index)),
            );

        for (url, index) in records {
            if !is_canonical(url) {
                return Err(corrupt(format!("URL is not in normalized form: {}", url)));
            }
            if !urls.insert(url) {
                return Err(corrupt(format!("URL recorded more than once: {}", url)));
            }
            if !indices.insert(index) {
                return Err(corrupt(format!("discovery index {} used twice", index)));
            }
            if index >= snap.next_index {
                return Err(corrupt(format!(
                    "discovery index {} is not below next index {}",
                    index, snap.next_index
                )));
            }
        }

        let counters = snap.counters;
        if counters.discovered != urls.len() as u64
            || counters.completed != snap.visited.len() as u64
            || counters.failed != snap.failed.len() as u64
        {
            return Err(corrupt(format!(
                "counters (discovered {}, completed {}, failed {}) disagree with recorded sets ({}, {}, {})",
                counters.discovered,
                counters.completed,
                counters.failed,
                urls.len(),
                snap.visited.len(),
                snap.failed.len()
            )));
        }

        let visited: HashMap<&str, u64> = snap
            .visited
            .iter()
            .map(|r| (r.url.as_str(), r.discovery_index))
            .collect();
        let mut paged = HashSet::new();
        for page in &self.pages {
            match visited.get(page.url.as_str()) {
                Some(&index) if index == page.discovery_index => {}
                Some(_) => {
                    return Err(corrupt(format!(
                        "page {} has a different discovery index than its visited record",
                        page.url
                    )))
                }
                None => return Err(corrupt(format!("page {} was never visited", page.url))),
            }
            if !paged.insert(page.url.as_str()) {
                return Err(corrupt(format!("page {} recorded more than once", page.url)));
            }
        }
        if paged.len() != visited.len() {
            return Err(corrupt(format!(
                "{} visited URLs but {} page records",
                visited.len(),
                paged.len()
            )));
        }

        Ok(())
    }

    /// Rebuilds a frontier ready to continue the crawl
    ///
    /// Pending URLs keep their queue order; visited and failed URLs are
    /// pre-marked and will not be fetched again.
    pub fn rehydrate(&self) -> Frontier {
        Frontier::from_snapshot(&self.frontier)
    }
}

/// Frontier keys are stored exactly as `normalize_url` produced them
fn is_canonical(url: &str) -> bool {
    normalize_url(url).is_ok_and(|normalized| normalized.as_str() == url)
}

fn corrupt(reason: String) -> CheckpointError {
    CheckpointError::Corrupt(reason)
}
