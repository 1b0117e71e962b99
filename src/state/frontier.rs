//! The crawl frontier: the single record of every URL seen during a run
//!
//! The frontier owns the FIFO queue of pending URLs, the state of every
//! normalized URL, and the run counters. All mutation goes through
//! [`Frontier::enqueue_if_new`], [`Frontier::take_next_batch`] and
//! [`Frontier::mark_state`], each atomic with respect to the others. The
//! lock is never held across an await point; fetching and analysis happen
//! outside it.

use crate::state::{EntryState, FailedPage, FailureReason};
use crate::url::normalize_url;
use crate::HarvestError;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::futures::Notified;
use tokio::sync::Notify;

/// Monotonic crawl counters
///
/// `discovered = completed + failed + pending + in_flight` at all times.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    /// URLs ever added to the frontier
    pub discovered: u64,

    /// URLs that reached `Visited`
    pub completed: u64,

    /// URLs that reached `Failed`
    pub failed: u64,
}

/// A URL handed to a worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierTask {
    pub url: String,
    pub discovery_index: u64,
}

/// How a fetch attempt ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Visited,
    Failed(FailureReason),
}

impl Outcome {
    fn state(&self) -> EntryState {
        match self {
            Self::Visited => EntryState::Visited,
            Self::Failed(_) => EntryState::Failed,
        }
    }
}

/// A URL and the index it was discovered at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlRecord {
    pub url: String,
    pub discovery_index: u64,
}

/// Point-in-time copy of frontier state
///
/// In-flight entries are recorded as pending, ahead of the queue, since
/// their fetch has not finished.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrontierSnapshot {
    pub counters: Counters,
    pub next_index: u64,
    pub visited: Vec<UrlRecord>,
    pub failed: Vec<FailedPage>,
    pub pending: Vec<UrlRecord>,
}

#[derive(Debug)]
struct Entry {
    discovery_index: u64,
    state: EntryState,
    failure: Option<FailureReason>,
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<String, Entry>,
    queue: VecDeque<String>,
    in_flight: u64,
    counters: Counters,
    next_index: u64,
}

impl Inner {
    fn check_invariant(&self) {
        debug_assert_eq!(
            self.counters.discovered,
            self.counters.completed
                + self.counters.failed
                + self.queue.len() as u64
                + self.in_flight,
            "frontier counters out of balance"
        );
    }

    fn remaining_capacity(&self, max_pages: Option<usize>) -> u64 {
        match max_pages {
            Some(max) => (max as u64).saturating_sub(self.counters.completed + self.in_flight),
            None => u64::MAX,
        }
    }
}

/// Mutable crawl state shared by all workers
#[derive(Debug, Default)]
pub struct Frontier {
    inner: Mutex<Inner>,
    changed: Notify,
}

impl Frontier {
    /// Creates an empty frontier
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a frontier from a snapshot
    ///
    /// The snapshot must already be validated; see
    /// [`crate::storage::Checkpoint::validate`].
    pub fn from_snapshot(snapshot: &FrontierSnapshot) -> Self {
        let mut inner = Inner {
            next_index: snapshot.next_index,
            ..Inner::default()
        };

        for record in &snapshot.visited {
            inner.entries.insert(
                record.url.clone(),
                Entry {
                    discovery_index: record.discovery_index,
                    state: EntryState::Visited,
                    failure: None,
                },
            );
        }
        for failed in &snapshot.failed {
            inner.entries.insert(
                failed.url.clone(),
                Entry {
                    discovery_index: failed.discovery_index,
                    state: EntryState::Failed,
                    failure: Some(failed.reason.clone()),
                },
            );
        }
        for record in &snapshot.pending {
            inner.entries.insert(
                record.url.clone(),
                Entry {
                    discovery_index: record.discovery_index,
                    state: EntryState::Pending,
                    failure: None,
                },
            );
            inner.queue.push_back(record.url.clone());
        }

        inner.counters = Counters {
            discovered: inner.entries.len() as u64,
            completed: snapshot.visited.len() as u64,
            failed: snapshot.failed.len() as u64,
        };
        inner.check_invariant();

        Self {
            inner: Mutex::new(inner),
            changed: Notify::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds `url` as `Pending` unless it is already known, in any state
    ///
    /// Returns true if the URL was newly added. URLs that fail to normalize
    /// are never added.
    pub fn enqueue_if_new(&self, url: &str) -> bool {
        let normalized = match normalize_url(url) {
            Ok(u) => u.to_string(),
            Err(e) => {
                tracing::debug!("Not enqueueing {}: {}", url, e);
                return false;
            }
        };

        let added = {
            let mut inner = self.lock();
            if inner.entries.contains_key(&normalized) {
                false
            } else {
                let discovery_index = inner.next_index;
                inner.next_index += 1;
                inner.entries.insert(
                    normalized.clone(),
                    Entry {
                        discovery_index,
                        state: EntryState::Pending,
                        failure: None,
                    },
                );
                inner.queue.push_back(normalized);
                inner.counters.discovered += 1;
                inner.check_invariant();
                true
            }
        };

        if added {
            self.changed.notify_waiters();
        }
        added
    }

    /// Removes up to `n` pending URLs from the front of the queue and marks
    /// them `InFlight`
    ///
    /// Never hands out more than the page cap leaves room for, and never
    /// hands out the same URL twice.
    pub fn take_next_batch(&self, n: usize, max_pages: Option<usize>) -> Vec<FrontierTask> {
        let mut inner = self.lock();
        let room = inner.remaining_capacity(max_pages).min(n as u64) as usize;

        let mut batch = Vec::with_capacity(room.min(inner.queue.len()));
        while batch.len() < room {
            let Some(url) = inner.queue.pop_front() else {
                break;
            };
            let Some(entry) = inner.entries.get_mut(&url) else {
                continue;
            };
            entry.state = EntryState::InFlight;
            let discovery_index = entry.discovery_index;
            inner.in_flight += 1;
            batch.push(FrontierTask {
                url,
                discovery_index,
            });
        }
        inner.check_invariant();
        batch
    }

    /// Moves an `InFlight` URL to its terminal state and updates counters
    ///
    /// Any other source state is a logic error and is returned as
    /// [`HarvestError::InvalidTransition`].
    pub fn mark_state(&self, url: &str, outcome: Outcome) -> Result<Counters, HarvestError> {
        let counters = {
            let mut inner = self.lock();
            let to = outcome.state();
            let entry = inner
                .entries
                .get_mut(url)
                .ok_or_else(|| HarvestError::UnknownEntry(url.to_string()))?;

            if entry.state != EntryState::InFlight {
                return Err(HarvestError::InvalidTransition {
                    url: url.to_string(),
                    from: entry.state,
                    to,
                });
            }

            entry.state = to;
            if let Outcome::Failed(reason) = outcome {
                entry.failure = Some(reason);
            }

            inner.in_flight -= 1;
            match to {
                EntryState::Visited => inner.counters.completed += 1,
                _ => inner.counters.failed += 1,
            }
            inner.check_invariant();
            inner.counters
        };

        self.changed.notify_waiters();
        Ok(counters)
    }

    /// Puts tasks that were taken but never started back at the front of
    /// the queue, keeping their relative order
    pub fn release(&self, tasks: &[FrontierTask]) -> Result<(), HarvestError> {
        {
            let mut inner = self.lock();
            for task in tasks.iter().rev() {
                let entry = inner
                    .entries
                    .get_mut(&task.url)
                    .ok_or_else(|| HarvestError::UnknownEntry(task.url.clone()))?;
                if entry.state != EntryState::InFlight {
                    return Err(HarvestError::InvalidTransition {
                        url: task.url.clone(),
                        from: entry.state,
                        to: EntryState::Pending,
                    });
                }
                entry.state = EntryState::Pending;
                inner.in_flight -= 1;
                inner.queue.push_front(task.url.clone());
            }
            inner.check_invariant();
        }

        self.changed.notify_waiters();
        Ok(())
    }

    /// True while `completed + in_flight < max_pages`, always true if unlimited
    pub fn has_capacity(&self, max_pages: Option<usize>) -> bool {
        self.lock().remaining_capacity(max_pages) > 0
    }

    /// Current counters
    pub fn counters(&self) -> Counters {
        self.lock().counters
    }

    /// Number of URLs waiting in the queue
    pub fn pending_len(&self) -> usize {
        self.lock().queue.len()
    }

    /// Number of URLs currently handed out to workers
    pub fn in_flight(&self) -> u64 {
        self.lock().in_flight
    }

    /// True when nothing is pending and nothing is in flight
    pub fn is_exhausted(&self) -> bool {
        let inner = self.lock();
        inner.queue.is_empty() && inner.in_flight == 0
    }

    /// State of a URL, after normalization
    pub fn state_of(&self, url: &str) -> Option<EntryState> {
        let key = normalize_url(url).ok()?.to_string();
        self.lock().entries.get(&key).map(|e| e.state)
    }

    /// Discovery index of a URL, after normalization
    pub fn discovery_index(&self, url: &str) -> Option<u64> {
        let key = normalize_url(url).ok()?.to_string();
        self.lock().entries.get(&key).map(|e| e.discovery_index)
    }

    /// All failed URLs with their reasons, in discovery order
    pub fn failures(&self) -> Vec<FailedPage> {
        let inner = self.lock();
        let mut failed: Vec<FailedPage> = inner
            .entries
            .iter()
            .filter_map(|(url, e)| {
                e.failure.as_ref().map(|reason| FailedPage {
                    url: url.clone(),
                    discovery_index: e.discovery_index,
                    reason: reason.clone(),
                })
            })
            .collect();
        failed.sort_by_key(|f| f.discovery_index);
        failed
    }

    /// Takes a coherent copy of the whole frontier under its lock
    pub fn snapshot(&self) -> FrontierSnapshot {
        let inner = self.lock();

        let mut visited = Vec::new();
        let mut failed = Vec::new();
        let mut in_flight = Vec::new();
        for (url, entry) in &inner.entries {
            let record = UrlRecord {
                url: url.clone(),
                discovery_index: entry.discovery_index,
            };
            match entry.state {
                EntryState::Visited => visited.push(record),
                EntryState::Failed => failed.push(FailedPage {
                    url: url.clone(),
                    discovery_index: entry.discovery_index,
                    reason: entry
                        .failure
                        .clone()
                        .unwrap_or(FailureReason::Analysis("unrecorded failure".to_string())),
                }),
                EntryState::InFlight => in_flight.push(record),
                EntryState::Pending => {}
            }
        }
        visited.sort_by_key(|r| r.discovery_index);
        failed.sort_by_key(|f| f.discovery_index);
        in_flight.sort_by_key(|r| r.discovery_index);

        let queued = inner.queue.iter().filter_map(|url| {
            inner.entries.get(url).map(|e| UrlRecord {
                url: url.clone(),
                discovery_index: e.discovery_index,
            })
        });
        let pending = in_flight.into_iter().chain(queued).collect();

        FrontierSnapshot {
            counters: inner.counters,
            next_index: inner.next_index,
            visited,
            failed,
            pending,
        }
    }

    /// Future that resolves the next time the frontier changes
    ///
    /// Create it before inspecting the frontier so a change that happens in
    /// between is not missed.
    pub fn changed(&self) -> Notified<'_> {
        self.changed.notified()
    }

    /// Wakes every worker waiting on [`Frontier::changed`]
    pub fn wake_all(&self) {
        self.changed.notify_waiters();
    }
}
