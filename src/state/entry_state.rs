//! Entry state definitions for tracking crawl progress
//!
//! Every normalized URL known to the frontier is in exactly one of these
//! states. `Visited` and `Failed` are terminal: an entry never leaves them.

use std::fmt;

/// Represents the current state of a URL in the crawl process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryState {
    /// Discovered and waiting in the queue
    Pending,

    /// Handed to a worker, fetch not finished yet
    InFlight,

    /// Fetched and analyzed successfully
    Visited,

    /// Fetch or analysis failed; never retried within a run
    Failed,
}

impl EntryState {
    /// Returns the name used in logs and error messages
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InFlight => "in_flight",
            Self::Visited => "visited",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for EntryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names() {
        assert_eq!(EntryState::Pending.to_string(), "pending");
        assert_eq!(EntryState::InFlight.to_string(), "in_flight");
        assert_eq!(EntryState::Visited.to_string(), "visited");
        assert_eq!(EntryState::Failed.to_string(), "failed");
    }
}
