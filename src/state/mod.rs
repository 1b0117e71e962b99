//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `EntryState`: Tracks the state of an individual URL (pending, in flight, visited, failed)
//! - `Frontier`: The shared queue and state map every worker draws from
//! - `Page` / `FailedPage`: The records a crawl produces

mod entry_state;
mod frontier;
mod page;

// Re-export main types
pub use entry_state::EntryState;
pub use frontier::{Counters, Frontier, FrontierSnapshot, FrontierTask, Outcome, UrlRecord};
pub use page::{FailedPage, FailureReason, Page};
