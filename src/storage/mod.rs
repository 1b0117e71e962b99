//! Storage module for persisting crawl progress
//!
//! This module handles checkpointing for the crawler, including:
//! - Snapshotting the frontier and completed pages
//! - Atomic checkpoint writes
//! - Validating and restoring checkpoints for resumption
//! - Deciding where a resumed run starts and saves

mod checkpoint;
mod file;
mod resume;

pub use checkpoint::{Checkpoint, CHECKPOINT_VERSION};
pub use file::{load, persist};
pub use resume::prepare_resume;

use thiserror::Error;

/// Errors that can occur while saving or restoring a checkpoint
#[derive(Debug, Error)]
pub enum CheckpointError {
    /// The checkpoint exists but cannot be trusted; nothing from it is applied
    #[error("Corrupt checkpoint: {0}")]
    Corrupt(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
