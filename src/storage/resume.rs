//! Choosing the starting point of a run that was asked to resume

use crate::config::Config;
use crate::storage::{load, Checkpoint, CheckpointError};
use std::fs;
use std::path::Path;

/// Loads the checkpoint named by `config.checkpoint.resume_from`
///
/// A checkpoint that loads is returned, and later checkpoints go back to
/// the same file unless `save_progress` names another one. A checkpoint
/// that cannot be used is reported and left alone: the run starts fresh
/// and checkpointing to that file is switched off, so the interrupted
/// crawl can still be resumed with the right configuration.
pub fn prepare_resume(config: &mut Config, fingerprint: &str) -> Option<Checkpoint> {
    let path = config.checkpoint.resume_from.clone()?;

    let error = match load(&path, fingerprint) {
        Ok(checkpoint) => {
            tracing::info!(
                "Loaded checkpoint {} from {}",
                path.display(),
                checkpoint.created_at.to_rfc3339()
            );
            if config.checkpoint.save_progress.is_none() {
                config.checkpoint.save_progress = Some(path);
            }
            return Some(checkpoint);
        }
        Err(e) => e,
    };

    match &error {
        CheckpointError::Corrupt(reason) => tracing::error!(
            "Checkpoint {} is unusable ({}); starting a fresh crawl",
            path.display(),
            reason
        ),
        other => tracing::error!(
            "Could not read checkpoint {} ({}); starting a fresh crawl",
            path.display(),
            other
        ),
    }

    let overwrites = config
        .checkpoint
        .save_progress
        .as_deref()
        .is_some_and(|save| same_file(save, &path));
    if overwrites {
        tracing::warn!(
            "Not saving progress to {}; it is kept as it was. Pass --save-progress with another file to checkpoint this run",
            path.display()
        );
        config.checkpoint.save_progress = None;
    }
    None
}

fn same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
