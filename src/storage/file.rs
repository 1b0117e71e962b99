//! Checkpoint files on disk
//!
//! Writes go to a sibling `.tmp` file that is synced and then renamed over
//! the destination, so readers only ever see a complete checkpoint.

use crate::storage::{Checkpoint, CheckpointError};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

fn temp_path(dest: &Path) -> PathBuf {
    let mut name: OsString = dest.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Atomically writes `checkpoint` to `dest`
pub fn persist(checkpoint: &Checkpoint, dest: &Path) -> Result<(), CheckpointError> {
    if let Some(parent) = dest.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let json = serde_json::to_vec_pretty(checkpoint)?;
    let tmp = temp_path(dest);
    {
        let mut file = File::create(&tmp)?;
        file.write_all(&json)?;
        file.sync_all()?;
    }
    fs::rename(&tmp, dest)?;

    tracing::debug!(
        "Checkpoint written to {} ({} visited, {} pending)",
        dest.display(),
        checkpoint.frontier.visited.len(),
        checkpoint.frontier.pending.len()
    );
    Ok(())
}

/// Reads and validates a checkpoint
///
/// Anything other than an I/O failure (unparseable JSON, wrong version,
/// fingerprint mismatch, inconsistent contents) is reported as
/// [`CheckpointError::Corrupt`].
pub fn load(path: &Path, expected_fingerprint: &str) -> Result<Checkpoint, CheckpointError> {
    let content = fs::read(path)?;
    let checkpoint: Checkpoint = serde_json::from_slice(&content)
        .map_err(|e| CheckpointError::Corrupt(format!("invalid JSON: {}", e)))?;
    checkpoint.validate(expected_fingerprint)?;
    Ok(checkpoint)
}
