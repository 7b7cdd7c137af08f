//! Modification-time staleness checks for incremental builds.
//!
//! Document conversion and PDF rendering are the expensive steps of a build,
//! so both are gated on a single question: is the output older than any of
//! its inputs? An output is stale when it does not exist or when the newest
//! input's mtime is strictly greater than the output's mtime.
//!
//! Granularity is whatever the underlying filesystem reports. There is no
//! content hashing; a rewritten-but-identical source still triggers a
//! rebuild, and tools that reset mtimes (e.g. `git checkout`) look like
//! changes. That trade-off keeps the check a pair of `stat` calls.

use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// True when `output` must be regenerated from `inputs`.
///
/// Missing output is always stale. A missing or unreadable input contributes
/// nothing (callers pass mtimes they already have in hand).
pub fn is_stale(inputs: &[SystemTime], output: &Path) -> bool {
    match modified(output) {
        None => true,
        Some(out) => inputs.iter().any(|input| *input > out),
    }
}

/// The file's modification time, or `None` if it cannot be read.
pub fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// The file's modification time in milliseconds since the Unix epoch,
/// `0` when the file is missing. Matches the manifest's `modifiedTime`
/// representation.
pub fn modified_millis(path: &Path) -> u64 {
    modified(path).map(to_millis).unwrap_or(0)
}

/// Convert a [`SystemTime`] to milliseconds since the Unix epoch.
/// Pre-epoch times clamp to 0.
pub fn to_millis(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
