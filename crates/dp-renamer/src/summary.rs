//! Run and plan results.

use std::time::Duration;

use camino::Utf8PathBuf;
use dp_core::RenamePlanEntry;
use serde::Serialize;

use crate::error::{ErrorKind, RenameError};
use crate::stats::StatsSnapshot;

/// Result of one rename run.
///
/// Returned even when some files failed. Only an invalid root prevents a
/// summary from being produced.
#[derive(Debug)]
pub struct RunSummary {
    /// The scan root.
    pub root: Utf8PathBuf,
    /// Final counters.
    pub stats: StatsSnapshot,
    /// Every recorded error in the order it occurred.
    pub errors: Vec<(Utf8PathBuf, RenameError)>,
    /// Whether the run stopped early because of the stop signal.
    pub cancelled: bool,
    /// Wall-clock time spent in the run.
    pub elapsed: Duration,
}

impl RunSummary {
    /// Number of files moved to their final name.
    #[inline]
    #[must_use]
    pub const fn files_renamed(&self) -> u64 {
        self.stats.files_renamed
    }

    /// Number of directories listed.
    #[inline]
    #[must_use]
    pub const fn directories_visited(&self) -> u64 {
        self.stats.directories_visited
    }

    /// Number of recorded errors.
    #[inline]
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Returns `true` if the run completed without errors or cancellation.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && !self.cancelled
    }

    /// Errors left at a temporary name, which need manual recovery.
    pub fn stranded(&self) -> impl Iterator<Item = &RenameError> {
        self.errors
            .iter()
            .map(|(_, error)| error)
            .filter(|error| error.kind() == ErrorKind::Stranded)
    }

    /// Serializable view of the recorded errors.
    #[must_use]
    pub fn error_records(&self) -> Vec<ErrorRecord> {
        self.errors
            .iter()
            .map(|(path, error)| ErrorRecord::new(path.clone(), error))
            .collect()
    }
}

/// A recorded error flattened for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorRecord {
    /// The path involved.
    pub path: Utf8PathBuf,
    /// Error classification.
    pub kind: ErrorKind,
    /// Human-readable description, including the underlying cause.
    pub message: String,
}

impl ErrorRecord {
    /// Flattens `error` recorded against `path`.
    #[must_use]
    pub fn new(path: Utf8PathBuf, error: &RenameError) -> Self {
        Self {
            path,
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// Result of a dry run.
#[derive(Debug)]
pub struct PlanResult {
    /// The scan root.
    pub root: Utf8PathBuf,
    /// Every rename the run would attempt, in walk order.
    pub entries: Vec<RenamePlanEntry>,
    /// Listing errors met during the walk.
    pub errors: Vec<(Utf8PathBuf, RenameError)>,
}
