//! Run statistics with atomic counters.
//!
//! [`RunStats`] is shared with whoever launched the run, so progress can be
//! read from another thread while the walk is in flight. [`StatsSnapshot`]
//! is the plain copy stored in the final summary.
//!
//! # Examples
//!
//! ```
//! use dp_renamer::RunStats;
//!
//! let stats = RunStats::new();
//! stats.increment_directories();
//! stats.increment_renamed();
//!
//! let snapshot = stats.snapshot();
//! assert_eq!(snapshot.files_renamed, 1);
//! assert_eq!(snapshot.directories_visited, 1);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Atomic counters for one run.
///
/// Uses relaxed ordering. The counters are informational and never used to
/// synchronise other memory.
#[derive(Debug, Default)]
pub struct RunStats {
    /// Files moved to their final name.
    files_renamed: AtomicU64,
    /// Directories listed by the walk, the root included.
    directories_visited: AtomicU64,
    /// Errors recorded.
    errors: AtomicU64,
}

impl RunStats {
    /// Creates a new [`RunStats`] with all counters at zero.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments the renamed-files counter.
    #[inline]
    pub fn increment_renamed(&self) {
        self.files_renamed.fetch_add(1, Ordering::Relaxed);
    }

    /// Increments the visited-directories counter.
    #[inline]
    pub fn increment_directories(&self) {
        self.directories_visited.fetch_add(1, Ordering::Relaxed);
    }

    /// Increments the error counter.
    #[inline]
    pub fn increment_errors(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns a point-in-time copy of all counters.
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            files_renamed: self.files_renamed.load(Ordering::Relaxed),
            directories_visited: self.directories_visited.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }

    /// Resets all counters to zero.
    pub fn reset(&self) {
        self.files_renamed.store(0, Ordering::Relaxed);
        self.directories_visited.store(0, Ordering::Relaxed);
        self.errors.store(0, Ordering::Relaxed);
    }
}

/// A point-in-time copy of [`RunStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Files moved to their final name.
    pub files_renamed: u64,
    /// Directories listed by the walk.
    pub directories_visited: u64,
    /// Errors recorded.
    pub errors: u64,
}

impl StatsSnapshot {
    /// Returns `true` if no errors were recorded.
    #[inline]
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        self.errors == 0
    }
}
