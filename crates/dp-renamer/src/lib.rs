//! Tree walk, sibling ranking, and two-phase rename engine.
//!
//! This crate renames every file in a directory tree by prefixing it with
//! the rank of its containing directory among that directory's siblings,
//! using natural ordering (`1, 2, 10`).
//!
//! # Overview
//!
//! The main entry point is [`TreeRenamer`], which combines:
//!
//! - [`DirectoryWalker`]: Lazy depth-first traversal that ranks each level
//! - [`TwoPhaseRename`]: Collision-safe rename through a temporary name
//! - [`EventSink`]: Progress reporting without any front-end dependency
//! - [`CancelToken`]: Cooperative stop signal checked between files
//! - [`RunStats`]: Atomic counters readable while a run is in flight
//!
//! # Example
//!
//! ```no_run
//! use dp_renamer::{RunConfig, TreeRenamer};
//! use camino::Utf8Path;
//!
//! let renamer = TreeRenamer::new(RunConfig::new(Utf8Path::new("/scans")))?;
//! let summary = renamer.run();
//! println!("Renamed {} files", summary.files_renamed());
//!
//! for (path, error) in &summary.errors {
//!     eprintln!("{path}: {error}");
//! }
//! # Ok::<(), dp_renamer::RenameError>(())
//! ```
//!
//! # Streaming API
//!
//! Front-ends that need live progress run the engine on a blocking thread
//! and receive events through a channel:
//!
//! ```ignore
//! use dp_renamer::{RenameEvent, RunConfig, TreeRenamer};
//! use tokio::sync::mpsc;
//!
//! let (tx, mut rx) = mpsc::channel(256);
//! let renamer = TreeRenamer::new(RunConfig::new(root))?;
//!
//! let worker = renamer.clone();
//! tokio::task::spawn_blocking(move || worker.run_streaming(tx));
//!
//! while let Some(event) = rx.recv().await {
//!     match event {
//!         RenameEvent::DirectoryEntered { path, rank } => println!("{path} ({rank:?})"),
//!         RenameEvent::FileRenamed { old_name, new_name, .. } => println!("{old_name} -> {new_name}"),
//!         RenameEvent::Error { path, message, .. } => eprintln!("{path}: {message}"),
//!         RenameEvent::Cancelled => println!("stopped"),
//!         RenameEvent::Complete(summary) => println!("{} renamed", summary.files_renamed()),
//!     }
//! }
//! ```
//!
//! # Behaviour worth knowing
//!
//! - Directories are never renamed.
//! - Prefixes stack: running twice turns `file.txt` into `1_1_file.txt`.
//! - Per-file failures are recorded and the walk continues. Only an invalid
//!   root fails the whole run.

#![deny(clippy::all)]
#![warn(missing_docs)]

mod cancel;
mod error;
mod events;
mod listing;
mod rename;
mod stats;
mod summary;
mod walker;

pub use cancel::CancelToken;
pub use error::{ErrorKind, RenameError};
pub use events::{ChannelSink, EventSink, NullSink, RenameEvent};
pub use listing::{Listing, list_directory};
pub use rename::{FileState, RenameOptions, TwoPhaseRename};
pub use stats::{RunStats, StatsSnapshot};
pub use summary::{ErrorRecord, PlanResult, RunSummary};
pub use walker::{DirectoryWalker, VisitedDirectory};

use std::sync::Arc;
use std::time::Instant;

use camino::{Utf8Path, Utf8PathBuf};
use dp_core::{Rank, RenameConfig, RenamePlanEntry, RootRank};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Configuration for one [`TreeRenamer`].
///
/// # Examples
///
/// ```
/// use dp_renamer::RunConfig;
/// use dp_core::RootRank;
/// use camino::Utf8Path;
///
/// let config = RunConfig::new(Utf8Path::new("/scans"))
///     .with_root_files(true)
///     .with_root_rank(RootRank::SiblingRank);
/// assert!(config.include_root_files);
/// ```
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Root directory of the tree.
    pub root: Utf8PathBuf,
    /// Whether files directly under the root are renamed.
    pub include_root_files: bool,
    /// Rank convention for root-level files.
    pub root_rank: RootRank,
    /// Whether symbolic links are followed.
    pub follow_links: bool,
    /// Per-file rename limits.
    pub options: RenameOptions,
}

impl RunConfig {
    /// Creates a configuration with default settings for `root`.
    #[must_use]
    pub fn new(root: &Utf8Path) -> Self {
        Self::from_settings(root, &RenameConfig::default())
    }

    /// Creates a configuration for `root` from loaded settings.
    #[must_use]
    pub fn from_settings(root: &Utf8Path, settings: &RenameConfig) -> Self {
        Self {
            root: root.to_owned(),
            include_root_files: settings.include_root_files,
            root_rank: settings.root_rank,
            follow_links: settings.follow_links,
            options: RenameOptions {
                max_name_len: settings.max_name_len,
                temp_marker: settings.temp_marker.clone(),
            },
        }
    }

    /// Sets whether root-level files are renamed.
    #[must_use]
    pub fn with_root_files(mut self, include: bool) -> Self {
        self.include_root_files = include;
        self
    }

    /// Sets the rank convention for root-level files.
    #[must_use]
    pub fn with_root_rank(mut self, root_rank: RootRank) -> Self {
        self.root_rank = root_rank;
        self
    }

    /// Sets whether symbolic links are followed.
    #[must_use]
    pub fn with_follow_links(mut self, follow: bool) -> Self {
        self.follow_links = follow;
        self
    }

    /// Replaces the per-file rename limits.
    #[must_use]
    pub fn with_options(mut self, options: RenameOptions) -> Self {
        self.options = options;
        self
    }
}

/// The rename engine.
///
/// # Cloning
///
/// `TreeRenamer` is cheaply cloneable. Clones share statistics and the stop
/// signal, so one clone can run on a background thread while another
/// reads progress or cancels. Only one run should be active at a time.
///
/// # Cancellation
///
/// The stop signal is not cleared automatically. Call
/// [`CancelToken::reset`] before reusing a renamer after a cancelled run.
#[derive(Debug, Clone)]
pub struct TreeRenamer {
    config: RunConfig,
    stats: Arc<RunStats>,
    cancel: CancelToken,
}

impl TreeRenamer {
    /// Creates a renamer after validating the root.
    ///
    /// The root is canonicalized so ranks and events use absolute paths.
    ///
    /// # Errors
    ///
    /// Returns [`RenameError::RootNotFound`] or
    /// [`RenameError::RootNotDirectory`] if the root is unusable.
    pub fn new(mut config: RunConfig) -> Result<Self, RenameError> {
        if !config.root.exists() {
            return Err(RenameError::RootNotFound(config.root));
        }
        if !config.root.is_dir() {
            return Err(RenameError::RootNotDirectory(config.root));
        }

        config.root = config
            .root
            .canonicalize_utf8()
            .map_err(|e| RenameError::from_io(&config.root, e))?;

        info!(
            root = %config.root,
            include_root_files = config.include_root_files,
            root_rank = ?config.root_rank,
            "Creating renamer"
        );

        Ok(Self {
            config,
            stats: Arc::new(RunStats::new()),
            cancel: CancelToken::new(),
        })
    }

    /// Uses an externally owned stop signal.
    #[must_use]
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Returns a handle to this renamer's stop signal.
    #[must_use]
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Returns a snapshot of the live counters.
    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Returns the configuration, with the canonical root.
    #[must_use]
    pub const fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Runs the rename without progress reporting.
    pub fn run(&self) -> RunSummary {
        self.run_with_sink(&mut NullSink)
    }

    /// Runs the rename, sending progress to `sink`.
    pub fn run_with_sink(&self, sink: &mut dyn EventSink) -> RunSummary {
        let started = Instant::now();
        let root = &self.config.root;
        info!(root = %root, "Starting rename run");

        self.stats.reset();
        let root_rank = self.root_files_rank();
        let mut errors = Vec::new();
        let mut cancelled = false;

        'walk: for visited in DirectoryWalker::new(root, self.config.follow_links) {
            if self.cancel.is_cancelled() {
                cancelled = true;
                break;
            }

            let visited = match visited {
                Ok(visited) => visited,
                Err(e) => {
                    self.record(&mut errors, sink, e);
                    continue;
                }
            };

            self.stats.increment_directories();
            for e in visited.entry_errors {
                self.record(&mut errors, sink, e);
            }

            let node = visited.node;
            let rank = if node.is_root() {
                root_rank
            } else {
                visited.rank
            };

            sink.emit(RenameEvent::DirectoryEntered {
                path: node.path.clone(),
                rank,
            });

            let Some(rank) = rank else {
                debug!(path = %node.path, "Leaving root files untouched");
                continue;
            };

            info!(path = %node.path, rank = %rank, files = node.files.len(), "Processing directory");

            for file in &node.files {
                if self.cancel.is_cancelled() {
                    cancelled = true;
                    break 'walk;
                }

                let Some(entry) = RenamePlanEntry::new(file.clone(), rank) else {
                    continue;
                };

                match TwoPhaseRename::new(&entry).execute(&self.config.options) {
                    Ok(target) => {
                        debug!(from = %entry.source, to = %target, "Renamed file");
                        self.stats.increment_renamed();
                        sink.emit(RenameEvent::FileRenamed {
                            directory: node.path.clone(),
                            old_name: entry.current_name().to_owned(),
                            new_name: entry.new_name.clone(),
                            rank,
                        });
                    }
                    Err(e) => self.record(&mut errors, sink, e),
                }
            }
        }

        if cancelled {
            warn!(root = %root, "Run cancelled, completed renames are kept");
            sink.emit(RenameEvent::Cancelled);
        }

        let summary = RunSummary {
            root: root.clone(),
            stats: self.stats.snapshot(),
            errors,
            cancelled,
            elapsed: started.elapsed(),
        };

        info!(
            renamed = summary.files_renamed(),
            directories = summary.directories_visited(),
            errors = summary.error_count(),
            cancelled = summary.cancelled,
            elapsed_ms = summary.elapsed.as_millis(),
            "Rename run finished"
        );

        summary
    }

    /// Runs the rename, streaming events into `tx`.
    ///
    /// Intended for `tokio::task::spawn_blocking`. After the walk ends a
    /// final [`RenameEvent::Complete`] carries the summary. A dropped
    /// receiver does not stop the run; use the [`CancelToken`] for that.
    pub fn run_streaming(&self, tx: mpsc::Sender<RenameEvent>) {
        let mut sink = ChannelSink::new(tx);
        let summary = self.run_with_sink(&mut sink);
        sink.emit(RenameEvent::Complete(Box::new(summary)));
    }

    /// Computes every rename a run would perform without touching anything.
    ///
    /// The plan reflects the tree as it is now; files are listed but never
    /// moved, so each directory's entries are independent of the others.
    pub fn plan(&self) -> PlanResult {
        let root = &self.config.root;
        info!(root = %root, "Planning rename run");

        let root_rank = self.root_files_rank();
        let mut entries = Vec::new();
        let mut errors = Vec::new();

        for visited in DirectoryWalker::new(root, self.config.follow_links) {
            if self.cancel.is_cancelled() {
                break;
            }

            let visited = match visited {
                Ok(visited) => visited,
                Err(e) => {
                    errors.push((error_path(&e, root), e));
                    continue;
                }
            };
            errors.extend(
                visited
                    .entry_errors
                    .into_iter()
                    .map(|e| (error_path(&e, root), e)),
            );

            let rank = if visited.node.is_root() {
                root_rank
            } else {
                visited.rank
            };
            let Some(rank) = rank else {
                continue;
            };

            for file in visited.node.files {
                if file
                    .file_name()
                    .is_some_and(|name| self.config.options.is_temp_name(name))
                {
                    errors.push((file.clone(), RenameError::LeftoverTemp { path: file }));
                    continue;
                }
                entries.extend(RenamePlanEntry::new(file, rank));
            }
        }

        info!(entries = entries.len(), errors = errors.len(), "Plan complete");

        PlanResult {
            root: root.clone(),
            entries,
            errors,
        }
    }

    /// Rank applied to root-level files, or `None` when they are excluded.
    fn root_files_rank(&self) -> Option<Rank> {
        if !self.config.include_root_files {
            return None;
        }

        Some(match self.config.root_rank {
            RootRank::SiblingRank => self.root_sibling_rank(),
            _ => Rank::ROOT_ZERO,
        })
    }

    /// The root's own rank among its parent's subdirectories.
    fn root_sibling_rank(&self) -> Rank {
        let root = &self.config.root;
        let Some(parent) = root.parent() else {
            return Rank::FIRST;
        };

        match list_directory(parent, None, self.config.follow_links) {
            Ok(listing) => listing.node.rank_of(root).unwrap_or(Rank::FIRST),
            Err(e) => {
                warn!(parent = %parent, error = %e, "Cannot list root's parent, using rank 1");
                Rank::FIRST
            }
        }
    }

    fn record(
        &self,
        errors: &mut Vec<(Utf8PathBuf, RenameError)>,
        sink: &mut dyn EventSink,
        error: RenameError,
    ) {
        let path = error_path(&error, &self.config.root);
        warn!(path = %path, error = %error, "Recorded error");
        self.stats.increment_errors();
        sink.emit(RenameEvent::from_error(path.clone(), &error));
        errors.push((path, error));
    }
}

/// Best display path for an error; non-UTF-8 paths are shown lossily.
fn error_path(error: &RenameError, root: &Utf8Path) -> Utf8PathBuf {
    match error {
        RenameError::NonUtf8Path(raw) => Utf8PathBuf::from(raw.to_string_lossy().into_owned()),
        other => other.path().cloned().unwrap_or_else(|| root.to_owned()),
    }
}

/// Renames every file under `root` with default settings.
///
/// Root-level files are renamed with rank `0` when `include_root_files` is
/// set, and left alone otherwise.
///
/// # Errors
///
/// Returns an error only if `root` is missing or not a directory.
pub fn run(root: &Utf8Path, include_root_files: bool) -> Result<RunSummary, RenameError> {
    let config = RunConfig::new(root).with_root_files(include_root_files);
    Ok(TreeRenamer::new(config)?.run())
}
