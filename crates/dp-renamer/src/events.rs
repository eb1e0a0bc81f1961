//! Progress events and the sinks that receive them.
//!
//! The engine reports progress through the [`EventSink`] trait so it carries
//! no dependency on any particular front-end. Closures, a tokio channel, and
//! a no-op sink are supported out of the box.
//!
//! # Event Flow
//!
//! ```text
//! DirectoryEntered (root)
//!   FileRenamed / Error ...
//! DirectoryEntered (child, rank N)
//!   FileRenamed / Error ...
//! ...
//! Cancelled            (only if the stop signal fired)
//! Complete(summary)    (streaming runs only)
//! ```

use camino::Utf8PathBuf;
use dp_core::Rank;
use tokio::sync::mpsc;

use crate::error::{ErrorKind, RenameError};
use crate::summary::RunSummary;

/// A progress event emitted during a run.
///
/// # Size Optimization
///
/// The `Complete` variant is boxed since [`RunSummary`] is much larger
/// than the other variants.
#[derive(Debug)]
pub enum RenameEvent {
    /// The walk listed a directory.
    ///
    /// `rank` is `None` for the scan root when its files are not renamed.
    DirectoryEntered {
        /// The directory.
        path: Utf8PathBuf,
        /// Prefix rank applied to the directory's files.
        rank: Option<Rank>,
    },

    /// A file reached its final name.
    FileRenamed {
        /// Directory containing the file.
        directory: Utf8PathBuf,
        /// Name before the run.
        old_name: String,
        /// Name after the run.
        new_name: String,
        /// Rank used for the prefix.
        rank: Rank,
    },

    /// A recoverable error was recorded.
    Error {
        /// The path involved.
        path: Utf8PathBuf,
        /// Error classification.
        kind: ErrorKind,
        /// Human-readable description.
        message: String,
    },

    /// The stop signal was observed and the walk ended early.
    Cancelled,

    /// The run finished. Sent once, last, by streaming runs.
    Complete(Box<RunSummary>),
}

impl RenameEvent {
    /// Builds an [`RenameEvent::Error`] describing `error`.
    pub(crate) fn from_error(path: Utf8PathBuf, error: &RenameError) -> Self {
        Self::Error {
            path,
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// Receiver of progress events.
///
/// Implemented for any `FnMut(RenameEvent)` closure:
///
/// ```
/// use dp_renamer::{EventSink, RenameEvent};
///
/// let mut seen = Vec::new();
/// let mut sink = |event: RenameEvent| seen.push(event);
/// sink.emit(RenameEvent::Cancelled);
/// assert_eq!(seen.len(), 1);
/// ```
pub trait EventSink {
    /// Handles one event.
    fn emit(&mut self, event: RenameEvent);
}

impl<F> EventSink for F
where
    F: FnMut(RenameEvent),
{
    fn emit(&mut self, event: RenameEvent) {
        self(event);
    }
}

/// A sink that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: RenameEvent) {}
}

/// A sink that forwards events into a tokio channel from a blocking thread.
///
/// If the receiver is dropped, events are discarded and the run itself
/// carries on.
#[derive(Debug)]
pub struct ChannelSink {
    tx: mpsc::Sender<RenameEvent>,
    closed: bool,
}

impl ChannelSink {
    /// Wraps a channel sender.
    #[must_use]
    pub const fn new(tx: mpsc::Sender<RenameEvent>) -> Self {
        Self { tx, closed: false }
    }

    /// Returns `true` once the receiver has gone away.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }
}

impl EventSink for ChannelSink {
    fn emit(&mut self, event: RenameEvent) {
        if self.closed {
            return;
        }
        if self.tx.blocking_send(event).is_err() {
            tracing::debug!("Event receiver dropped, discarding further events");
            self.closed = true;
        }
    }
}
