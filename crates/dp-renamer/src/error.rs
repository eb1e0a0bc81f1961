//! Error types for the dp-renamer crate.
//!
//! This module provides the [`RenameError`] type for everything that can go
//! wrong during a run, and [`ErrorKind`] for classifying those failures.

use std::io;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

/// Errors that can occur during a rename run.
///
/// # Error Recovery Strategy
///
/// - **Root errors** ([`RenameError::RootNotFound`], [`RenameError::RootNotDirectory`]):
///   Fatal - returned before any traversal begins
/// - **Everything else**: Recorded in the run summary, the file or directory
///   is skipped, and the walk continues
///
/// # Examples
///
/// ```
/// use dp_renamer::{ErrorKind, RenameError};
/// use camino::Utf8PathBuf;
///
/// let err = RenameError::NameCollision {
///     path: Utf8PathBuf::from("/scans/1/file.txt"),
///     target: Utf8PathBuf::from("/scans/1/1_file.txt"),
/// };
/// assert!(err.is_recoverable());
/// assert_eq!(err.kind(), ErrorKind::NameCollision);
/// ```
#[derive(Debug, thiserror::Error)]
pub enum RenameError {
    /// The scan root does not exist.
    #[error("root path does not exist: {0}")]
    RootNotFound(Utf8PathBuf),

    /// The scan root exists but is not a directory.
    #[error("root path is not a directory: {0}")]
    RootNotDirectory(Utf8PathBuf),

    /// Insufficient permission to read a directory or rename a file.
    #[error("access denied for {path}: {source}")]
    Access {
        /// The path that could not be accessed.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The computed target name is already taken.
    ///
    /// The original file is left untouched.
    #[error("cannot rename {path}: {target} already exists")]
    NameCollision {
        /// The file that was to be renamed.
        path: Utf8PathBuf,
        /// The occupied target path.
        target: Utf8PathBuf,
    },

    /// The resulting name exceeds the platform or configured length limit.
    #[error("name too long ({len} bytes) for {path}")]
    PathLimit {
        /// The path whose name is too long.
        path: Utf8PathBuf,
        /// Length of the offending name in bytes.
        len: usize,
    },

    /// The first rename phase succeeded but the second did not.
    ///
    /// The file now lives at `temp` and needs manual recovery.
    #[error("{original} was left at temporary name {temp}: {cause}")]
    Stranded {
        /// Where the file was before the run.
        original: Utf8PathBuf,
        /// Where the file is now.
        temp: Utf8PathBuf,
        /// Why the second phase failed.
        #[source]
        cause: Box<RenameError>,
    },

    /// A file still carries a temporary name from an earlier, interrupted
    /// run.
    ///
    /// It is skipped so the marker stays visible for manual recovery.
    #[error("{path} is a temporary name left by an earlier run; restore its original name by hand")]
    LeftoverTemp {
        /// The file at the temporary name.
        path: Utf8PathBuf,
    },

    /// Any other I/O failure.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// The path involved.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A directory entry is not valid UTF-8 and cannot be processed.
    #[error("path is not valid UTF-8: {}", _0.display())]
    NonUtf8Path(std::path::PathBuf),
}

/// Coarse classification of a [`RenameError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Permission failures.
    Access,
    /// Target name already taken.
    NameCollision,
    /// Name or path too long.
    PathLimit,
    /// Invalid scan root.
    Structural,
    /// File left at its temporary name.
    Stranded,
    /// Other I/O or encoding failures.
    Io,
}

impl RenameError {
    /// Classifies an I/O error raised while operating on `path`.
    ///
    /// Permission failures become [`RenameError::Access`], over-long names
    /// become [`RenameError::PathLimit`], and everything else becomes
    /// [`RenameError::Io`].
    pub fn from_io(path: impl Into<Utf8PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        if source.kind() == io::ErrorKind::PermissionDenied {
            Self::Access { path, source }
        } else if is_name_too_long(&source) {
            let len = path.file_name().map_or(path.as_str().len(), str::len);
            Self::PathLimit { path, len }
        } else {
            Self::Io { path, source }
        }
    }

    /// Returns `true` if the walk can continue after this error.
    #[inline]
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !self.is_fatal()
    }

    /// Returns `true` if this error aborts the whole run.
    #[inline]
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::RootNotFound(_) | Self::RootNotDirectory(_))
    }

    /// Returns the classification of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::RootNotFound(_) | Self::RootNotDirectory(_) => ErrorKind::Structural,
            Self::Access { .. } => ErrorKind::Access,
            Self::NameCollision { .. } => ErrorKind::NameCollision,
            Self::PathLimit { .. } => ErrorKind::PathLimit,
            Self::Stranded { .. } | Self::LeftoverTemp { .. } => ErrorKind::Stranded,
            Self::Io { .. } | Self::NonUtf8Path(_) => ErrorKind::Io,
        }
    }

    /// Returns the path the error is about, if it is UTF-8.
    #[must_use]
    pub fn path(&self) -> Option<&Utf8PathBuf> {
        match self {
            Self::RootNotFound(path) | Self::RootNotDirectory(path) => Some(path),
            Self::Access { path, .. }
            | Self::NameCollision { path, .. }
            | Self::PathLimit { path, .. }
            | Self::LeftoverTemp { path }
            | Self::Io { path, .. } => Some(path),
            Self::Stranded { original, .. } => Some(original),
            Self::NonUtf8Path(_) => None,
        }
    }
}

/// OS error code for "file name too long" on the current platform.
///
/// Stands in for `io::ErrorKind::InvalidFilename`, which is only stable from
/// Rust 1.87; switch to the kind once `rust-version` reaches it.
#[cfg(any(target_os = "linux", target_os = "android"))]
const NAME_TOO_LONG: Option<i32> = Some(36);
#[cfg(all(unix, not(any(target_os = "linux", target_os = "android"))))]
const NAME_TOO_LONG: Option<i32> = Some(63);
#[cfg(windows)]
const NAME_TOO_LONG: Option<i32> = Some(206);
#[cfg(not(any(unix, windows)))]
const NAME_TOO_LONG: Option<i32> = None;

fn is_name_too_long(err: &io::Error) -> bool {
    NAME_TOO_LONG.is_some_and(|code| err.raw_os_error() == Some(code))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_errors_are_fatal() {
        let err = RenameError::RootNotFound(Utf8PathBuf::from("/missing"));
        assert!(err.is_fatal());
        assert!(!err.is_recoverable());
        assert_eq!(err.kind(), ErrorKind::Structural);
        assert!(err.to_string().contains("/missing"));

        let err = RenameError::RootNotDirectory(Utf8PathBuf::from("/file.txt"));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_from_io_permission_denied() {
        let err = RenameError::from_io(
            "/r/2/file.txt",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.kind(), ErrorKind::Access);
        assert!(err.is_recoverable());
        assert_eq!(err.path().map(|p| p.as_str()), Some("/r/2/file.txt"));
    }

    #[test]
    fn test_from_io_other() {
        let err = RenameError::from_io("/r/x", io::Error::other("boom"));
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[cfg(any(target_os = "linux", target_os = "android"))]
    #[test]
    fn test_from_io_name_too_long() {
        let err = RenameError::from_io("/r/abc", io::Error::from_raw_os_error(36));
        assert!(matches!(err, RenameError::PathLimit { len: 3, .. }));
    }

    #[test]
    fn test_stranded_reports_original_path() {
        let err = RenameError::Stranded {
            original: Utf8PathBuf::from("/r/1/file.txt"),
            temp: Utf8PathBuf::from("/r/1/.dp-abc.tmp"),
            cause: Box::new(RenameError::NameCollision {
                path: Utf8PathBuf::from("/r/1/.dp-abc.tmp"),
                target: Utf8PathBuf::from("/r/1/1_file.txt"),
            }),
        };
        assert_eq!(err.kind(), ErrorKind::Stranded);
        assert_eq!(err.path().map(|p| p.as_str()), Some("/r/1/file.txt"));
        let msg = err.to_string();
        assert!(msg.contains(".dp-abc.tmp"));
        assert!(msg.contains("already exists"));
    }

    #[test]
    fn test_non_utf8_has_no_path() {
        let err = RenameError::NonUtf8Path(std::path::PathBuf::from("x"));
        assert!(err.path().is_none());
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}
