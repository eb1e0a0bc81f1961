//! Two-phase, collision-safe file rename.
//!
//! Every file moves in two hops inside its own directory:
//!
//! ```text
//! Discovered ──stage()──► TempRenamed ──commit()──► FinalRenamed
//!     │                        │
//!     ▼                        ▼
//!   Failed                 Stranded
//! ```
//!
//! `stage` checks the target is free and the new name fits, then moves the
//! file to a unique temporary name. `commit` re-checks the target and moves
//! the file to its final name. A failure in `stage` leaves the original
//! untouched. A failure in `commit` leaves the file at its temporary name
//! and is reported as [`RenameError::Stranded`] so it can be found and
//! recovered by hand.
//!
//! `std::fs::rename` silently replaces an existing target on Unix, so the
//! target is checked explicitly before each phase. Nothing is ever
//! overwritten.

use std::fs;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use dp_core::RenamePlanEntry;
use tracing::debug;
use uuid::Uuid;

use crate::error::RenameError;

/// Length of a simple-format UUID.
const TEMP_ID_LEN: usize = 32;

/// Lifecycle of a single file rename.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileState {
    /// Listed, not yet touched.
    Discovered,
    /// Moved to its temporary name.
    TempRenamed,
    /// Moved to its final name.
    FinalRenamed,
    /// Rejected or failed before the first move. The original is untouched.
    Failed,
    /// The second move failed. The file is at its temporary name.
    Stranded,
}

/// Limits applied to every rename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameOptions {
    /// Longest file name, in bytes, that will be created.
    pub max_name_len: usize,
    /// Marker embedded in temporary names.
    pub temp_marker: String,
}

impl Default for RenameOptions {
    fn default() -> Self {
        let defaults = dp_core::RenameConfig::default();
        Self {
            max_name_len: defaults.max_name_len,
            temp_marker: defaults.temp_marker,
        }
    }
}

impl RenameOptions {
    /// Builds a fresh temporary name, `.<marker>-<uuid>.tmp`.
    ///
    /// The name does not embed the original so it stays short no matter how
    /// long the original is.
    #[must_use]
    pub fn temp_name(&self) -> String {
        format!(".{}-{}.tmp", self.temp_marker, Uuid::new_v4().simple())
    }

    /// Returns `true` if `name` has the shape produced by
    /// [`temp_name`](Self::temp_name).
    ///
    /// Such files are left over from a run whose second phase failed.
    #[must_use]
    pub fn is_temp_name(&self, name: &str) -> bool {
        name.strip_prefix('.')
            .and_then(|rest| rest.strip_prefix(self.temp_marker.as_str()))
            .and_then(|rest| rest.strip_prefix('-'))
            .and_then(|rest| rest.strip_suffix(".tmp"))
            .is_some_and(|id| {
                id.len() == TEMP_ID_LEN && id.bytes().all(|b| b.is_ascii_hexdigit())
            })
    }
}

/// One file moving through the two rename phases.
///
/// # Examples
///
/// ```no_run
/// use dp_core::{Rank, RenamePlanEntry};
/// use dp_renamer::{RenameOptions, TwoPhaseRename};
/// use camino::Utf8PathBuf;
///
/// let entry = RenamePlanEntry::new(Utf8PathBuf::from("/scans/2/page.pdf"), Rank::new(2))
///     .expect("file name");
/// let target = TwoPhaseRename::new(&entry).execute(&RenameOptions::default())?;
/// assert_eq!(target.as_str(), "/scans/2/2_page.pdf");
/// # Ok::<(), dp_renamer::RenameError>(())
/// ```
#[derive(Debug)]
pub struct TwoPhaseRename<'a> {
    entry: &'a RenamePlanEntry,
    target: Utf8PathBuf,
    temp: Option<Utf8PathBuf>,
    state: FileState,
}

impl<'a> TwoPhaseRename<'a> {
    /// Starts a rename for a planned entry.
    #[must_use]
    pub fn new(entry: &'a RenamePlanEntry) -> Self {
        Self {
            entry,
            target: entry.target(),
            temp: None,
            state: FileState::Discovered,
        }
    }

    /// Current lifecycle state.
    #[inline]
    #[must_use]
    pub const fn state(&self) -> FileState {
        self.state
    }

    /// The final path this rename aims for.
    #[inline]
    #[must_use]
    pub fn target(&self) -> &Utf8Path {
        &self.target
    }

    /// The temporary path, once staged.
    #[inline]
    #[must_use]
    pub fn temp(&self) -> Option<&Utf8Path> {
        self.temp.as_deref()
    }

    /// Runs both phases.
    pub fn execute(mut self, options: &RenameOptions) -> Result<Utf8PathBuf, RenameError> {
        self.stage(options)?;
        self.commit()
    }

    /// Phase one: validate and move the file to a temporary name.
    ///
    /// On error the state becomes [`FileState::Failed`] and the original
    /// file is untouched.
    pub fn stage(&mut self, options: &RenameOptions) -> Result<(), RenameError> {
        debug_assert_eq!(self.state, FileState::Discovered);

        match self.try_stage(options) {
            Ok(temp) => {
                debug!(from = %self.entry.source, temp = %temp, "Staged rename");
                self.temp = Some(temp);
                self.state = FileState::TempRenamed;
                Ok(())
            }
            Err(e) => {
                self.state = FileState::Failed;
                Err(e)
            }
        }
    }

    fn try_stage(&self, options: &RenameOptions) -> Result<Utf8PathBuf, RenameError> {
        let source = &self.entry.source;
        if options.is_temp_name(self.entry.current_name()) {
            return Err(RenameError::LeftoverTemp {
                path: source.clone(),
            });
        }

        let len = self.entry.new_name.len();
        if len > options.max_name_len {
            return Err(RenameError::PathLimit {
                path: self.target.clone(),
                len,
            });
        }

        if occupied(&self.target)? {
            return Err(RenameError::NameCollision {
                path: source.clone(),
                target: self.target.clone(),
            });
        }

        let temp = self.entry.directory().join(options.temp_name());
        if occupied(&temp)? {
            return Err(RenameError::NameCollision {
                path: source.clone(),
                target: temp,
            });
        }

        fs::rename(source, &temp).map_err(|e| classify(source, &temp, e))?;
        Ok(temp)
    }

    /// Phase two: move the staged file to its final name.
    ///
    /// On error the state becomes [`FileState::Stranded`] and the error is a
    /// [`RenameError::Stranded`] naming the temporary path.
    pub fn commit(&mut self) -> Result<Utf8PathBuf, RenameError> {
        let Some(temp) = self.temp.clone() else {
            self.state = FileState::Failed;
            return Err(RenameError::Io {
                path: self.entry.source.clone(),
                source: io::Error::other("rename committed before it was staged"),
            });
        };

        let result = match occupied(&self.target) {
            Ok(true) => Err(RenameError::NameCollision {
                path: temp.clone(),
                target: self.target.clone(),
            }),
            Ok(false) => {
                fs::rename(&temp, &self.target).map_err(|e| classify(&temp, &self.target, e))
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                self.state = FileState::FinalRenamed;
                Ok(self.target.clone())
            }
            Err(cause) => {
                self.state = FileState::Stranded;
                Err(RenameError::Stranded {
                    original: self.entry.source.clone(),
                    temp,
                    cause: Box::new(cause),
                })
            }
        }
    }
}

/// Returns `true` if something already lives at `path`.
///
/// Uses `symlink_metadata` so a dangling symlink still counts as occupied.
fn occupied(path: &Utf8Path) -> Result<bool, RenameError> {
    match fs::symlink_metadata(path) {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(RenameError::from_io(path, e)),
    }
}

/// Maps a failed `rename(from, to)` to the error taxonomy.
fn classify(from: &Utf8Path, to: &Utf8Path, source: io::Error) -> RenameError {
    if source.kind() == io::ErrorKind::AlreadyExists {
        return RenameError::NameCollision {
            path: from.to_owned(),
            target: to.to_owned(),
        };
    }

    match RenameError::from_io(from, source) {
        RenameError::PathLimit { .. } => RenameError::PathLimit {
            path: to.to_owned(),
            len: to.file_name().map_or(0, str::len),
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use dp_core::Rank;
    use tempfile::TempDir;

    fn setup(files: &[&str]) -> (TempDir, Utf8PathBuf) {
        let dir = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf8");
        for name in files {
            fs::write(root.join(name), *name).expect("write");
        }
        (dir, root)
    }

    fn entry(root: &Utf8Path, name: &str, rank: u32) -> RenamePlanEntry {
        RenamePlanEntry::new(root.join(name), Rank::new(rank)).expect("entry")
    }

    fn names(root: &Utf8Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(root)
            .expect("read dir")
            .filter_map(Result::ok)
            .filter_map(|e| e.file_name().into_string().ok())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_execute_renames_and_preserves_content() {
        let (_dir, root) = setup(&["file.txt"]);
        let planned = entry(&root, "file.txt", 3);

        let target = TwoPhaseRename::new(&planned)
            .execute(&RenameOptions::default())
            .expect("rename");

        assert_eq!(target, root.join("3_file.txt"));
        assert_eq!(names(&root), ["3_file.txt"]);
        assert_eq!(fs::read_to_string(&target).expect("read"), "file.txt");
    }

    #[test]
    fn test_state_transitions() {
        let (_dir, root) = setup(&["a.txt"]);
        let planned = entry(&root, "a.txt", 1);
        let mut rename = TwoPhaseRename::new(&planned);
        assert_eq!(rename.state(), FileState::Discovered);

        rename.stage(&RenameOptions::default()).expect("stage");
        assert_eq!(rename.state(), FileState::TempRenamed);
        let temp = rename.temp().expect("temp").to_owned();
        assert!(temp.exists());
        assert!(!root.join("a.txt").exists());

        rename.commit().expect("commit");
        assert_eq!(rename.state(), FileState::FinalRenamed);
        assert!(!temp.exists());
        assert_eq!(names(&root), ["1_a.txt"]);
    }

    #[test]
    fn test_existing_target_is_never_overwritten() {
        let (_dir, root) = setup(&["file.txt", "1_file.txt"]);
        let planned = entry(&root, "file.txt", 1);
        let mut rename = TwoPhaseRename::new(&planned);

        let err = rename.stage(&RenameOptions::default()).expect_err("collision");
        assert_eq!(err.kind(), ErrorKind::NameCollision);
        assert_eq!(rename.state(), FileState::Failed);
        assert_eq!(names(&root), ["1_file.txt", "file.txt"]);
        assert_eq!(
            fs::read_to_string(root.join("1_file.txt")).expect("read"),
            "1_file.txt"
        );
    }

    #[test]
    fn test_collision_between_phases_strands_file() {
        let (_dir, root) = setup(&["file.txt"]);
        let planned = entry(&root, "file.txt", 2);
        let mut rename = TwoPhaseRename::new(&planned);
        rename.stage(&RenameOptions::default()).expect("stage");

        fs::write(root.join("2_file.txt"), "intruder").expect("write");

        let err = rename.commit().expect_err("stranded");
        assert_eq!(rename.state(), FileState::Stranded);
        match &err {
            RenameError::Stranded {
                original,
                temp,
                cause,
            } => {
                assert_eq!(original, &root.join("file.txt"));
                assert!(temp.exists());
                assert_eq!(cause.kind(), ErrorKind::NameCollision);
            }
            other => panic!("expected Stranded, got {other:?}"),
        }
        assert_eq!(
            fs::read_to_string(root.join("2_file.txt")).expect("read"),
            "intruder"
        );
    }

    #[test]
    fn test_name_limit_checked_before_touching_file() {
        let (_dir, root) = setup(&["abcdef"]);
        let planned = entry(&root, "abcdef", 10);
        let options = RenameOptions {
            max_name_len: 8,
            ..RenameOptions::default()
        };

        let err = TwoPhaseRename::new(&planned)
            .execute(&options)
            .expect_err("too long");
        assert!(matches!(err, RenameError::PathLimit { len: 9, .. }));
        assert_eq!(names(&root), ["abcdef"]);
    }

    #[test]
    fn test_missing_source_fails_without_side_effects() {
        let (_dir, root) = setup(&[]);
        let planned = entry(&root, "ghost.txt", 1);
        let mut rename = TwoPhaseRename::new(&planned);

        let err = rename.stage(&RenameOptions::default()).expect_err("missing");
        assert_eq!(err.kind(), ErrorKind::Io);
        assert_eq!(rename.state(), FileState::Failed);
        assert!(names(&root).is_empty());
    }

    #[test]
    fn test_commit_without_stage_fails() {
        let (_dir, root) = setup(&["a"]);
        let planned = entry(&root, "a", 1);
        let mut rename = TwoPhaseRename::new(&planned);
        assert!(rename.commit().is_err());
        assert_eq!(rename.state(), FileState::Failed);
    }

    #[test]
    fn test_temp_name_uses_marker() {
        let options = RenameOptions {
            temp_marker: "xyz".to_owned(),
            ..RenameOptions::default()
        };
        let name = options.temp_name();
        assert!(name.starts_with(".xyz-"));
        assert!(name.ends_with(".tmp"));
        assert_ne!(name, options.temp_name());
        assert!(options.is_temp_name(&name));
    }

    #[test]
    fn test_temp_name_shape_is_strict() {
        let options = RenameOptions::default();
        assert!(options.is_temp_name(".dp-0123456789abcdef0123456789abcdef.tmp"));
        assert!(!options.is_temp_name("dp-0123456789abcdef0123456789abcdef.tmp"));
        assert!(!options.is_temp_name(".dp-notahexid.tmp"));
        assert!(!options.is_temp_name(".xyz-0123456789abcdef0123456789abcdef.tmp"));
        assert!(!options.is_temp_name("file.txt"));
    }

    #[test]
    fn test_leftover_temp_file_is_not_renamed() {
        let leftover = ".dp-0123456789abcdef0123456789abcdef.tmp";
        let (_dir, root) = setup(&[leftover]);
        let planned = entry(&root, leftover, 1);
        let mut rename = TwoPhaseRename::new(&planned);

        let err = rename.stage(&RenameOptions::default()).expect_err("leftover");
        assert!(matches!(err, RenameError::LeftoverTemp { .. }));
        assert_eq!(err.kind(), ErrorKind::Stranded);
        assert_eq!(rename.state(), FileState::Failed);
        assert_eq!(names(&root), [leftover]);
    }
}
