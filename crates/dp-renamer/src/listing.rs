//! Single-level directory listing.
//!
//! [`list_directory`] reads the immediate children of one directory from the
//! live filesystem, splits them into subdirectories and files, and sorts both
//! in natural order. Entries that cannot be classified are reported back
//! alongside the listing rather than failing it.

use std::fs;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use dp_core::DirectoryNode;
use tracing::debug;

use crate::error::RenameError;

/// A directory listing plus the per-entry problems met while taking it.
#[derive(Debug)]
pub struct Listing {
    /// The sorted listing.
    pub node: DirectoryNode,
    /// Entries that were skipped, with the reason.
    pub errors: Vec<RenameError>,
}

/// How a single entry is treated by the walk.
enum EntryClass {
    Directory,
    /// A directory that counts for sibling ranks but is not walked.
    RankOnly,
    File,
    Skip,
}

/// Lists the immediate children of `path`.
///
/// Symbolic links to files are skipped unless `follow_links` is set. Links
/// to directories always take a rank slot among their siblings, but are
/// only walked when `follow_links` is set. Directories with non-UTF-8 names
/// likewise keep their slot and are reported as errors.
///
/// # Errors
///
/// Returns an error if the directory itself cannot be read. Failures on
/// individual entries are collected in [`Listing::errors`].
pub fn list_directory(
    path: &Utf8Path,
    parent: Option<&Utf8Path>,
    follow_links: bool,
) -> Result<Listing, RenameError> {
    let entries = fs::read_dir(path).map_err(|e| RenameError::from_io(path, e))?;

    let mut node = DirectoryNode::new(path.to_owned(), parent.map(Utf8Path::to_path_buf));
    let mut errors = Vec::new();

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                errors.push(RenameError::from_io(path, e));
                continue;
            }
        };

        let child = match Utf8PathBuf::from_path_buf(entry.path()) {
            Ok(child) => child,
            Err(raw) => {
                if matches!(
                    classify(&entry, false),
                    Ok(EntryClass::Directory | EntryClass::RankOnly)
                ) {
                    node.rank_only
                        .push(Utf8PathBuf::from(raw.to_string_lossy().into_owned()));
                }
                errors.push(RenameError::NonUtf8Path(raw));
                continue;
            }
        };

        match classify(&entry, follow_links) {
            Ok(EntryClass::Directory) => node.subdirs.push(child),
            Ok(EntryClass::RankOnly) => {
                debug!(path = %child, "Linked directory ranked but not walked");
                node.rank_only.push(child);
            }
            Ok(EntryClass::File) => node.files.push(child),
            Ok(EntryClass::Skip) => debug!(path = %child, "Skipping entry"),
            Err(e) => errors.push(RenameError::from_io(child, e)),
        }
    }

    node.sort_natural();
    Ok(Listing { node, errors })
}

fn classify(entry: &fs::DirEntry, follow_links: bool) -> io::Result<EntryClass> {
    let file_type = entry.file_type()?;

    if !file_type.is_symlink() {
        return Ok(if file_type.is_dir() {
            EntryClass::Directory
        } else if file_type.is_file() {
            EntryClass::File
        } else {
            EntryClass::Skip
        });
    }

    let target = match fs::metadata(entry.path()) {
        Ok(meta) => meta.file_type(),
        // Dangling link: nothing to rank, rename, or descend into.
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(EntryClass::Skip),
        Err(e) => return Err(e),
    };

    Ok(match (target.is_dir(), follow_links) {
        (true, true) => EntryClass::Directory,
        (true, false) => EntryClass::RankOnly,
        (false, true) if target.is_file() => EntryClass::File,
        _ => EntryClass::Skip,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn utf8(dir: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf8 temp dir")
    }

    #[test]
    fn test_splits_and_sorts_children() {
        let dir = TempDir::new().expect("temp dir");
        let root = utf8(&dir);
        for name in ["10", "2", "1"] {
            fs::create_dir(root.join(name)).expect("mkdir");
        }
        for name in ["log10.log", "file.txt", "log2.log"] {
            fs::write(root.join(name), "x").expect("write");
        }

        let listing = list_directory(&root, None, false).expect("list");
        assert!(listing.errors.is_empty());

        let dirs: Vec<&str> = listing.node.subdirs.iter().filter_map(|p| p.file_name()).collect();
        let files: Vec<&str> = listing.node.files.iter().filter_map(|p| p.file_name()).collect();
        assert_eq!(dirs, ["1", "2", "10"]);
        assert_eq!(files, ["file.txt", "log2.log", "log10.log"]);
        assert!(listing.node.is_root());
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let dir = TempDir::new().expect("temp dir");
        let missing = utf8(&dir).join("nope");
        let err = list_directory(&missing, None, false).expect_err("should fail");
        assert!(err.is_recoverable());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_skipped_unless_followed() {
        let dir = TempDir::new().expect("temp dir");
        let root = utf8(&dir);
        fs::create_dir(root.join("real")).expect("mkdir");
        fs::write(root.join("real.txt"), "x").expect("write");
        std::os::unix::fs::symlink(root.join("real"), root.join("link")).expect("symlink");
        std::os::unix::fs::symlink(root.join("real.txt"), root.join("link.txt")).expect("symlink");
        std::os::unix::fs::symlink(root.join("gone"), root.join("dangling")).expect("symlink");

        let plain = list_directory(&root, None, false).expect("list");
        assert_eq!(plain.node.subdirs.len(), 1);
        assert_eq!(plain.node.rank_only.as_slice(), [root.join("link")]);
        assert_eq!(plain.node.files.len(), 1);

        let followed = list_directory(&root, None, true).expect("list");
        assert_eq!(followed.node.subdirs.len(), 2);
        assert!(followed.node.rank_only.is_empty());
        assert_eq!(followed.node.files.len(), 2);
        assert!(followed.errors.is_empty());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_non_utf8_directory_keeps_rank_slot() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = TempDir::new().expect("temp dir");
        let root = utf8(&dir);
        fs::create_dir(root.join("1")).expect("mkdir");
        fs::create_dir(dir.path().join(OsStr::from_bytes(b"2\xff"))).expect("mkdir");
        fs::create_dir(root.join("3")).expect("mkdir");

        let listing = list_directory(&root, None, false).expect("list");
        assert_eq!(listing.errors.len(), 1);
        assert!(matches!(listing.errors[0], RenameError::NonUtf8Path(_)));
        assert_eq!(listing.node.rank_only.len(), 1);
        assert_eq!(
            listing.node.rank_of(&root.join("3")),
            Some(dp_core::Rank::new(3))
        );
    }
}
