//! Depth-first directory traversal with sibling ranks.
//!
//! [`DirectoryWalker`] is a lazy iterator: each call to `next` lists one
//! directory and pushes its subdirectories, already ranked, onto a stack.
//! Ranks come from the parent's naturally-sorted listing, so every child of a
//! parent is ranked from one read of that parent.
//!
//! Because listing is lazy, the caller can rename the files of one directory
//! before the walk lists the next, and can stop between any two directories.
//!
//! # Examples
//!
//! ```ignore
//! use dp_renamer::DirectoryWalker;
//! use camino::Utf8Path;
//!
//! for visited in DirectoryWalker::new(Utf8Path::new("/scans"), false) {
//!     let visited = visited?;
//!     println!("{} rank {:?}", visited.node.path, visited.rank);
//! }
//! ```

use camino::{Utf8Path, Utf8PathBuf};
use dp_core::{DirectoryNode, Rank};
use rustc_hash::FxHashSet;
use tracing::debug;

use crate::error::RenameError;
use crate::listing::list_directory;

/// A directory the walk has reached.
#[derive(Debug)]
pub struct VisitedDirectory {
    /// The directory's sorted listing.
    pub node: DirectoryNode,
    /// Rank among the parent's subdirectories. `None` for the scan root.
    pub rank: Option<Rank>,
    /// Entries inside the directory that could not be classified.
    pub entry_errors: Vec<RenameError>,
}

/// A directory waiting on the stack.
#[derive(Debug)]
struct PendingDir {
    path: Utf8PathBuf,
    parent: Option<Utf8PathBuf>,
    rank: Option<Rank>,
}

/// Lazy depth-first walk yielding directories in natural order.
///
/// Directories are yielded parent first, then each child subtree in
/// natural order. A directory that cannot be listed is yielded as an error
/// and its subtree is skipped; its siblings keep their ranks.
#[derive(Debug)]
pub struct DirectoryWalker {
    stack: Vec<PendingDir>,
    follow_links: bool,
    /// Canonical paths already walked, only tracked when following links.
    visited: FxHashSet<Utf8PathBuf>,
}

impl DirectoryWalker {
    /// Creates a walker rooted at `root`.
    #[must_use]
    pub fn new(root: &Utf8Path, follow_links: bool) -> Self {
        Self {
            stack: vec![PendingDir {
                path: root.to_owned(),
                parent: None,
                rank: None,
            }],
            follow_links,
            visited: FxHashSet::default(),
        }
    }

    /// Returns `true` if the directory was already walked through another
    /// link. Only meaningful when following links.
    fn seen_before(&mut self, path: &Utf8Path) -> bool {
        if !self.follow_links {
            return false;
        }
        match path.canonicalize_utf8() {
            Ok(canonical) => !self.visited.insert(canonical),
            Err(_) => false,
        }
    }
}

impl Iterator for DirectoryWalker {
    type Item = Result<VisitedDirectory, RenameError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let pending = self.stack.pop()?;

            if self.seen_before(&pending.path) {
                debug!(path = %pending.path, "Directory already walked via a link, skipping");
                continue;
            }

            let listing =
                match list_directory(&pending.path, pending.parent.as_deref(), self.follow_links) {
                    Ok(listing) => listing,
                    Err(e) => return Some(Err(e)),
                };

            // Reverse so the lowest rank is popped first.
            for (child, rank) in listing.node.ranked_subdirs().rev() {
                self.stack.push(PendingDir {
                    path: child.to_owned(),
                    parent: Some(pending.path.clone()),
                    rank: Some(rank),
                });
            }

            return Some(Ok(VisitedDirectory {
                node: listing.node,
                rank: pending.rank,
                entry_errors: listing.errors,
            }));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn tree(dirs: &[&str]) -> (TempDir, Utf8PathBuf) {
        let dir = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf8");
        for d in dirs {
            fs::create_dir_all(root.join(d)).expect("mkdir");
        }
        (dir, root)
    }

    fn relative(root: &Utf8Path, path: &Utf8Path) -> String {
        path.strip_prefix(root)
            .map(|p| p.as_str().to_owned())
            .unwrap_or_default()
    }

    #[test]
    fn test_depth_first_natural_order_with_ranks() {
        let (_dir, root) = tree(&["10/sub2", "10/sub10", "2", "1/sub1"]);

        let visited: Vec<(String, Option<u32>)> = DirectoryWalker::new(&root, false)
            .map(|v| v.expect("listing"))
            .map(|v| (relative(&root, &v.node.path), v.rank.map(Rank::get)))
            .collect();

        assert_eq!(
            visited,
            vec![
                (String::new(), None),
                ("1".to_owned(), Some(1)),
                ("1/sub1".to_owned(), Some(1)),
                ("2".to_owned(), Some(2)),
                ("10".to_owned(), Some(3)),
                ("10/sub2".to_owned(), Some(1)),
                ("10/sub10".to_owned(), Some(2)),
            ]
        );
    }

    #[test]
    fn test_parent_recorded_on_children() {
        let (_dir, root) = tree(&["a"]);
        let nodes: Vec<VisitedDirectory> = DirectoryWalker::new(&root, false)
            .map(|v| v.expect("listing"))
            .collect();
        assert!(nodes[0].node.is_root());
        assert_eq!(nodes[1].node.parent.as_deref(), Some(root.as_path()));
    }

    #[cfg(unix)]
    #[test]
    fn test_link_cycles_are_walked_once() {
        let (_dir, root) = tree(&["a"]);
        std::os::unix::fs::symlink(&root, root.join("a").join("back")).expect("symlink");

        let count = DirectoryWalker::new(&root, true)
            .filter_map(Result::ok)
            .count();
        assert_eq!(count, 2);
    }
}
