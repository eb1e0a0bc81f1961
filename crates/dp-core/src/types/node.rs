//! Directory listings.

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::natural::{path_cmp, sort_paths};
use crate::types::Rank;

/// Inline capacity for per-directory child lists.
///
/// Most archive folders hold a handful of entries, so small listings stay
/// on the stack.
const INLINE_CHILDREN: usize = 8;

/// A directory as seen by one walk of the live filesystem.
///
/// Nodes are never persisted. Each one is built when the walk reaches the
/// directory and dropped once its files have been handled.
///
/// # Examples
///
/// ```
/// use dp_core::{DirectoryNode, Rank};
/// use camino::{Utf8Path, Utf8PathBuf};
///
/// let mut node = DirectoryNode::new(Utf8PathBuf::from("/scans"), None);
/// node.subdirs.push(Utf8PathBuf::from("/scans/10"));
/// node.subdirs.push(Utf8PathBuf::from("/scans/2"));
/// node.sort_natural();
///
/// assert_eq!(node.rank_of(Utf8Path::new("/scans/2")), Some(Rank::new(1)));
/// assert_eq!(node.rank_of(Utf8Path::new("/scans/10")), Some(Rank::new(2)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryNode {
    /// Path of this directory.
    pub path: Utf8PathBuf,

    /// Parent directory, absent for the scan root.
    pub parent: Option<Utf8PathBuf>,

    /// Immediate subdirectories the walk descends into.
    pub subdirs: SmallVec<[Utf8PathBuf; INLINE_CHILDREN]>,

    /// Immediate subdirectories that hold a rank slot but are not walked:
    /// links to directories when links are not followed, and directories
    /// whose names are not valid UTF-8 (stored lossily).
    #[serde(default)]
    pub rank_only: SmallVec<[Utf8PathBuf; 2]>,

    /// Immediate files.
    pub files: SmallVec<[Utf8PathBuf; INLINE_CHILDREN]>,
}

impl DirectoryNode {
    /// Creates an empty node for `path`.
    #[must_use]
    pub fn new(path: Utf8PathBuf, parent: Option<Utf8PathBuf>) -> Self {
        Self {
            path,
            parent,
            subdirs: SmallVec::new(),
            rank_only: SmallVec::new(),
            files: SmallVec::new(),
        }
    }

    /// Returns `true` if this node is the scan root.
    #[inline]
    #[must_use]
    pub const fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Returns the directory's own name, if it has one.
    #[inline]
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.path.file_name()
    }

    /// Sorts subdirectories and files by name in natural order.
    pub fn sort_natural(&mut self) {
        sort_paths(&mut self.subdirs);
        sort_paths(&mut self.rank_only);
        sort_paths(&mut self.files);
    }

    /// Returns the rank of `child` among all of this node's subdirectories,
    /// including rank-only ones.
    ///
    /// Returns `None` if `child` is not an immediate subdirectory.
    #[must_use]
    pub fn rank_of(&self, child: &Utf8Path) -> Option<Rank> {
        self.siblings()
            .iter()
            .position(|(dir, _)| *dir == child)
            .map(Rank::from_index)
    }

    /// Iterates the walkable subdirectories paired with their ranks.
    ///
    /// Ranks count every subdirectory, so a rank-only sibling still moves
    /// the ones after it.
    pub fn ranked_subdirs(&self) -> impl DoubleEndedIterator<Item = (&Utf8Path, Rank)> + '_ {
        self.siblings()
            .into_iter()
            .enumerate()
            .filter(|(_, (_, walkable))| *walkable)
            .map(|(index, (dir, _))| (dir, Rank::from_index(index)))
    }

    /// All subdirectories in natural order, flagged `true` when walkable.
    fn siblings(&self) -> Vec<(&Utf8Path, bool)> {
        let mut all: Vec<(&Utf8Path, bool)> = self
            .subdirs
            .iter()
            .map(|dir| (dir.as_path(), true))
            .chain(self.rank_only.iter().map(|dir| (dir.as_path(), false)))
            .collect();
        all.sort_by(|a, b| path_cmp(a.0, b.0));
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node_with(subdirs: &[&str], files: &[&str]) -> DirectoryNode {
        let mut node = DirectoryNode::new(Utf8PathBuf::from("/root"), None);
        node.subdirs
            .extend(subdirs.iter().map(|d| Utf8PathBuf::from(format!("/root/{d}"))));
        node.files
            .extend(files.iter().map(|f| Utf8PathBuf::from(format!("/root/{f}"))));
        node.sort_natural();
        node
    }

    #[test]
    fn test_rank_follows_natural_order() {
        let node = node_with(&["10", "A", "2", "1", "B10", "B2", "b1"], &[]);
        let ranks: Vec<(String, u32)> = node
            .ranked_subdirs()
            .map(|(dir, rank)| (dir.file_name().unwrap_or_default().to_owned(), rank.get()))
            .collect();

        assert_eq!(
            ranks,
            vec![
                ("1".to_owned(), 1),
                ("2".to_owned(), 2),
                ("10".to_owned(), 3),
                ("A".to_owned(), 4),
                ("B2".to_owned(), 5),
                ("B10".to_owned(), 6),
                ("b1".to_owned(), 7),
            ]
        );
    }

    #[test]
    fn test_rank_only_siblings_hold_their_slot() {
        let mut node = node_with(&["10", "1"], &[]);
        node.rank_only.push(Utf8PathBuf::from("/root/2"));
        node.sort_natural();

        let ranks: Vec<(&str, u32)> = node
            .ranked_subdirs()
            .map(|(dir, rank)| (dir.as_str(), rank.get()))
            .collect();
        assert_eq!(ranks, [("/root/1", 1), ("/root/10", 3)]);
        assert_eq!(node.rank_of(Utf8Path::new("/root/2")), Some(Rank::new(2)));
    }

    #[test]
    fn test_rank_of_unknown_child() {
        let node = node_with(&["1"], &[]);
        assert_eq!(node.rank_of(Utf8Path::new("/root/1")), Some(Rank::FIRST));
        assert_eq!(node.rank_of(Utf8Path::new("/elsewhere/1")), None);
    }

    #[test]
    fn test_files_sorted_naturally() {
        let node = node_with(&[], &["log10.log", "file.txt", "log2.log"]);
        let names: Vec<&str> = node.files.iter().filter_map(|f| f.file_name()).collect();
        assert_eq!(names, ["file.txt", "log2.log", "log10.log"]);
    }

    #[test]
    fn test_is_root() {
        let root = DirectoryNode::new(Utf8PathBuf::from("/root"), None);
        let child = DirectoryNode::new(
            Utf8PathBuf::from("/root/1"),
            Some(Utf8PathBuf::from("/root")),
        );
        assert!(root.is_root());
        assert!(!child.is_root());
        assert_eq!(child.name(), Some("1"));
    }
}
