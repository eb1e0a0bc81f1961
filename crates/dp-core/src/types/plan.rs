//! Planned renames.

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::types::Rank;

/// A single planned rename: a file and the name it will receive.
///
/// The new name is always `"<rank>_<current name>"`. No attempt is made to
/// detect a prefix left by an earlier run.
///
/// # Examples
///
/// ```
/// use dp_core::{Rank, RenamePlanEntry};
/// use camino::Utf8PathBuf;
///
/// let entry = RenamePlanEntry::new(Utf8PathBuf::from("/scans/10/page.pdf"), Rank::new(3))
///     .expect("path has a file name");
///
/// assert_eq!(entry.current_name(), "page.pdf");
/// assert_eq!(entry.new_name, "3_page.pdf");
/// assert_eq!(entry.target().as_str(), "/scans/10/3_page.pdf");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenamePlanEntry {
    /// The file as it is named now.
    pub source: Utf8PathBuf,

    /// Rank of the directory containing the file.
    pub rank: Rank,

    /// The file's new base name.
    pub new_name: String,
}

impl RenamePlanEntry {
    /// Plans the rename of `source` using `rank`.
    ///
    /// Returns `None` if `source` has no final component.
    #[must_use]
    pub fn new(source: Utf8PathBuf, rank: Rank) -> Option<Self> {
        let new_name = rank.prefix(source.file_name()?);
        Some(Self {
            source,
            rank,
            new_name,
        })
    }

    /// Returns the file's current base name.
    #[must_use]
    pub fn current_name(&self) -> &str {
        self.source.file_name().unwrap_or_default()
    }

    /// Returns the directory containing the file.
    #[must_use]
    pub fn directory(&self) -> &Utf8Path {
        self.source.parent().unwrap_or_else(|| Utf8Path::new(""))
    }

    /// Returns the full path the file will have after the rename.
    #[must_use]
    pub fn target(&self) -> Utf8PathBuf {
        self.directory().join(&self.new_name)
    }
}
