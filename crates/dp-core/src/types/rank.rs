//! Sibling rank of a directory.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The 1-based position of a directory among its parent's immediate
/// subdirectories under natural ordering.
///
/// A rank is only meaningful within one parent's children and is
/// recomputed for every run. The reserved value [`Rank::ROOT_ZERO`] exists
/// for files directly under the scan root, which has no siblings of its own
/// in the walk.
///
/// # Examples
///
/// ```
/// use dp_core::Rank;
///
/// let rank = Rank::from_index(2);
/// assert_eq!(rank.get(), 3);
/// assert_eq!(rank.prefix("file.txt"), "3_file.txt");
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Rank(u32);

impl Rank {
    /// Reserved rank used for root-level files.
    pub const ROOT_ZERO: Self = Self(0);

    /// The first rank in any sibling list.
    pub const FIRST: Self = Self(1);

    /// Creates a rank from a raw value.
    #[inline]
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Creates a rank from a 0-based index into a sorted sibling list.
    ///
    /// Saturates at `u32::MAX`.
    #[inline]
    #[must_use]
    pub fn from_index(index: usize) -> Self {
        Self(u32::try_from(index).map_or(u32::MAX, |i| i.saturating_add(1)))
    }

    /// Returns the raw rank value.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Builds the prefixed name `"<rank>_<name>"`.
    ///
    /// Existing numeric prefixes on `name` are kept, so applying the same
    /// rank twice stacks prefixes (`1_1_file.txt`).
    ///
    /// ```
    /// use dp_core::Rank;
    ///
    /// let once = Rank::FIRST.prefix("file.txt");
    /// assert_eq!(Rank::FIRST.prefix(&once), "1_1_file.txt");
    /// ```
    #[must_use]
    pub fn prefix(self, name: &str) -> String {
        format!("{}_{name}", self.0)
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_index_is_one_based() {
        assert_eq!(Rank::from_index(0), Rank::FIRST);
        assert_eq!(Rank::from_index(9).get(), 10);
    }

    #[test]
    fn test_from_index_saturates() {
        assert_eq!(Rank::from_index(usize::MAX).get(), u32::MAX);
    }

    #[test]
    fn test_prefix_stacks() {
        let rank = Rank::new(3);
        assert_eq!(rank.prefix("2_scan.pdf"), "3_2_scan.pdf");
        assert_eq!(Rank::ROOT_ZERO.prefix("a.txt"), "0_a.txt");
    }

    #[test]
    fn test_serializes_as_number() {
        let json = serde_json::to_string(&Rank::new(7)).expect("serialize rank");
        assert_eq!(json, "7");
    }
}
