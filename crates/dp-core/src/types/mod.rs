//! Domain types for the dirprefix tool.
//!
//! # Module Organization
//!
//! - `rank` - A directory's position among its siblings
//! - `node` - A single directory listing taken from the live filesystem
//! - `plan` - One planned file rename
//!
//! All public types are re-exported here and at the crate root:
//!
//! ```
//! use dp_core::{DirectoryNode, Rank, RenamePlanEntry};
//! ```

mod node;
mod plan;
mod rank;

pub use node::DirectoryNode;
pub use plan::RenamePlanEntry;
pub use rank::Rank;
