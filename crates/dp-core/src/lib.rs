//! Core types, ordering, and configuration for the dirprefix tool.
//!
//! This crate provides the foundational pieces used across the workspace:
//!
//! - [`natural`] - Natural (human) string ordering, so `2` sorts before `10`
//! - Domain types ([`Rank`], [`DirectoryNode`], [`RenamePlanEntry`])
//! - Configuration structures ([`Config`], [`RenameConfig`], [`OutputConfig`])
//! - [`ConfigError`] for configuration loading and validation failures
//!
//! The crate performs no filesystem mutation. Walking and renaming live in
//! `dp-renamer`.

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod natural;
pub mod types;

pub use config::{Config, OutputConfig, OutputFormat, RenameConfig, RootRank};
pub use error::ConfigError;
pub use natural::{NaturalKey, natural_cmp, path_cmp, sort_names, sort_paths};
pub use types::{DirectoryNode, Rank, RenamePlanEntry};
