//! Configuration structures for the dirprefix tool.
//!
//! - [`RenameConfig`] - Engine settings (root files, root rank, name limits)
//! - [`OutputConfig`] - How the CLI reports progress and the final summary
//! - [`Config`] - Root configuration combining both
//!
//! Configuration files are JSON. Every field has a default, so a file only
//! needs to name the values it changes:
//!
//! ```json
//! { "rename": { "include_root_files": true, "root_rank": "sibling_rank" } }
//! ```

use camino::Utf8Path;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Rank convention for files directly under the scan root.
///
/// The scan root has no siblings inside the walk, so its files have no
/// natural rank. This only applies when root files are included at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum RootRank {
    /// Use the reserved rank `0` (`0_file.txt`).
    #[default]
    Zero,
    /// Use the root's own rank among its parent's subdirectories.
    ///
    /// Falls back to rank `1` when the root has no parent.
    SiblingRank,
}

/// Summary output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

/// Settings for the rename engine.
///
/// # Examples
///
/// ```
/// use dp_core::{RenameConfig, RootRank};
///
/// let config = RenameConfig::default();
/// assert!(!config.include_root_files);
/// assert_eq!(config.root_rank, RootRank::Zero);
/// assert_eq!(config.max_name_len, 255);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenameConfig {
    /// Whether files directly under the scan root are renamed.
    pub include_root_files: bool,

    /// Rank convention for root-level files.
    pub root_rank: RootRank,

    /// Whether symbolic links are followed.
    ///
    /// When disabled, symlinks are neither renamed nor descended into.
    pub follow_links: bool,

    /// Longest file name, in bytes, the engine will attempt to create.
    pub max_name_len: usize,

    /// Marker embedded in temporary names used between rename phases.
    pub temp_marker: String,
}

impl Default for RenameConfig {
    fn default() -> Self {
        Self {
            include_root_files: false,
            root_rank: RootRank::Zero,
            follow_links: false,
            max_name_len: 255,
            temp_marker: "dp".to_owned(),
        }
    }
}

impl RenameConfig {
    /// Checks option values that serde cannot reject on its own.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_name_len == 0 {
            return Err(ConfigError::invalid_option(
                "max_name_len",
                "must be greater than zero",
            ));
        }

        if self.temp_marker.is_empty() {
            return Err(ConfigError::invalid_option(
                "temp_marker",
                "must not be empty",
            ));
        }

        if self
            .temp_marker
            .chars()
            .any(|c| std::path::is_separator(c) || c == '\0')
        {
            return Err(ConfigError::invalid_option(
                "temp_marker",
                "must not contain path separators",
            ));
        }

        Ok(())
    }
}

/// Settings for progress and summary reporting.
///
/// # Examples
///
/// ```
/// use dp_core::{OutputConfig, OutputFormat};
///
/// let config = OutputConfig::default();
/// assert_eq!(config.format, OutputFormat::Text);
/// assert!(config.show_progress);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Summary format.
    pub format: OutputFormat,

    /// Whether per-directory and per-file progress lines are printed.
    pub show_progress: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            show_progress: true,
        }
    }
}

/// Root configuration for the dirprefix tool.
///
/// # Examples
///
/// ```
/// use dp_core::Config;
///
/// let config: Config = serde_json::from_str(r#"{"rename": {"include_root_files": true}}"#)?;
/// assert!(config.rename.include_root_files);
/// assert_eq!(config.rename.max_name_len, 255);
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Engine settings.
    pub rename: RenameConfig,

    /// Reporting settings.
    pub output: OutputConfig,
}

impl Config {
    /// Loads and validates a JSON configuration file.
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;

        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validates every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rename.validate()
    }
}
