//! Build automation tasks for the dirprefix workspace.
//!
//! Run with: `cargo xt <command>`
//!
//! # Available Commands
//!
//! - `check`: Run all checks (fmt, clippy, test)
//! - `fmt`: Format code with rustfmt
//! - `lint`: Run clippy with all targets
//! - `test`: Run all tests
//! - `build`: Build release binary
//! - `clean`: Clean build artifacts
//! - `doc`: Generate documentation
//! - `fixture`: Create the manual test tree

// xtask is a build tool - printing to stderr is expected
#![allow(clippy::print_stderr)]

use std::fs;
use std::process::Command;

use anyhow::{Context, Result, bail};
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};

/// Top-level directories of the fixture, deliberately mixing numeric,
/// alphabetic, and mixed-case names.
const FIXTURE_TOP: &[&str] = &["1", "2", "10", "A", "B2", "B10", "b1"];

/// Subdirectories created inside every top-level fixture directory.
const FIXTURE_SUB: &[&str] = &["sub1", "sub10", "sub2"];

/// Files placed in every fixture directory, including the root.
const FIXTURE_FILES: &[&str] = &["file.txt", "readme.md", "log10.log"];

/// Build automation for dirprefix
#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Build automation tasks for dirprefix")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all checks (fmt --check, clippy, test)
    Check,
    /// Format code with rustfmt
    Fmt {
        /// Check formatting without modifying files
        #[arg(long)]
        check: bool,
    },
    /// Run clippy lints
    Lint {
        /// Automatically fix lint warnings
        #[arg(long)]
        fix: bool,
    },
    /// Run all tests
    Test {
        /// Run tests with release optimizations
        #[arg(long)]
        release: bool,
    },
    /// Build release binary
    Build {
        /// Build in debug mode
        #[arg(long)]
        debug: bool,
    },
    /// Clean build artifacts
    Clean,
    /// Generate documentation
    Doc {
        /// Open in browser after building
        #[arg(long)]
        open: bool,
    },
    /// Create a sample tree for trying the renamer by hand
    Fixture {
        /// Directory to create the tree in
        #[arg(long, default_value = "test_root")]
        target: Utf8PathBuf,
        /// Replace the target if it already exists
        #[arg(long)]
        force: bool,
    },
}

/// Runs `cargo` with `args`, failing if it exits unsuccessfully.
fn cargo(args: &[&str]) -> Result<()> {
    let cargo = std::env::var("CARGO").unwrap_or_else(|_| "cargo".to_owned());
    eprintln!("$ cargo {}", args.join(" "));

    let status = Command::new(&cargo)
        .args(args)
        .status()
        .with_context(|| format!("failed to launch {cargo}"))?;

    if !status.success() {
        bail!("cargo {} failed with {status}", args.join(" "));
    }
    Ok(())
}

fn fmt(check: bool) -> Result<()> {
    if check {
        cargo(&["fmt", "--all", "--", "--check"])
    } else {
        cargo(&["fmt", "--all"])
    }
}

fn lint(fix: bool) -> Result<()> {
    if fix {
        cargo(&[
            "clippy",
            "--workspace",
            "--all-targets",
            "--fix",
            "--allow-dirty",
        ])
    } else {
        cargo(&[
            "clippy",
            "--workspace",
            "--all-targets",
            "--",
            "-D",
            "warnings",
        ])
    }
}

fn test(release: bool) -> Result<()> {
    if release {
        cargo(&["test", "--workspace", "--release"])
    } else {
        cargo(&["test", "--workspace"])
    }
}

/// Builds the fixture tree under `target`.
///
/// Every directory, the root included, receives the same three files so
/// root-file handling can be observed as well.
fn fixture(target: &Utf8Path, force: bool) -> Result<()> {
    if target.exists() {
        if !force {
            bail!("{target} already exists; pass --force to replace it");
        }
        fs::remove_dir_all(target).with_context(|| format!("failed to remove {target}"))?;
    }

    let mut dirs = vec![target.to_owned()];
    for top in FIXTURE_TOP {
        let top_dir = target.join(top);
        dirs.push(top_dir.clone());
        dirs.extend(FIXTURE_SUB.iter().map(|sub| top_dir.join(sub)));
    }

    for dir in &dirs {
        fs::create_dir_all(dir).with_context(|| format!("failed to create {dir}"))?;
        for name in FIXTURE_FILES {
            let path = dir.join(name);
            fs::write(&path, format!("{path}\n"))
                .with_context(|| format!("failed to write {path}"))?;
        }
    }

    eprintln!(
        "Created {} directories and {} files under {target}",
        dirs.len(),
        dirs.len() * FIXTURE_FILES.len()
    );
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check => {
            fmt(true)?;
            lint(false)?;
            test(false)
        }
        Commands::Fmt { check } => fmt(check),
        Commands::Lint { fix } => lint(fix),
        Commands::Test { release } => test(release),
        Commands::Build { debug } => {
            if debug {
                cargo(&["build", "-p", "dp-cli"])
            } else {
                cargo(&["build", "-p", "dp-cli", "--release"])
            }
        }
        Commands::Clean => cargo(&["clean"]),
        Commands::Doc { open } => {
            if open {
                cargo(&["doc", "--workspace", "--no-deps", "--open"])
            } else {
                cargo(&["doc", "--workspace", "--no-deps"])
            }
        }
        Commands::Fixture { target, force } => fixture(&target, force),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn utf8(dir: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf8 temp dir")
    }

    #[test]
    fn test_fixture_layout() {
        let dir = TempDir::new().expect("temp dir");
        let target = utf8(&dir).join("tree");

        fixture(&target, false).expect("fixture");

        assert!(target.join("file.txt").is_file());
        assert!(target.join("B10/sub10/log10.log").is_file());
        assert!(target.join("b1/sub2/readme.md").is_file());
        let top = fs::read_dir(&target).expect("read").count();
        assert_eq!(top, FIXTURE_TOP.len() + FIXTURE_FILES.len());
    }

    #[test]
    fn test_fixture_refuses_to_overwrite() {
        let dir = TempDir::new().expect("temp dir");
        let target = utf8(&dir);

        assert!(fixture(&target, false).is_err());
        fixture(&target, true).expect("forced fixture");
        assert!(target.join("A/sub1/file.txt").is_file());
    }
}
