//! CLI entry point for dirprefix.
//!
//! Prefixes every file in a directory tree with the natural-order rank of
//! its parent directory among that directory's siblings.
//!
//! # Usage
//!
//! ```bash
//! dirprefix [OPTIONS] <COMMAND>
//!
//! # Show what would be renamed
//! dirprefix plan --path /scans
//!
//! # Rename, including files directly under the root
//! dirprefix run --path /scans --include-root-files
//!
//! # Machine-readable summary
//! dirprefix run --path /scans --format json > summary.json
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::eyre;
use dp_core::{Config, OutputConfig, OutputFormat, RenamePlanEntry, RootRank};
use dp_renamer::{
    ErrorRecord, PlanResult, RenameEvent, RunConfig, RunSummary, StatsSnapshot, TreeRenamer,
};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Capacity of the progress channel between the worker and the printer.
const EVENT_BUFFER: usize = 256;

// =============================================================================
// CLI ARGUMENT TYPES
// =============================================================================

/// Prefix files with the natural-order rank of their parent directory.
///
/// Files in `1/`, `2/`, `10/` become `1_name`, `2_name`, `3_name`.
/// Directories are never renamed.
#[derive(Parser)]
#[command(name = "dirprefix", version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    command: Commands,

    /// Root directory of the tree.
    #[arg(short, long, global = true, env = "DIRPREFIX_PATH")]
    path: Option<Utf8PathBuf>,

    /// JSON settings file. Flags override its values.
    #[arg(short, long, global = true, env = "DIRPREFIX_CONFIG")]
    config: Option<Utf8PathBuf>,

    /// Also rename files directly under the root.
    #[arg(long, global = true)]
    include_root_files: bool,

    /// Rank used for root-level files.
    #[arg(long, global = true, value_enum)]
    root_rank: Option<RootRankArg>,

    /// Output format.
    #[arg(short, long, global = true, value_enum)]
    format: Option<FormatArg>,

    /// Only print the final summary.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Enable verbose logging (debug level).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Commands {
    /// Rename every file in the tree.
    Run,

    /// Print the renames a run would perform without touching anything.
    Plan,
}

/// Root-level rank convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum RootRankArg {
    /// Prefix root files with `0_`.
    Zero,
    /// Prefix root files with the root's rank among its own siblings.
    Sibling,
}

impl From<RootRankArg> for RootRank {
    fn from(arg: RootRankArg) -> Self {
        match arg {
            RootRankArg::Zero => Self::Zero,
            RootRankArg::Sibling => Self::SiblingRank,
        }
    }
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    /// Human-readable progress and summary.
    Text,
    /// JSON summary on stdout.
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => Self::Text,
            FormatArg::Json => Self::Json,
        }
    }
}

// =============================================================================
// INITIALIZATION FUNCTIONS
// =============================================================================

/// Initializes the tracing subscriber for logging.
///
/// Respects `RUST_LOG` if set. Otherwise logs at `warn`, or `debug` with
/// `--verbose`. Logs go to stderr so stdout carries only program output.
fn init_tracing(verbose: bool, no_color: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "debug" } else { "warn" })
    });

    let use_ansi = !no_color && std::env::var("NO_COLOR").is_err();

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_ansi(use_ansi)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

/// Loads the settings file, if any, and applies flag overrides.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or the merged
/// settings are invalid.
fn build_config(cli: &Cli) -> color_eyre::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    if cli.include_root_files {
        config.rename.include_root_files = true;
    }
    if let Some(rank) = cli.root_rank {
        config.rename.root_rank = rank.into();
    }
    if let Some(format) = cli.format {
        config.output.format = format.into();
    }
    if cli.quiet {
        config.output.show_progress = false;
    }

    config.validate()?;
    Ok(config)
}

/// Returns the root given by `--path` or `DIRPREFIX_PATH`.
fn resolve_root(cli: &Cli) -> color_eyre::Result<Utf8PathBuf> {
    cli.path
        .clone()
        .ok_or_else(|| eyre!("No root directory given; pass --path or set DIRPREFIX_PATH"))
}

// =============================================================================
// COMMAND IMPLEMENTATIONS
// =============================================================================

/// Runs the renamer on a blocking thread while printing its progress.
///
/// Ctrl-C sets the stop signal; the worker finishes the file in flight and
/// reports a cancelled summary.
///
/// # Errors
///
/// Returns an error if the worker panics or output cannot be written.
async fn run_rename(renamer: TreeRenamer, output: &OutputConfig) -> color_eyre::Result<()> {
    let json = matches!(output.format, OutputFormat::Json);
    let show_progress = output.show_progress && !json;
    info!(root = %renamer.config().root, "Starting run");

    let (tx, mut rx) = mpsc::channel(EVENT_BUFFER);
    let token = renamer.cancel_token();
    let worker = renamer.clone();
    let handle = tokio::task::spawn_blocking(move || worker.run_streaming(tx));

    let mut summary = None;
    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Some(RenameEvent::Complete(done)) => summary = Some(done),
                Some(event) => {
                    if show_progress {
                        if let Some(line) = render_event(&event) {
                            let _ = writeln!(std::io::stdout().lock(), "{line}");
                        }
                    }
                }
                None => break,
            },
            result = tokio::signal::ctrl_c(), if !token.is_cancelled() => {
                result?;
                warn!("Interrupt received, stopping after the current file");
                token.cancel();
            }
        }
    }

    handle.await?;
    let summary = summary.ok_or_else(|| eyre!("Rename worker ended without a summary"))?;

    if json {
        write_stdout(&render_summary_json(&summary)?)?;
    } else {
        if show_progress {
            write_stdout("\n")?;
        }
        write_stdout(&render_summary(&summary))?;
    }
    print_errors(&summary.error_records());

    Ok(())
}

/// Prints the plan without touching the tree.
///
/// # Errors
///
/// Returns an error if output cannot be written.
fn run_plan(renamer: &TreeRenamer, output: &OutputConfig) -> color_eyre::Result<()> {
    let plan = renamer.plan();

    if matches!(output.format, OutputFormat::Json) {
        write_stdout(&render_plan_json(&plan)?)?;
    } else {
        write_stdout(&render_plan(&plan))?;
    }

    let errors: Vec<ErrorRecord> = plan
        .errors
        .iter()
        .map(|(path, error)| ErrorRecord::new(path.clone(), error))
        .collect();
    print_errors(&errors);

    Ok(())
}

// =============================================================================
// OUTPUT HELPERS
// =============================================================================

fn write_stdout(content: &str) -> std::io::Result<()> {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    write!(handle, "{content}")?;
    handle.flush()
}

/// Prints recorded errors to stderr.
fn print_errors(errors: &[ErrorRecord]) {
    if errors.is_empty() {
        return;
    }

    let stderr = std::io::stderr();
    let mut handle = stderr.lock();
    let _ = writeln!(handle);
    let _ = writeln!(handle, "Errors ({}):", errors.len());
    for record in errors {
        let _ = writeln!(handle, "  ERROR: {}", record.message);
    }
}

/// One progress line for an event, or `None` for events not shown live.
fn render_event(event: &RenameEvent) -> Option<String> {
    match event {
        RenameEvent::DirectoryEntered {
            path,
            rank: Some(rank),
        } => Some(format!("Processing {path} (index among siblings: {rank})")),
        RenameEvent::DirectoryEntered { path, rank: None } => {
            Some(format!("Scanning {path} (root files left as they are)"))
        }
        RenameEvent::FileRenamed {
            old_name, new_name, ..
        } => Some(format!("RENAMED: {old_name} -> {new_name}")),
        RenameEvent::Cancelled => Some("Stopped by request; completed renames are kept".to_owned()),
        RenameEvent::Error { .. } | RenameEvent::Complete(_) => None,
    }
}

/// Text summary of a finished run.
fn render_summary(summary: &RunSummary) -> String {
    use std::fmt::Write;

    let mut out = String::new();
    let renamed = summary.files_renamed();
    let secs = summary.elapsed.as_secs_f64();

    if summary.cancelled {
        let _ = writeln!(out, "CANCELLED: Renamed {renamed} files in {secs:.2}s");
    } else if summary.errors.is_empty() {
        let _ = writeln!(out, "SUCCESS: Renamed {renamed} files in {secs:.2}s");
    } else {
        let _ = writeln!(
            out,
            "DONE WITH ERRORS: Renamed {renamed} files in {secs:.2}s, {} errors",
            summary.error_count()
        );
    }
    let _ = writeln!(out, "Directories visited: {}", summary.directories_visited());

    let stranded = summary.stranded().count();
    if stranded > 0 {
        let _ = writeln!(
            out,
            "WARNING: {stranded} files were left at temporary names and need renaming by hand"
        );
    }

    out
}

/// JSON summary of a finished run.
fn render_summary_json(summary: &RunSummary) -> color_eyre::Result<String> {
    #[derive(Serialize)]
    struct Report<'a> {
        root: &'a Utf8Path,
        stats: &'a StatsSnapshot,
        cancelled: bool,
        elapsed_secs: f64,
        errors: Vec<ErrorRecord>,
    }

    let report = Report {
        root: &summary.root,
        stats: &summary.stats,
        cancelled: summary.cancelled,
        elapsed_secs: summary.elapsed.as_secs_f64(),
        errors: summary.error_records(),
    };
    let mut json = serde_json::to_string_pretty(&report)
        .map_err(|e| eyre!("Failed to serialize JSON: {}", e))?;
    json.push('\n');
    Ok(json)
}

/// Plan as `relative/path -> new_name` lines.
fn render_plan(plan: &PlanResult) -> String {
    use std::fmt::Write;

    let mut out = String::new();
    for entry in &plan.entries {
        let relative = entry
            .source
            .strip_prefix(&plan.root)
            .unwrap_or(entry.source.as_path());
        let _ = writeln!(out, "{relative} -> {}", entry.new_name);
    }
    let _ = writeln!(out, "{} files would be renamed", plan.entries.len());
    out
}

/// JSON form of the plan.
fn render_plan_json(plan: &PlanResult) -> color_eyre::Result<String> {
    #[derive(Serialize)]
    struct Report<'a> {
        root: &'a Utf8Path,
        entries: &'a [RenamePlanEntry],
        errors: Vec<ErrorRecord>,
    }

    let report = Report {
        root: &plan.root,
        entries: &plan.entries,
        errors: plan
            .errors
            .iter()
            .map(|(path, error)| ErrorRecord::new(path.clone(), error))
            .collect(),
    };
    let mut json = serde_json::to_string_pretty(&report)
        .map_err(|e| eyre!("Failed to serialize JSON: {}", e))?;
    json.push('\n');
    Ok(json)
}

// =============================================================================
// MAIN ENTRY POINT
// =============================================================================

/// Application entry point.
#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    // 1. Install color-eyre FIRST (before any potential panics)
    color_eyre::install()?;

    // 2. Parse CLI arguments
    let cli = Cli::parse();

    // 3. Initialize tracing (handles --no-color for log output)
    init_tracing(cli.verbose, cli.no_color);

    // 4. Merge settings file and flags, then validate the root
    let config = build_config(&cli)?;
    let root = resolve_root(&cli)?;
    let renamer = TreeRenamer::new(RunConfig::from_settings(&root, &config.rename))?;

    // 5. Route to appropriate command
    match cli.command {
        Commands::Run => run_rename(renamer, &config.output).await,
        Commands::Plan => run_plan(&renamer, &config.output),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use dp_core::Rank;
    use dp_renamer::RenameError;
    use std::time::Duration;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args.iter().copied()).expect("valid arguments")
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_with_flags() {
        let cli = parse(&[
            "dirprefix",
            "run",
            "--path",
            "/scans",
            "--include-root-files",
            "--root-rank",
            "sibling",
            "--format",
            "json",
        ]);
        assert_eq!(cli.command, Commands::Run);
        assert_eq!(cli.path.as_deref(), Some(Utf8Path::new("/scans")));
        assert!(cli.include_root_files);
        assert_eq!(cli.root_rank, Some(RootRankArg::Sibling));
        assert_eq!(cli.format, Some(FormatArg::Json));
    }

    #[test]
    fn test_parse_rejects_unknown_root_rank() {
        let result = Cli::try_parse_from(["dirprefix", "plan", "--root-rank", "first"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = parse(&[
            "dirprefix",
            "plan",
            "--include-root-files",
            "--root-rank",
            "sibling",
            "--quiet",
        ]);
        let config = build_config(&cli).expect("config");
        assert!(config.rename.include_root_files);
        assert_eq!(config.rename.root_rank, RootRank::SiblingRank);
        assert!(!config.output.show_progress);
        assert_eq!(config.output.format, OutputFormat::Text);
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let cli = parse(&["dirprefix", "run", "--config", "/nonexistent/dirprefix.json"]);
        assert!(build_config(&cli).is_err());
    }

    #[test]
    fn test_render_plan() {
        let root = Utf8PathBuf::from("/scans");
        let entries = [("1/a.txt", 1), ("2/b.txt", 2), ("10/sub2/c.txt", 1)]
            .into_iter()
            .filter_map(|(path, rank)| RenamePlanEntry::new(root.join(path), Rank::new(rank)))
            .collect();
        let plan = PlanResult {
            root,
            entries,
            errors: Vec::new(),
        };

        insta::assert_snapshot!(render_plan(&plan), @r"
        1/a.txt -> 1_a.txt
        2/b.txt -> 2_b.txt
        10/sub2/c.txt -> 1_c.txt
        3 files would be renamed
        ");
    }

    #[test]
    fn test_render_summary_with_errors() {
        let summary = RunSummary {
            root: Utf8PathBuf::from("/scans"),
            stats: StatsSnapshot {
                files_renamed: 4,
                directories_visited: 3,
                errors: 1,
            },
            errors: vec![(
                Utf8PathBuf::from("/scans/1/a.txt"),
                RenameError::NameCollision {
                    path: Utf8PathBuf::from("/scans/1/a.txt"),
                    target: Utf8PathBuf::from("/scans/1/1_a.txt"),
                },
            )],
            cancelled: false,
            elapsed: Duration::from_millis(1250),
        };

        insta::assert_snapshot!(render_summary(&summary), @r"
        DONE WITH ERRORS: Renamed 4 files in 1.25s, 1 errors
        Directories visited: 3
        ");
    }

    #[test]
    fn test_render_summary_json_fields() {
        let summary = RunSummary {
            root: Utf8PathBuf::from("/scans"),
            stats: StatsSnapshot::default(),
            errors: Vec::new(),
            cancelled: true,
            elapsed: Duration::ZERO,
        };
        let json: serde_json::Value =
            serde_json::from_str(&render_summary_json(&summary).expect("json")).expect("parse");
        assert_eq!(json["root"], "/scans");
        assert_eq!(json["cancelled"], true);
        assert_eq!(json["stats"]["files_renamed"], 0);
        assert!(json["errors"].as_array().is_some_and(Vec::is_empty));
    }

    #[test]
    fn test_render_event_lines() {
        let entered = RenameEvent::DirectoryEntered {
            path: Utf8PathBuf::from("/scans/10"),
            rank: Some(Rank::new(3)),
        };
        assert_eq!(
            render_event(&entered).as_deref(),
            Some("Processing /scans/10 (index among siblings: 3)")
        );

        let renamed = RenameEvent::FileRenamed {
            directory: Utf8PathBuf::from("/scans/10"),
            old_name: "file.txt".to_owned(),
            new_name: "3_file.txt".to_owned(),
            rank: Rank::new(3),
        };
        assert_eq!(
            render_event(&renamed).as_deref(),
            Some("RENAMED: file.txt -> 3_file.txt")
        );
    }
}
