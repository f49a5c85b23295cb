//! Command-line interface definitions.
//!
//! All arguments, subcommands, and options use the clap derive API, with
//! global options (verbosity, color, config path) and one subcommand per
//! operation. Flags only override the configuration file in one direction;
//! durable preferences belong in the file.
//!
//! # Example
//!
//! ```bash
//! # List documents sharing a title
//! notedupe docs
//!
//! # Merge three copies into one
//! notedupe merge 20240101-target 20240102-copy 20240103-copy
//!
//! # Find duplicate files by content hash, ignoring small files
//! notedupe files my-notebook /assets --by hash --min-size 4KB
//!
//! # Remove duplicate files, keeping the newest copy, without asking
//! notedupe clean my-notebook / --keep newest --yes
//! ```

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::dedupe::{ComparisonMode, RetentionPolicy};

/// Duplicate finder and cleaner for a note server.
///
/// notedupe talks to the note server's kernel API to find documents with
/// the same title, empty documents, and duplicate files, and can merge or
/// delete them safely.
#[derive(Debug, Parser)]
#[command(name = "notedupe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Report failures as structured JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Path to the configuration file
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Write a starter configuration file
    Init(InitArgs),
    /// List documents that share a title
    Docs(DocsArgs),
    /// Merge duplicate documents into one
    Merge(MergeArgs),
    /// List empty documents
    Empty(EmptyArgs),
    /// Delete empty documents
    DeleteEmpty(DeleteEmptyArgs),
    /// Find duplicate files under a folder
    Files(FilesArgs),
    /// Delete duplicate files, keeping one copy per group
    Clean(CleanArgs),
}

/// Arguments for the init subcommand.
#[derive(Debug, Args)]
pub struct InitArgs {
    /// Write to this path instead of the default location
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

/// Arguments for the docs subcommand.
#[derive(Debug, Args)]
pub struct DocsArgs {
    /// Keep groups whose shared title is the placeholder
    #[arg(long)]
    pub include_placeholder: bool,

    /// Placeholder title to exclude (default from configuration)
    #[arg(long, value_name = "TITLE", conflicts_with = "include_placeholder")]
    pub placeholder: Option<String>,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the merge subcommand.
#[derive(Debug, Args)]
pub struct MergeArgs {
    /// Document that survives the merge
    #[arg(value_name = "TARGET")]
    pub target: String,

    /// Documents to fold into the target
    #[arg(value_name = "SOURCE", num_args = 1.., required = true)]
    pub sources: Vec<String>,

    /// Skip the confirmation prompt
    #[arg(short = 'y', long)]
    pub yes: bool,
}

/// Arguments for the empty subcommand.
#[derive(Debug, Args)]
pub struct EmptyArgs {
    /// Show empty documents even when something references them
    #[arg(long)]
    pub show_referenced: bool,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the delete-empty subcommand.
#[derive(Debug, Args)]
pub struct DeleteEmptyArgs {
    /// Ids of the documents to delete
    #[arg(value_name = "ID", conflicts_with = "all", required_unless_present = "all")]
    pub ids: Vec<String>,

    /// Delete every empty document nothing references
    #[arg(long)]
    pub all: bool,

    /// Skip the confirmation prompt
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Show what would be deleted without deleting anything
    #[arg(long)]
    pub dry_run: bool,
}

/// Scan arguments shared by the files and clean subcommands.
#[derive(Debug, Args)]
pub struct FileScanArgs {
    /// Notebook id to scan
    #[arg(value_name = "NOTEBOOK")]
    pub notebook: String,

    /// Folder path inside the notebook
    #[arg(value_name = "PATH", default_value = "/")]
    pub path: String,

    /// How entries are compared
    #[arg(long, value_enum, value_name = "MODE", default_value = "name")]
    pub by: ComparisonMode,

    /// Minimum file size to consider (e.g. 10KB, 1MiB)
    ///
    /// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub min_size: Option<u64>,

    /// Extra file extensions to ignore, added to the configured list
    #[arg(long = "ignore-ext", value_name = "EXT")]
    pub ignore_ext: Vec<String>,

    /// Do not descend into subfolders
    #[arg(long)]
    pub no_recursive: bool,
}

/// Arguments for the files subcommand.
#[derive(Debug, Args)]
pub struct FilesArgs {
    #[command(flatten)]
    pub scan: FileScanArgs,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the clean subcommand.
#[derive(Debug, Args)]
pub struct CleanArgs {
    #[command(flatten)]
    pub scan: FileScanArgs,

    /// Which copy to keep (default from configuration)
    #[arg(long, value_enum, value_name = "POLICY")]
    pub keep: Option<RetentionPolicy>,

    /// Skip the confirmation prompt
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Show what would be deleted without deleting anything
    #[arg(long)]
    pub dry_run: bool,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

/// Parse a human-readable size string into bytes.
///
/// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB.
/// Case-insensitive. Numbers without suffix are treated as bytes.
///
/// # Examples
///
/// ```
/// use notedupe::cli::parse_size;
///
/// assert_eq!(parse_size("1024").unwrap(), 1024);
/// assert_eq!(parse_size("1KB").unwrap(), 1000);
/// assert_eq!(parse_size("1KiB").unwrap(), 1024);
/// ```
///
/// # Errors
///
/// Returns an error if the string is empty, contains an invalid number,
/// a negative number, or an unknown size suffix.
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Size cannot be empty".to_string());
    }

    // Find where the number ends and the suffix begins
    let (num_str, suffix) = match s.find(|c: char| !c.is_ascii_digit() && c != '.') {
        Some(idx) => (&s[..idx], s[idx..].trim().to_uppercase()),
        None => (s, String::new()),
    };

    let num: f64 = num_str
        .parse()
        .map_err(|_| format!("Invalid number: '{num_str}'"))?;

    if num < 0.0 {
        return Err("Size cannot be negative".to_string());
    }

    let multiplier: u64 = match suffix.as_str() {
        "" | "B" => 1,
        "KB" | "K" => 1_000,
        "KIB" => 1_024,
        "MB" | "M" => 1_000_000,
        "MIB" => 1_048_576,
        "GB" | "G" => 1_000_000_000,
        "GIB" => 1_073_741_824,
        "TB" | "T" => 1_000_000_000_000,
        "TIB" => 1_099_511_627_776,
        _ => return Err(format!("Unknown size suffix: '{suffix}'")),
    };

    Ok((num * multiplier as f64) as u64)
}
