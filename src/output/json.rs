//! JSON reports for scan and cleanup results.
//!
//! Machine-readable output for scripting and automation. Every report
//! carries the exit code so a consumer can read one JSON document instead
//! of combining stdout with the process status.
//!
//! # Scan Schema
//!
//! ```json
//! {
//!   "duplicates": [
//!     {
//!       "key": "notes.md",
//!       "mode": "name",
//!       "size": 2048,
//!       "wasted": 1024,
//!       "items": [
//!         {
//!           "id": "20240101120000-abcdef",
//!           "name": "notes.md",
//!           "notebook": "20230101-box",
//!           "path": "/notes.md",
//!           "updated": 20240101120000,
//!           "size": 1024,
//!           "references": 2
//!         }
//!       ]
//!     }
//!   ],
//!   "summary": {
//!     "total_items": 100,
//!     "total_size": 1048576,
//!     "filtered_out": 3,
//!     "fetch_failures": 0,
//!     "duplicate_groups": 5,
//!     "duplicate_items": 12,
//!     "reclaimable_space": 51200,
//!     "exit_code": 0,
//!     "exit_code_name": "ND000"
//!   }
//! }
//! ```
//!
//! # Example
//!
//! ```no_run
//! use notedupe::error::ExitCode;
//! use notedupe::output::json::ScanReport;
//!
//! # let (groups, stats) = (Vec::new(), notedupe::dedupe::GroupingStats::default());
//! let report = ScanReport::new(&groups, &stats, ExitCode::Success);
//! println!("{}", report.to_json_pretty().unwrap());
//! ```

use std::io::Write;

use serde::Serialize;

use crate::actions::DeleteOutcome;
use crate::dedupe::{ComparisonMode, DuplicateGroup, GroupingStats, Item};
use crate::error::ExitCode;

/// A single item in JSON form.
#[derive(Debug, Clone, Serialize)]
pub struct JsonItem {
    /// Document id, or the file path for plain files
    pub id: String,
    /// Document title or file name
    pub name: String,
    /// Notebook the item lives in
    pub notebook: String,
    /// Path within the notebook
    pub path: String,
    /// Last-modified timestamp in the host's compact numeric form
    pub updated: u64,
    /// Size in bytes
    pub size: u64,
    /// Inbound reference count, `null` when unknown
    pub references: Option<u64>,
}

impl JsonItem {
    /// Create a JSON item from an engine item.
    #[must_use]
    pub fn from_item(item: &Item) -> Self {
        Self {
            id: item.id.clone(),
            name: item.display_name.clone(),
            notebook: item.locator.notebook.clone(),
            path: item.locator.path.clone(),
            updated: item.last_modified,
            size: item.size_bytes,
            references: item.reference_count,
        }
    }
}

/// A single duplicate group in JSON form.
#[derive(Debug, Clone, Serialize)]
pub struct JsonGroup {
    /// The shared fingerprint key
    pub key: String,
    /// The comparison mode that produced the group
    pub mode: ComparisonMode,
    /// Combined size of all members in bytes
    pub size: u64,
    /// Bytes freed by keeping only the largest member
    pub wasted: u64,
    /// Members in scan order
    pub items: Vec<JsonItem>,
}

impl JsonGroup {
    /// Create a JSON group from a duplicate group.
    #[must_use]
    pub fn from_group(group: &DuplicateGroup) -> Self {
        Self {
            key: group.key.clone(),
            mode: group.mode,
            size: group.total_size(),
            wasted: group.wasted_space(),
            items: group.items.iter().map(JsonItem::from_item).collect(),
        }
    }
}

/// Scan summary statistics in JSON form.
#[derive(Debug, Clone, Serialize)]
pub struct JsonScanSummary {
    /// Items seen before filtering
    pub total_items: usize,
    /// Combined size of all items seen, in bytes
    pub total_size: u64,
    /// Items dropped by the pre-grouping filter
    pub filtered_out: usize,
    /// Items excluded because their content could not be fetched
    pub fetch_failures: usize,
    /// Number of duplicate groups
    pub duplicate_groups: usize,
    /// Total items inside those groups
    pub duplicate_items: usize,
    /// Bytes reclaimable if every group kept only its largest member
    pub reclaimable_space: u64,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "ND000")
    pub exit_code_name: String,
}

/// Complete scan report, produced by the `docs` and `files` commands.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    /// List of duplicate groups
    pub duplicates: Vec<JsonGroup>,
    /// Scan summary statistics
    pub summary: JsonScanSummary,
}

impl ScanReport {
    /// Create a scan report from groups, stats and the exit code.
    #[must_use]
    pub fn new(groups: &[DuplicateGroup], stats: &GroupingStats, exit_code: ExitCode) -> Self {
        Self {
            duplicates: groups.iter().map(JsonGroup::from_group).collect(),
            summary: JsonScanSummary {
                total_items: stats.total_items,
                total_size: stats.total_size,
                filtered_out: stats.filtered_out,
                fetch_failures: stats.fetch_failures,
                duplicate_groups: stats.duplicate_groups,
                duplicate_items: stats.duplicate_items,
                reclaimable_space: stats.potential_savings(groups),
                exit_code: exit_code.as_i32(),
                exit_code_name: exit_code.code_prefix().to_string(),
            },
        }
    }

    /// Serialize to compact JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (unlikely for valid data).
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (unlikely for valid data).
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Flat item listing, produced by the `empty` command.
#[derive(Debug, Clone, Serialize)]
pub struct ItemsReport {
    /// The items found
    pub items: Vec<JsonItem>,
    /// Number of items found
    pub count: usize,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name
    pub exit_code_name: String,
}

impl ItemsReport {
    /// Create an item listing report.
    #[must_use]
    pub fn new(items: &[Item], exit_code: ExitCode) -> Self {
        Self {
            items: items.iter().map(JsonItem::from_item).collect(),
            count: items.len(),
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix().to_string(),
        }
    }

    /// Serialize to pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (unlikely for valid data).
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// One failed deletion in JSON form.
#[derive(Debug, Clone, Serialize)]
pub struct JsonFailure {
    /// The item that could not be deleted
    pub id: String,
    /// Human-readable reason
    pub error: String,
}

/// Cleanup report, produced by the `clean` and `delete-empty` commands.
#[derive(Debug, Clone, Serialize)]
pub struct CleanupReport {
    /// Ids of items confirmed deleted (or planned, in a dry run)
    pub deleted: Vec<String>,
    /// Items that could not be deleted
    pub failures: Vec<JsonFailure>,
    /// Number of confirmed deletions
    pub deleted_count: usize,
    /// Number of failures
    pub failure_count: usize,
    /// Bytes freed by the confirmed deletions
    pub freed_bytes: u64,
    /// Whether this was a dry run (nothing was actually deleted)
    pub dry_run: bool,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name
    pub exit_code_name: String,
}

impl CleanupReport {
    /// Create a cleanup report from a deletion outcome.
    #[must_use]
    pub fn new(outcome: &DeleteOutcome, dry_run: bool, exit_code: ExitCode) -> Self {
        Self {
            deleted: outcome.deleted.clone(),
            failures: outcome
                .failures
                .iter()
                .map(|(id, err)| JsonFailure {
                    id: id.clone(),
                    error: err.to_string(),
                })
                .collect(),
            deleted_count: outcome.deleted_count(),
            failure_count: outcome.failure_count(),
            freed_bytes: outcome.freed_bytes,
            dry_run,
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix().to_string(),
        }
    }

    /// Serialize to pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (unlikely for valid data).
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Write any report to a writer, followed by a trailing newline.
///
/// # Arguments
///
/// * `report` - The report to write
/// * `writer` - The writer to output to (e.g., stdout)
/// * `pretty` - Whether to pretty-print the output
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_report<T: Serialize, W: Write>(
    report: &T,
    writer: &mut W,
    pretty: bool,
) -> Result<(), JsonOutputError> {
    let json = if pretty {
        serde_json::to_string_pretty(report)?
    } else {
        serde_json::to_string(report)?
    };
    writer.write_all(json.as_bytes())?;
    writer.write_all(b"\n")?;
    Ok(())
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("I/O error during JSON generation: {0}")]
    Io(#[from] std::io::Error),
}
