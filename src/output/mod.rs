//! Output formatters for scan and cleanup results.
//!
//! This module provides the two output surfaces of the CLI:
//! - JSON for automation and scripting
//! - colored text for humans
//!
//! # Example
//!
//! ```no_run
//! use notedupe::dedupe::GroupingStats;
//! use notedupe::error::ExitCode;
//! use notedupe::output::json::ScanReport;
//! use notedupe::output::text;
//!
//! # let (groups, stats) = (Vec::new(), GroupingStats::default());
//! // Machine-readable
//! let report = ScanReport::new(&groups, &stats, ExitCode::Success);
//! println!("{}", report.to_json_pretty().unwrap());
//!
//! // Human-readable
//! print!("{}", text::render_groups(&groups));
//! ```

pub mod json;
pub mod text;

// Re-export main types
pub use json::{CleanupReport, ItemsReport, JsonOutputError, ScanReport};
