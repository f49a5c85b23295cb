//! Human-readable rendering for the terminal.
//!
//! Renderers return plain `String`s so command handlers decide where the
//! text goes; coloring runs through `yansi` and respects the global
//! disable switch set by `--no-color`.

use bytesize::ByteSize;
use chrono::NaiveDateTime;
use yansi::Paint;

use crate::actions::{DeleteOutcome, MergeOutcome};
use crate::dedupe::{DuplicateGroup, GroupingStats, Item};

/// Format bytes as a human-readable size.
///
/// Uses IEC binary units (KiB, MiB, GiB) via the bytesize crate.
///
/// # Examples
///
/// ```
/// use notedupe::output::text::format_size;
///
/// assert_eq!(format_size(1024), "1.0 KiB");
/// assert!(format_size(1024 * 1024).contains("MiB"));
/// ```
#[must_use]
pub fn format_size(bytes: u64) -> String {
    ByteSize::b(bytes).to_string()
}

/// Format the host's compact numeric timestamp (`YYYYMMDDHHMMSS`).
///
/// Falls back to the raw number for values that do not parse, and to `-`
/// for zero, which folder listings report for entries without a timestamp.
#[must_use]
pub fn format_timestamp(updated: u64) -> String {
    if updated == 0 {
        return "-".to_string();
    }
    match NaiveDateTime::parse_from_str(&updated.to_string(), "%Y%m%d%H%M%S") {
        Ok(ts) => ts.format("%Y-%m-%d %H:%M").to_string(),
        Err(_) => updated.to_string(),
    }
}

fn item_line(item: &Item) -> String {
    let location = format!("{}:{}", item.locator.notebook, item.locator.path);
    let mut line = format!(
        "  - {}  {}  {}  {}",
        item.display_name,
        location.dim(),
        format_size(item.size_bytes),
        format_timestamp(item.last_modified).dim(),
    );
    if let Some(count) = item.reference_count {
        line.push_str(&format!("  {}", format!("{count} ref(s)").cyan()));
    }
    line.push('\n');
    line
}

/// Render duplicate groups, one numbered block per group.
#[must_use]
pub fn render_groups(groups: &[DuplicateGroup]) -> String {
    let mut out = String::new();
    for (index, group) in groups.iter().enumerate() {
        let header = format!(
            "{}. \"{}\" ({} items, {} wasted)",
            index + 1,
            group.key,
            group.len(),
            format_size(group.wasted_space())
        );
        out.push_str(&format!("{}\n", header.bold()));
        for item in &group.items {
            out.push_str(&item_line(item));
        }
    }
    out
}

/// Render a flat item listing, used for empty documents.
#[must_use]
pub fn render_items(items: &[Item]) -> String {
    let mut out = String::new();
    for item in items {
        let location = format!("{}:{}", item.locator.notebook, item.locator.path);
        let mut line = format!(
            "  {}  {}  {}",
            item.id,
            item.display_name.bold(),
            location.dim(),
        );
        if let Some(count) = item.reference_count {
            line.push_str(&format!("  {}", format!("{count} ref(s)").cyan()));
        }
        out.push_str(&line);
        out.push('\n');
    }
    out
}

/// Render the scan summary block.
#[must_use]
pub fn render_scan_summary(stats: &GroupingStats, groups: &[DuplicateGroup]) -> String {
    if groups.is_empty() {
        return format!(
            "{} ({} items scanned)\n",
            "No duplicates found.".green(),
            stats.total_items
        );
    }

    let mut out = format!("\n{}\n", "Summary".bold());
    out.push_str(&format!(
        "  Items scanned:    {} ({} filtered out, {} unreadable)\n",
        stats.total_items, stats.filtered_out, stats.fetch_failures
    ));
    out.push_str(&format!(
        "  Total size:       {}\n",
        format_size(stats.total_size)
    ));
    out.push_str(&format!(
        "  Duplicate groups: {}\n",
        stats.duplicate_groups
    ));
    out.push_str(&format!("  Duplicate items:  {}\n", stats.duplicate_items));
    out.push_str(&format!(
        "  Reclaimable:      {}\n",
        format_size(stats.potential_savings(groups)).green().bold()
    ));
    out
}

/// Render a deletion outcome, one line per item plus the summary.
#[must_use]
pub fn render_cleanup(outcome: &DeleteOutcome, dry_run: bool) -> String {
    let mut out = String::new();
    if dry_run {
        out.push_str(&format!(
            "{}\n",
            "Dry run, nothing will be deleted.".yellow().bold()
        ));
        for id in &outcome.deleted {
            out.push_str(&format!("  {} {}\n", "would delete".yellow(), id));
        }
        out.push_str(&format!(
            "{} item(s) would be deleted, freeing {}\n",
            outcome.deleted_count(),
            format_size(outcome.freed_bytes)
        ));
        return out;
    }

    for id in &outcome.deleted {
        out.push_str(&format!("  {} {}\n", "deleted".green(), id));
    }
    for (id, err) in &outcome.failures {
        out.push_str(&format!("  {} {}: {}\n", "failed".red().bold(), id, err));
    }
    out.push_str(&format!("{}\n", outcome.summary().bold()));
    out
}

/// Render a merge outcome, one line per source plus the summary.
#[must_use]
pub fn render_merge(outcome: &MergeOutcome) -> String {
    let mut out = String::new();
    for id in &outcome.merged {
        out.push_str(&format!(
            "  {} {} -> {}\n",
            "merged".green(),
            id,
            outcome.target_id
        ));
    }
    for (id, err) in &outcome.failures {
        out.push_str(&format!("  {} {}: {}\n", "failed".red().bold(), id, err));
    }
    out.push_str(&format!("{}\n", outcome.summary().bold()));
    out
}
