//! Bucketing filtered items into duplicate groups.
//!
//! Grouping is a pure fold over the scan order: each surviving item gets a
//! fingerprint key, items land in per-key buckets, and only buckets with two
//! or more members come out as groups. Group order is the order in which each
//! key was first seen, and members keep their scan order, so repeated runs
//! over the same tree produce identical output.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::host::Host;

use super::fingerprint::{fingerprint_key, ComparisonMode};
use super::item::{Item, ItemFilter};

/// A set of items sharing one fingerprint key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// The shared key (normalized name, full content, or content hash).
    pub key: String,
    /// The comparison mode that produced this group.
    pub mode: ComparisonMode,
    /// Members in scan order.
    pub items: Vec<Item>,
}

impl DuplicateGroup {
    /// Number of items in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total size of all members.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.items.iter().map(|i| i.size_bytes).sum()
    }

    /// Bytes that would be freed by keeping only the largest member.
    #[must_use]
    pub fn wasted_space(&self) -> u64 {
        let largest = self.items.iter().map(|i| i.size_bytes).max().unwrap_or(0);
        self.total_size().saturating_sub(largest)
    }

    /// Number of removable copies (total minus the one kept).
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.items.len().saturating_sub(1)
    }
}

/// Statistics from one grouping pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GroupingStats {
    /// Items seen before filtering.
    pub total_items: usize,
    /// Combined size of all items seen, in bytes.
    pub total_size: u64,
    /// Items dropped by the pre-grouping filter.
    pub filtered_out: usize,
    /// Items excluded because their content could not be fetched.
    pub fetch_failures: usize,
    /// Buckets with two or more members.
    pub duplicate_groups: usize,
    /// Items inside those buckets.
    pub duplicate_items: usize,
}

impl GroupingStats {
    /// Bytes reclaimable if every group kept only its largest member.
    #[must_use]
    pub fn potential_savings(&self, groups: &[DuplicateGroup]) -> u64 {
        groups.iter().map(DuplicateGroup::wasted_space).sum()
    }
}

/// Group items by fingerprint key.
///
/// The filter runs before any content fetch, so filtered items cost no host
/// calls. Items whose content cannot be fetched are excluded from grouping
/// and counted, rather than failing the whole scan; a warning names each one.
///
/// Returns the groups in first-seen key order together with the stats.
pub async fn group_items(
    host: &dyn Host,
    items: Vec<Item>,
    mode: ComparisonMode,
    filter: &ItemFilter,
) -> (Vec<DuplicateGroup>, GroupingStats) {
    let mut stats = GroupingStats::default();
    let mut order: Vec<String> = Vec::new();
    let mut buckets: HashMap<String, Vec<Item>> = HashMap::new();

    for mut item in items {
        stats.total_items += 1;
        stats.total_size += item.size_bytes;

        if !filter.allows(&item) {
            stats.filtered_out += 1;
            log::trace!("Filtered out {}", item.display_name);
            continue;
        }

        let key = match fingerprint_key(host, mode, &mut item).await {
            Ok(key) => key,
            Err(err) => {
                stats.fetch_failures += 1;
                log::warn!(
                    "Skipping {}: content unavailable: {err}",
                    item.display_name
                );
                continue;
            }
        };

        let bucket = buckets.entry(key.clone()).or_default();
        if bucket.is_empty() {
            order.push(key);
        }
        bucket.push(item);
    }

    let groups: Vec<DuplicateGroup> = order
        .into_iter()
        .filter_map(|key| {
            let items = buckets.remove(&key)?;
            if items.len() < 2 {
                return None;
            }
            stats.duplicate_groups += 1;
            stats.duplicate_items += items.len();
            log::debug!("Group '{}': {} duplicates", key, items.len());
            Some(DuplicateGroup { key, mode, items })
        })
        .collect();

    log::info!(
        "Grouped {} items by {mode}: {} groups, {} duplicates ({} filtered, {} unfetchable)",
        stats.total_items,
        stats.duplicate_groups,
        stats.duplicate_items,
        stats.filtered_out,
        stats.fetch_failures
    );

    (groups, stats)
}
