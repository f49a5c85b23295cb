//! Retention policies: which member of a group survives cleanup.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use super::item::Item;

/// Which copy to keep when a group is cleaned up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetentionPolicy {
    /// Keep the most recently modified copy.
    #[default]
    Newest,
    /// Keep the least recently modified copy.
    Oldest,
    /// Keep the largest copy.
    Largest,
    /// Keep the smallest copy.
    Smallest,
}

impl std::fmt::Display for RetentionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RetentionPolicy::Newest => write!(f, "newest"),
            RetentionPolicy::Oldest => write!(f, "oldest"),
            RetentionPolicy::Largest => write!(f, "largest"),
            RetentionPolicy::Smallest => write!(f, "smallest"),
        }
    }
}

/// Index of the member to keep, or `None` for an empty group.
///
/// Comparisons are strict, so on a tie the earlier member in scan order
/// wins. Combined with deterministic group order this makes cleanup
/// reproducible: the same tree and policy always keep the same copies.
#[must_use]
pub fn select_keeper(items: &[Item], policy: RetentionPolicy) -> Option<usize> {
    if items.is_empty() {
        return None;
    }
    let mut keeper = 0;
    for (idx, item) in items.iter().enumerate().skip(1) {
        let better = match policy {
            RetentionPolicy::Newest => item.last_modified > items[keeper].last_modified,
            RetentionPolicy::Oldest => item.last_modified < items[keeper].last_modified,
            RetentionPolicy::Largest => item.size_bytes > items[keeper].size_bytes,
            RetentionPolicy::Smallest => item.size_bytes < items[keeper].size_bytes,
        };
        if better {
            keeper = idx;
        }
    }
    Some(keeper)
}
