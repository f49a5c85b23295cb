//! Duplicate detection engine.
//!
//! This module provides the host-independent core:
//! - [`Item`]: an immutable snapshot of a document or file
//! - fingerprinting by name, content, or content hash
//! - single-pass grouping of items sharing a fingerprint
//! - retention policies selecting the one member of a group to keep

pub mod fingerprint;
pub mod group;
pub mod item;
pub mod retention;

pub use fingerprint::{content_hash, name_key, ComparisonMode};
pub use group::{group_items, DuplicateGroup, GroupingStats};
pub use item::{Item, ItemFilter};
pub use retention::{select_keeper, RetentionPolicy};
