//! Items and pre-grouping filters.

use serde::{Deserialize, Serialize};

use crate::host::{ChildEntry, DocEntry, Locator};

/// An immutable snapshot of a document or file subject to deduplication.
///
/// Items are fetched fresh for each scan. The engine never mutates host state
/// through an item; deletion and merging go through the explicit coordinator
/// operations. The one mutable slot is `content`, a cache filled by the first
/// content fetch so that grouping and hashing do not fetch twice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Opaque identifier. For documents this is the host's document id; for
    /// plain files it is the file path.
    pub id: String,
    /// Name shown to the user (document title or file name).
    pub display_name: String,
    /// Location needed to delete the item.
    pub locator: Locator,
    /// Last-modified timestamp in the host's compact numeric form.
    pub last_modified: u64,
    /// Size in bytes. Zero when the host does not report a size; retention
    /// by size degenerates to first-in-scan-order for such items.
    pub size_bytes: u64,
    /// Whether this entry can contain other entries. Containers are always
    /// filtered out before grouping.
    pub is_container: bool,
    /// How many other items point at this one, when known.
    pub reference_count: Option<u64>,
    /// Cached textual content, filled lazily by the fingerprinter.
    #[serde(skip)]
    pub content: Option<String>,
}

impl Item {
    /// Build an item from a document row.
    #[must_use]
    pub fn from_doc(entry: DocEntry) -> Self {
        Self {
            id: entry.id,
            display_name: entry.title,
            locator: entry.locator,
            last_modified: entry.updated,
            size_bytes: entry.size_bytes,
            is_container: false,
            reference_count: None,
            content: None,
        }
    }

    /// Build an item from one folder-listing entry.
    ///
    /// Document files (named `*.sy`) get the document id derived from the
    /// file name, so content can later be exported by id; anything else is
    /// identified by its path and fetched raw.
    #[must_use]
    pub fn from_child(notebook: &str, entry: ChildEntry) -> Self {
        let id = match entry.name.strip_suffix(".sy") {
            Some(doc_id) => doc_id.to_string(),
            None => entry.path.clone(),
        };
        Self {
            id,
            display_name: entry.name.clone(),
            locator: Locator::new(notebook, entry.path),
            last_modified: entry.updated,
            size_bytes: entry.size_bytes,
            is_container: entry.child_count > 0,
            reference_count: None,
            content: None,
        }
    }

    /// Whether this item is a document file exportable by id.
    #[must_use]
    pub fn is_document(&self) -> bool {
        self.display_name.ends_with(".sy") && !self.locator.notebook.is_empty()
    }
}

/// The last dot-segment of a name, lowercased.
///
/// A dotless name is its own last segment, so `ignore_extensions = ["log"]`
/// also drops a bare file named `log`.
#[must_use]
pub fn extension_of(name: &str) -> String {
    name.rsplit('.').next().unwrap_or(name).to_lowercase()
}

/// Filter applied to items before grouping.
#[derive(Debug, Clone, Default)]
pub struct ItemFilter {
    /// Items strictly smaller than this are dropped.
    pub min_size: u64,
    /// Extensions to drop, lowercase, without a leading dot.
    pub ignored_extensions: Vec<String>,
}

impl ItemFilter {
    #[must_use]
    pub fn new(min_size: u64, ignored_extensions: Vec<String>) -> Self {
        Self {
            min_size,
            ignored_extensions: ignored_extensions
                .into_iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
        }
    }

    /// Whether the item survives filtering. Containers never do.
    #[must_use]
    pub fn allows(&self, item: &Item) -> bool {
        if item.is_container {
            return false;
        }
        if self.min_size > 0 && item.size_bytes < self.min_size {
            return false;
        }
        if !self.ignored_extensions.is_empty() {
            let ext = extension_of(&item.display_name);
            if self.ignored_extensions.iter().any(|e| *e == ext) {
                return false;
            }
        }
        true
    }
}
