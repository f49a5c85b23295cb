//! Read-only scan workflows.
//!
//! Everything here queries the host and builds [`Item`]s; nothing mutates.
//! Three scans exist: duplicate document titles, empty documents, and
//! duplicate files under a folder. The first two lean on host-side queries,
//! the third walks the folder tree and feeds the grouper.

use std::future::Future;
use std::pin::Pin;

use crate::dedupe::{
    group_items, ComparisonMode, DuplicateGroup, GroupingStats, Item, ItemFilter,
};
use crate::host::{ChildEntry, Host, HostError};

/// Options for the duplicate-document scan.
#[derive(Debug, Clone)]
pub struct DocScanOptions {
    /// Drop groups whose shared title is the placeholder.
    pub exclude_placeholder: bool,
    /// The title new documents are created with.
    pub placeholder_title: String,
}

impl Default for DocScanOptions {
    fn default() -> Self {
        Self {
            exclude_placeholder: true,
            placeholder_title: "Untitled".to_string(),
        }
    }
}

/// Options for the duplicate-file scan.
#[derive(Debug, Clone)]
pub struct FileScanOptions {
    /// Notebook to scan.
    pub notebook: String,
    /// Folder path inside the notebook.
    pub path: String,
    /// Descend into subfolders.
    pub recursive: bool,
    /// How entries are compared.
    pub mode: ComparisonMode,
    /// Pre-grouping filter.
    pub filter: ItemFilter,
}

/// Find groups of documents sharing the same title.
///
/// Titles match exactly; groups whose title equals the placeholder are
/// dropped when configured, since freshly created documents all share it
/// without being duplicates of anything. Each member gets its inbound
/// reference count for display; a failed count is logged and left unknown
/// rather than failing the scan.
pub async fn duplicate_documents(
    host: &dyn Host,
    options: &DocScanOptions,
) -> Result<(Vec<DuplicateGroup>, GroupingStats), HostError> {
    let title_groups = host.duplicate_title_groups().await?;

    let mut stats = GroupingStats::default();
    let mut groups = Vec::new();
    for title_group in title_groups {
        stats.total_items += title_group.documents.len();
        stats.total_size += title_group
            .documents
            .iter()
            .map(|d| d.size_bytes)
            .sum::<u64>();

        if options.exclude_placeholder && title_group.title == options.placeholder_title {
            log::debug!(
                "Excluding placeholder group '{}' ({} documents)",
                title_group.title,
                title_group.documents.len()
            );
            stats.filtered_out += title_group.documents.len();
            continue;
        }

        let mut items = Vec::with_capacity(title_group.documents.len());
        for entry in title_group.documents {
            let mut item = Item::from_doc(entry);
            fill_reference_count(host, &mut item).await;
            items.push(item);
        }
        stats.duplicate_groups += 1;
        stats.duplicate_items += items.len();
        groups.push(DuplicateGroup {
            key: title_group.title,
            mode: ComparisonMode::Name,
            items,
        });
    }

    log::info!("Found {} duplicate title group(s)", groups.len());
    Ok((groups, stats))
}

/// Find documents whose content is empty.
///
/// With `hide_referenced` set, documents with at least one inbound
/// reference are dropped, and so is any document whose reference count
/// could not be determined: an unverifiable document is treated as
/// referenced rather than offered for deletion.
pub async fn empty_documents(
    host: &dyn Host,
    hide_referenced: bool,
) -> Result<Vec<Item>, HostError> {
    let entries = host.empty_documents().await?;
    let total = entries.len();

    let mut items = Vec::new();
    for entry in entries {
        let mut item = Item::from_doc(entry);
        fill_reference_count(host, &mut item).await;

        if hide_referenced {
            match item.reference_count {
                Some(0) => items.push(item),
                Some(n) => {
                    log::debug!("Hiding {} ({n} inbound reference(s))", item.display_name);
                }
                None => {
                    log::debug!(
                        "Hiding {}: reference count unknown",
                        item.display_name
                    );
                }
            }
        } else {
            items.push(item);
        }
    }

    log::info!("Found {} empty document(s) ({total} before filtering)", items.len());
    Ok(items)
}

/// Collect every entry under a folder, in traversal order.
///
/// A listing failure at the root fails the scan; one inside a subtree
/// skips that subtree with a warning so a single unreadable folder does
/// not hide the rest of the tree. Container entries are collected too,
/// the grouping filter drops them later.
pub async fn collect_files(
    host: &dyn Host,
    notebook: &str,
    path: &str,
    recursive: bool,
) -> Result<Vec<Item>, HostError> {
    let entries = host.child_entries(notebook, path).await?;
    let mut items = Vec::new();
    append_entries(host, notebook, entries, recursive, &mut items).await;
    Ok(items)
}

fn append_entries<'a>(
    host: &'a dyn Host,
    notebook: &'a str,
    entries: Vec<ChildEntry>,
    recursive: bool,
    items: &'a mut Vec<Item>,
) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
    Box::pin(async move {
        for entry in entries {
            let child_path = entry.path.clone();
            let descend = recursive && entry.is_container();
            items.push(Item::from_child(notebook, entry));
            if descend {
                match host.child_entries(notebook, &child_path).await {
                    Ok(children) => {
                        append_entries(host, notebook, children, recursive, items).await;
                    }
                    Err(err) => {
                        log::warn!("Skipping unreadable folder {child_path}: {err}");
                    }
                }
            }
        }
    })
}

/// Walk a folder and group its entries by fingerprint.
pub async fn scan_duplicate_files(
    host: &dyn Host,
    options: &FileScanOptions,
) -> Result<(Vec<DuplicateGroup>, GroupingStats), HostError> {
    let items = collect_files(host, &options.notebook, &options.path, options.recursive).await?;
    log::debug!(
        "Collected {} entries under {}:{}",
        items.len(),
        options.notebook,
        options.path
    );
    Ok(group_items(host, items, options.mode, &options.filter).await)
}

async fn fill_reference_count(host: &dyn Host, item: &mut Item) {
    match host.inbound_references(&item.id).await {
        Ok(refs) => item.reference_count = Some(refs.len() as u64),
        Err(err) => {
            log::warn!("Could not count references of {}: {err}", item.id);
            item.reference_count = None;
        }
    }
}
