//! In-memory [`Host`] implementation for tests and examples.
//!
//! Holds documents, references, folder listings and raw files in `HashMap`s
//! behind `std::sync::RwLock`. Mutating operations behave like a tiny note
//! server: reference transfer moves inbound references between documents,
//! append concatenates content, delete removes the document and its folder
//! entry. Per-operation failure injection and a recorded call log make
//! ordering and no-op guarantees observable in tests.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use async_trait::async_trait;

use super::{ChildEntry, DocEntry, Host, HostError, Locator, RefEntry, Severity, TitleGroup};

struct StoredDoc {
    entry: DocEntry,
    content: String,
}

#[derive(Default)]
struct Failures {
    transfers: HashSet<String>,
    exports: HashSet<String>,
    appends: HashSet<String>,
    deletes: HashSet<String>,
    references: HashSet<String>,
    listings: HashSet<(String, String)>,
    fetches: HashSet<String>,
}

#[derive(Default)]
struct State {
    docs: Vec<StoredDoc>,
    refs: HashMap<String, Vec<RefEntry>>,
    children: HashMap<(String, String), Vec<ChildEntry>>,
    raw_files: HashMap<String, Vec<u8>>,
    failures: Failures,
}

/// In-memory host for tests and examples.
#[derive(Default)]
pub struct MemoryHost {
    state: RwLock<State>,
    calls: RwLock<Vec<String>>,
    notifications: RwLock<Vec<(String, Severity)>>,
}

fn injected(what: &str, key: &str) -> HostError {
    HostError::Api {
        code: -1,
        message: format!("injected {what} failure for {key}"),
    }
}

impl MemoryHost {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, call: String) {
        self.calls.write().unwrap().push(call);
    }

    // ---- seeding ----

    /// Add a document with its exported text content.
    pub fn add_document(&self, entry: DocEntry, content: &str) {
        self.state.write().unwrap().docs.push(StoredDoc {
            entry,
            content: content.to_string(),
        });
    }

    /// Add an inbound reference pointing at `target_id`.
    pub fn add_reference(&self, target_id: &str, reference: RefEntry) {
        self.state
            .write()
            .unwrap()
            .refs
            .entry(target_id.to_string())
            .or_default()
            .push(reference);
    }

    /// Seed the folder listing for one notebook path.
    pub fn add_children(&self, notebook: &str, path: &str, entries: Vec<ChildEntry>) {
        self.state
            .write()
            .unwrap()
            .children
            .insert((notebook.to_string(), path.to_string()), entries);
    }

    /// Seed a raw file body.
    pub fn add_raw_file(&self, path: &str, bytes: &[u8]) {
        self.state
            .write()
            .unwrap()
            .raw_files
            .insert(path.to_string(), bytes.to_vec());
    }

    // ---- failure injection ----

    /// Make reference transfer fail for the given source document.
    pub fn fail_transfer(&self, from_id: &str) {
        self.state
            .write()
            .unwrap()
            .failures
            .transfers
            .insert(from_id.to_string());
    }

    /// Make content export fail for the given document.
    pub fn fail_export(&self, id: &str) {
        self.state
            .write()
            .unwrap()
            .failures
            .exports
            .insert(id.to_string());
    }

    /// Make content append fail for the given target document.
    pub fn fail_append(&self, target_id: &str) {
        self.state
            .write()
            .unwrap()
            .failures
            .appends
            .insert(target_id.to_string());
    }

    /// Make deletion fail for the given document path.
    pub fn fail_delete(&self, path: &str) {
        self.state
            .write()
            .unwrap()
            .failures
            .deletes
            .insert(path.to_string());
    }

    /// Make the inbound-reference lookup fail for the given document.
    pub fn fail_references(&self, id: &str) {
        self.state
            .write()
            .unwrap()
            .failures
            .references
            .insert(id.to_string());
    }

    /// Make the folder listing fail for the given notebook path.
    pub fn fail_listing(&self, notebook: &str, path: &str) {
        self.state
            .write()
            .unwrap()
            .failures
            .listings
            .insert((notebook.to_string(), path.to_string()));
    }

    /// Make the raw fetch error (not merely miss) for the given path.
    pub fn fail_fetch(&self, path: &str) {
        self.state
            .write()
            .unwrap()
            .failures
            .fetches
            .insert(path.to_string());
    }

    // ---- inspection ----

    /// Every host call made so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }

    /// Every notification pushed so far, in order.
    #[must_use]
    pub fn pushed_notifications(&self) -> Vec<(String, Severity)> {
        self.notifications.read().unwrap().clone()
    }

    /// Whether a document with this id still exists.
    #[must_use]
    pub fn contains_document(&self, id: &str) -> bool {
        self.state
            .read()
            .unwrap()
            .docs
            .iter()
            .any(|d| d.entry.id == id)
    }

    /// Current exported content of a document, if it exists.
    #[must_use]
    pub fn document_content(&self, id: &str) -> Option<String> {
        self.state
            .read()
            .unwrap()
            .docs
            .iter()
            .find(|d| d.entry.id == id)
            .map(|d| d.content.clone())
    }

    /// Inbound references currently pointing at a document.
    #[must_use]
    pub fn references_of(&self, id: &str) -> Vec<RefEntry> {
        self.state
            .read()
            .unwrap()
            .refs
            .get(id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl Host for MemoryHost {
    async fn duplicate_title_groups(&self) -> Result<Vec<TitleGroup>, HostError> {
        self.record("duplicate_title_groups".to_string());
        let state = self.state.read().unwrap();

        // Bucket by exact title, preserving document insertion order.
        let mut order: Vec<String> = Vec::new();
        let mut buckets: HashMap<String, Vec<DocEntry>> = HashMap::new();
        for doc in &state.docs {
            let bucket = buckets.entry(doc.entry.title.clone()).or_default();
            if bucket.is_empty() {
                order.push(doc.entry.title.clone());
            }
            bucket.push(doc.entry.clone());
        }

        let mut groups: Vec<TitleGroup> = order
            .into_iter()
            .filter_map(|title| {
                let documents = buckets.remove(&title)?;
                (documents.len() > 1).then_some(TitleGroup { title, documents })
            })
            .collect();
        // Same ordering as the SQL query: count descending, then title.
        groups.sort_by(|a, b| {
            b.documents
                .len()
                .cmp(&a.documents.len())
                .then_with(|| a.title.cmp(&b.title))
        });
        Ok(groups)
    }

    async fn empty_documents(&self) -> Result<Vec<DocEntry>, HostError> {
        self.record("empty_documents".to_string());
        let state = self.state.read().unwrap();
        Ok(state
            .docs
            .iter()
            .filter(|d| d.content.trim().is_empty())
            .map(|d| d.entry.clone())
            .collect())
    }

    async fn inbound_references(&self, id: &str) -> Result<Vec<RefEntry>, HostError> {
        self.record(format!("inbound_references {id}"));
        let state = self.state.read().unwrap();
        if state.failures.references.contains(id) {
            return Err(injected("reference lookup", id));
        }
        Ok(state.refs.get(id).cloned().unwrap_or_default())
    }

    async fn lookup_document(&self, id: &str) -> Result<Option<DocEntry>, HostError> {
        self.record(format!("lookup_document {id}"));
        let state = self.state.read().unwrap();
        Ok(state
            .docs
            .iter()
            .find(|d| d.entry.id == id)
            .map(|d| d.entry.clone()))
    }

    async fn transfer_references(&self, from_id: &str, to_id: &str) -> Result<(), HostError> {
        self.record(format!("transfer_references {from_id} -> {to_id}"));
        let mut state = self.state.write().unwrap();
        if state.failures.transfers.contains(from_id) {
            return Err(injected("transfer", from_id));
        }
        let moved = state.refs.remove(from_id).unwrap_or_default();
        state
            .refs
            .entry(to_id.to_string())
            .or_default()
            .extend(moved);
        Ok(())
    }

    async fn export_text_content(&self, id: &str) -> Result<String, HostError> {
        self.record(format!("export_text_content {id}"));
        let state = self.state.read().unwrap();
        if state.failures.exports.contains(id) {
            return Err(injected("export", id));
        }
        state
            .docs
            .iter()
            .find(|d| d.entry.id == id)
            .map(|d| d.content.clone())
            .ok_or_else(|| HostError::Api {
                code: -1,
                message: format!("document {id} not found"),
            })
    }

    async fn append_text_content(&self, target_id: &str, text: &str) -> Result<(), HostError> {
        self.record(format!("append_text_content {target_id}"));
        let mut state = self.state.write().unwrap();
        if state.failures.appends.contains(target_id) {
            return Err(injected("append", target_id));
        }
        let doc = state
            .docs
            .iter_mut()
            .find(|d| d.entry.id == target_id)
            .ok_or_else(|| HostError::Api {
                code: -1,
                message: format!("document {target_id} not found"),
            })?;
        doc.content.push_str(text);
        Ok(())
    }

    async fn delete_item(&self, locator: &Locator) -> Result<(), HostError> {
        self.record(format!("delete_item {}:{}", locator.notebook, locator.path));
        let mut state = self.state.write().unwrap();
        if state.failures.deletes.contains(&locator.path) {
            return Err(injected("delete", &locator.path));
        }
        let before = state.docs.len();
        state.docs.retain(|d| d.entry.locator != *locator);
        // Drop the matching folder entry too, so re-scans see the deletion.
        for ((notebook, _), entries) in state.children.iter_mut() {
            if *notebook == locator.notebook {
                entries.retain(|e| e.path != locator.path);
            }
        }
        if state.docs.len() == before {
            state.raw_files.remove(&locator.path).map_or_else(
                || {
                    Err(HostError::Api {
                        code: -1,
                        message: format!("no document at {}", locator.path),
                    })
                },
                |_| Ok(()),
            )
        } else {
            Ok(())
        }
    }

    async fn child_entries(
        &self,
        notebook: &str,
        path: &str,
    ) -> Result<Vec<ChildEntry>, HostError> {
        self.record(format!("child_entries {notebook}:{path}"));
        let state = self.state.read().unwrap();
        let key = (notebook.to_string(), path.to_string());
        if state.failures.listings.contains(&key) {
            return Err(injected("listing", path));
        }
        Ok(state.children.get(&key).cloned().unwrap_or_default())
    }

    async fn fetch_raw(&self, path: &str) -> Result<Option<Vec<u8>>, HostError> {
        self.record(format!("fetch_raw {path}"));
        let state = self.state.read().unwrap();
        if state.failures.fetches.contains(path) {
            return Err(injected("fetch", path));
        }
        Ok(state.raw_files.get(path).cloned())
    }

    async fn notify(&self, message: &str, severity: Severity) -> Result<(), HostError> {
        self.record(format!("notify {severity:?}"));
        self.notifications
            .write()
            .unwrap()
            .push((message.to_string(), severity));
        Ok(())
    }
}
