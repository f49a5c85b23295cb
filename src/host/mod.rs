//! Host abstraction for the note server.
//!
//! The engine never talks to a concrete server directly. Every read and write
//! goes through the [`Host`] trait: listing duplicate titles and empty
//! documents, counting inbound references, transferring references, exporting
//! and appending content, deleting documents, walking folder entries, and
//! pushing user notifications.
//!
//! Two implementations are provided:
//! - [`RestHost`]: the kernel HTTP+JSON API of a running note server
//! - [`MemoryHost`]: an in-memory store for tests and examples
//!
//! All calls are issued sequentially by the engine, one in flight at a time.
//! There is no engine-side locking; the host serializes conflicting writes.

pub mod memory;
pub mod rest;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use memory::MemoryHost;
pub use rest::RestHost;

/// Error type for host operations.
#[derive(Debug, Error)]
pub enum HostError {
    /// Transport-level failure (connection refused, timeout, bad TLS, ...).
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered but reported a non-zero API code.
    #[error("api error (code {code}): {message}")]
    Api { code: i64, message: String },

    /// The server answered with a payload we could not interpret.
    #[error("unexpected response payload: {0}")]
    Decode(String),
}

/// Where a document lives, as required by the host's delete operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locator {
    /// Notebook (storage root) identifier.
    pub notebook: String,
    /// Path of the document file inside the notebook.
    pub path: String,
}

impl Locator {
    #[must_use]
    pub fn new(notebook: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            notebook: notebook.into(),
            path: path.into(),
        }
    }
}

/// Notification severity for user-facing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Error,
}

/// A document row as returned by host queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocEntry {
    /// Opaque document identifier.
    pub id: String,
    /// Document title.
    pub title: String,
    /// Location needed to delete or move the document.
    pub locator: Locator,
    /// Human-readable path shown to the user.
    pub readable_path: String,
    /// Last-modified timestamp in the host's compact numeric form
    /// (`YYYYMMDDHHMMSS`), comparable as an integer.
    pub updated: u64,
    /// Title length in bytes as reported by the host query.
    pub size_bytes: u64,
}

/// A host-side group of documents sharing the exact same title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleGroup {
    /// The shared title.
    pub title: String,
    /// Member documents, in the order the host returned them.
    pub documents: Vec<DocEntry>,
}

/// A block that references some document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefEntry {
    /// Identifier of the referencing block.
    pub id: String,
    /// Identifier of the document containing the referencing block.
    pub doc_id: String,
    /// Text excerpt of the referencing block.
    pub excerpt: String,
}

/// One entry of a folder listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildEntry {
    /// File name, including any extension.
    pub name: String,
    /// Path of the entry inside its notebook.
    pub path: String,
    /// Number of child entries; zero means this entry is a leaf.
    pub child_count: u64,
    /// Last-modified timestamp in the host's compact numeric form.
    pub updated: u64,
    /// Size in bytes, when the host reports one.
    pub size_bytes: u64,
}

impl ChildEntry {
    /// Whether this entry can contain further entries.
    #[must_use]
    pub fn is_container(&self) -> bool {
        self.child_count > 0
    }
}

/// The narrow set of host operations the engine depends on.
///
/// Implementations must be safe to share across await points; the engine
/// holds a `&dyn Host` (or generic `H: Host`) and issues calls one at a time.
#[async_trait]
pub trait Host: Send + Sync {
    /// List groups of documents sharing the exact same title (case-sensitive),
    /// via a host-side grouped query. Only titles with two or more documents
    /// are returned.
    async fn duplicate_title_groups(&self) -> Result<Vec<TitleGroup>, HostError>;

    /// List documents with no descendant block carrying non-empty text.
    async fn empty_documents(&self) -> Result<Vec<DocEntry>, HostError>;

    /// List every block referencing the given document.
    async fn inbound_references(&self, id: &str) -> Result<Vec<RefEntry>, HostError>;

    /// Fetch a single document row by id. `Ok(None)` when no such document
    /// exists (it may have been deleted since the last scan).
    async fn lookup_document(&self, id: &str) -> Result<Option<DocEntry>, HostError>;

    /// Repoint every inbound reference of `from_id` so it targets `to_id`.
    /// The host performs the rewrite atomically on its side.
    async fn transfer_references(&self, from_id: &str, to_id: &str) -> Result<(), HostError>;

    /// Export the full textual content of a document.
    async fn export_text_content(&self, id: &str) -> Result<String, HostError>;

    /// Append text verbatim to the end of the target document.
    async fn append_text_content(&self, target_id: &str, text: &str) -> Result<(), HostError>;

    /// Delete the document at the given location.
    async fn delete_item(&self, locator: &Locator) -> Result<(), HostError>;

    /// List the entries directly under a folder path of a notebook.
    async fn child_entries(&self, notebook: &str, path: &str)
        -> Result<Vec<ChildEntry>, HostError>;

    /// Fetch the raw bytes of a file by path. `Ok(None)` when the host
    /// answers but cannot serve the file.
    async fn fetch_raw(&self, path: &str) -> Result<Option<Vec<u8>>, HostError>;

    /// Push a user-facing notification. Fire-and-forget from the engine's
    /// point of view; failures are the caller's to log, not to act on.
    async fn notify(&self, message: &str, severity: Severity) -> Result<(), HostError>;
}
