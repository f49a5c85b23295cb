//! Merging duplicate documents into one survivor.
//!
//! # Overview
//!
//! A merge folds one or more source documents into a target. Each source is
//! processed independently, in order:
//!
//! 1. Inbound references are transferred to the target, so links elsewhere
//!    in the notebook keep resolving.
//! 2. The source's content is exported and appended to the target.
//! 3. The source is looked up and deleted.
//!
//! # Safety
//!
//! A source is deleted only after both its references and its content have
//! landed on the target. If either move fails, the source stays in place and
//! the merge continues with the next source, so a mid-batch failure can lose
//! nothing; at worst a retry re-appends content that already arrived.
//!
//! # Example
//!
//! ```no_run
//! use notedupe::actions::{merge_documents, MergeRequest};
//! use notedupe::host::MemoryHost;
//!
//! async fn demo(host: &MemoryHost) {
//!     let request = MergeRequest::new("20240101-target", &["a".into(), "b".into()]).unwrap();
//!     let outcome = merge_documents(host, &request).await;
//!     println!("{}", outcome.summary());
//! }
//! ```

use thiserror::Error;

use crate::host::{Host, HostError, Severity};

use super::ValidationError;

/// Error for one failed source inside a merge.
#[derive(Debug, Error)]
pub enum MergeError {
    /// Reference transfer failed; the source was left untouched.
    #[error("reference transfer from {source_id} failed: {cause}")]
    Transfer {
        source_id: String,
        #[source]
        cause: HostError,
    },

    /// Content export or append failed; the source was left in place.
    #[error("content move from {source_id} failed: {cause}")]
    Content {
        source_id: String,
        #[source]
        cause: HostError,
    },

    /// The source disappeared between the content move and deletion.
    #[error("document {source_id} no longer exists")]
    Vanished { source_id: String },

    /// The pre-deletion lookup failed.
    #[error("lookup of {source_id} failed: {cause}")]
    Lookup {
        source_id: String,
        #[source]
        cause: HostError,
    },

    /// References and content were moved but the source could not be deleted.
    #[error("deletion of {source_id} failed: {cause}")]
    Delete {
        source_id: String,
        #[source]
        cause: HostError,
    },
}

impl MergeError {
    /// The source document this error is about.
    #[must_use]
    pub fn source_id(&self) -> &str {
        match self {
            Self::Transfer { source_id, .. }
            | Self::Content { source_id, .. }
            | Self::Vanished { source_id }
            | Self::Lookup { source_id, .. }
            | Self::Delete { source_id, .. } => source_id,
        }
    }
}

/// A validated merge selection: one target, zero or more sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeRequest {
    target_id: String,
    source_ids: Vec<String>,
}

impl MergeRequest {
    /// Validate and normalize a merge selection.
    ///
    /// The target must be non-blank. Sources are deduplicated in order;
    /// blanks and the target itself are dropped, so merging a document
    /// into itself degenerates to a no-op rather than an error.
    pub fn new(target_id: &str, source_ids: &[String]) -> Result<Self, ValidationError> {
        let target = target_id.trim();
        if target.is_empty() {
            return Err(ValidationError::BlankTarget);
        }

        let mut sources: Vec<String> = Vec::new();
        for raw in source_ids {
            let id = raw.trim();
            if id.is_empty() || id == target || sources.iter().any(|s| s == id) {
                continue;
            }
            sources.push(id.to_string());
        }

        Ok(Self {
            target_id: target.to_string(),
            source_ids: sources,
        })
    }

    /// The surviving document.
    #[must_use]
    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    /// The documents to fold into the target, in merge order.
    #[must_use]
    pub fn source_ids(&self) -> &[String] {
        &self.source_ids
    }

    /// Whether this request has nothing to do.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.source_ids.is_empty()
    }
}

/// Result of a merge operation.
#[derive(Debug)]
pub struct MergeOutcome {
    /// The surviving document.
    pub target_id: String,
    /// Sources fully merged and deleted, in merge order.
    pub merged: Vec<String>,
    /// Sources that failed, with the stage they failed at.
    pub failures: Vec<(String, MergeError)>,
}

impl MergeOutcome {
    /// Number of sources fully merged.
    #[must_use]
    pub fn merged_count(&self) -> usize {
        self.merged.len()
    }

    /// Number of sources that failed.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Check if every source was merged.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }

    /// Human-readable summary of the operation.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.all_succeeded() {
            format!(
                "Merged {} document(s) into {}",
                self.merged_count(),
                self.target_id
            )
        } else {
            format!(
                "Merged {} document(s) into {}, {} failed",
                self.merged_count(),
                self.target_id,
                self.failure_count()
            )
        }
    }
}

/// Merge every source in `request` into its target.
///
/// Sources are processed independently; one failure records a per-source
/// error and the loop continues. A request with no sources returns an empty
/// outcome without touching the host at all, not even for a notification.
///
/// One summary notification is pushed at the end, with error severity when
/// any source failed. Notification failures are logged and swallowed; they
/// never change the outcome.
pub async fn merge_documents(host: &dyn Host, request: &MergeRequest) -> MergeOutcome {
    let mut outcome = MergeOutcome {
        target_id: request.target_id().to_string(),
        merged: Vec::new(),
        failures: Vec::new(),
    };

    if request.is_noop() {
        log::debug!(
            "Merge into {} has no sources, nothing to do",
            request.target_id()
        );
        return outcome;
    }

    for source_id in request.source_ids() {
        match merge_one(host, source_id, request.target_id()).await {
            Ok(()) => {
                log::info!("Merged {source_id} into {}", request.target_id());
                outcome.merged.push(source_id.clone());
            }
            Err(err) => {
                log::warn!("Merge of {source_id} failed: {err}");
                outcome.failures.push((source_id.clone(), err));
            }
        }
    }

    let severity = if outcome.all_succeeded() {
        Severity::Info
    } else {
        Severity::Error
    };
    if let Err(err) = host.notify(&outcome.summary(), severity).await {
        log::warn!("Could not push merge notification: {err}");
    }

    outcome
}

async fn merge_one(host: &dyn Host, source_id: &str, target_id: &str) -> Result<(), MergeError> {
    host.transfer_references(source_id, target_id)
        .await
        .map_err(|cause| MergeError::Transfer {
            source_id: source_id.to_string(),
            cause,
        })?;

    let content = host
        .export_text_content(source_id)
        .await
        .map_err(|cause| MergeError::Content {
            source_id: source_id.to_string(),
            cause,
        })?;
    host.append_text_content(target_id, &content)
        .await
        .map_err(|cause| MergeError::Content {
            source_id: source_id.to_string(),
            cause,
        })?;

    // Both moves have landed; only now is the source allowed to go away.
    let entry = host
        .lookup_document(source_id)
        .await
        .map_err(|cause| MergeError::Lookup {
            source_id: source_id.to_string(),
            cause,
        })?
        .ok_or_else(|| MergeError::Vanished {
            source_id: source_id.to_string(),
        })?;
    host.delete_item(&entry.locator)
        .await
        .map_err(|cause| MergeError::Delete {
            source_id: source_id.to_string(),
            cause,
        })
}
