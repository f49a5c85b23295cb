//! Safe batch deletion through the host.
//!
//! # Overview
//!
//! Deletion never trusts its input list blindly: documents selected by id
//! are looked up again at deletion time, and cleanup re-selects the keeper
//! of every group when it runs, not when the scan happened. Each item is
//! deleted independently, so one failure leaves the rest of the batch
//! untouched and the outcome reports exactly what was confirmed deleted.

use thiserror::Error;

use crate::dedupe::{select_keeper, DuplicateGroup, Item, RetentionPolicy};
use crate::host::{Host, HostError};

use super::ValidationError;

/// Error for one failed deletion.
#[derive(Debug, Error)]
pub enum DeleteError {
    /// The document disappeared between selection and deletion.
    #[error("document {id} no longer exists")]
    Vanished { id: String },

    /// The pre-deletion lookup failed.
    #[error("lookup of {id} failed: {cause}")]
    Lookup {
        id: String,
        #[source]
        cause: HostError,
    },

    /// The host refused or failed the removal.
    #[error("could not delete {name}: {cause}")]
    Removal {
        name: String,
        #[source]
        cause: HostError,
    },

    /// The item carries no notebook and path to delete by.
    #[error("{name} has no deletable location")]
    MissingLocator { name: String },
}

/// Result of a batch deletion.
#[derive(Debug, Default)]
pub struct DeleteOutcome {
    /// Ids of items confirmed deleted, in deletion order.
    pub deleted: Vec<String>,
    /// Items that failed, with the reason.
    pub failures: Vec<(String, DeleteError)>,
    /// Total bytes freed by the confirmed deletions.
    pub freed_bytes: u64,
}

impl DeleteOutcome {
    /// Number of confirmed deletions.
    #[must_use]
    pub fn deleted_count(&self) -> usize {
        self.deleted.len()
    }

    /// Number of failed deletions.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Check if every deletion succeeded.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }

    /// Human-readable summary of the operation.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.all_succeeded() {
            format!(
                "Deleted {} item(s), freed {} bytes",
                self.deleted_count(),
                self.freed_bytes
            )
        } else {
            format!(
                "Deleted {} item(s), {} failed, freed {} bytes",
                self.deleted_count(),
                self.failure_count(),
                self.freed_bytes
            )
        }
    }

    fn record(&mut self, item_id: &str, size: u64, result: Result<(), DeleteError>) {
        match result {
            Ok(()) => {
                self.deleted.push(item_id.to_string());
                self.freed_bytes += size;
            }
            Err(err) => {
                log::warn!("Failed to delete {item_id}: {err}");
                self.failures.push((item_id.to_string(), err));
            }
        }
    }
}

/// Delete every item in the slice, continuing past failures.
pub async fn delete_all(host: &dyn Host, items: &[Item]) -> DeleteOutcome {
    let mut outcome = DeleteOutcome::default();
    for item in items {
        let result = delete_one(host, item).await;
        outcome.record(&item.id, item.size_bytes, result);
    }
    log::info!("{}", outcome.summary());
    outcome
}

/// Delete documents by id, looking each one up again first.
///
/// Ids are trimmed and deduplicated in order; an empty selection is
/// rejected before any host call. A document that no longer resolves is
/// reported as vanished rather than silently counted as deleted.
pub async fn delete_documents_by_id(
    host: &dyn Host,
    ids: &[String],
) -> Result<DeleteOutcome, ValidationError> {
    let mut selection: Vec<&str> = Vec::new();
    for raw in ids {
        let id = raw.trim();
        if !id.is_empty() && !selection.contains(&id) {
            selection.push(id);
        }
    }
    if selection.is_empty() {
        return Err(ValidationError::EmptySelection);
    }

    let mut outcome = DeleteOutcome::default();
    for id in selection {
        match host.lookup_document(id).await {
            Err(cause) => outcome.record(
                id,
                0,
                Err(DeleteError::Lookup {
                    id: id.to_string(),
                    cause,
                }),
            ),
            Ok(None) => outcome.record(id, 0, Err(DeleteError::Vanished { id: id.to_string() })),
            Ok(Some(entry)) => {
                let result = host
                    .delete_item(&entry.locator)
                    .await
                    .map_err(|cause| DeleteError::Removal {
                        name: entry.title.clone(),
                        cause,
                    });
                outcome.record(id, entry.size_bytes, result);
            }
        }
    }
    log::info!("{}", outcome.summary());
    Ok(outcome)
}

/// Delete every group member except the one a policy keeps.
///
/// The keeper is selected here, when the deletion runs, so a stale scan
/// cannot pin an outdated choice. Groups with fewer than two members are
/// skipped untouched.
pub async fn clean_duplicate_groups(
    host: &dyn Host,
    groups: &[DuplicateGroup],
    policy: RetentionPolicy,
) -> DeleteOutcome {
    let mut outcome = DeleteOutcome::default();
    for group in groups {
        if group.len() < 2 {
            continue;
        }
        let Some(keeper) = select_keeper(&group.items, policy) else {
            continue;
        };
        log::debug!(
            "Keeping {} in group '{}' ({policy})",
            group.items[keeper].display_name,
            group.key
        );
        for (idx, item) in group.items.iter().enumerate() {
            if idx == keeper {
                continue;
            }
            let result = delete_one(host, item).await;
            outcome.record(&item.id, item.size_bytes, result);
        }
    }
    log::info!("{}", outcome.summary());
    outcome
}

async fn delete_one(host: &dyn Host, item: &Item) -> Result<(), DeleteError> {
    if item.locator.notebook.is_empty() || item.locator.path.is_empty() {
        return Err(DeleteError::MissingLocator {
            name: item.display_name.clone(),
        });
    }
    host.delete_item(&item.locator)
        .await
        .map_err(|cause| DeleteError::Removal {
            name: item.display_name.clone(),
            cause,
        })
}
