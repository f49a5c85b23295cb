//! Mutating operations against the host.
//!
//! Everything that changes host state lives here, behind two coordinators:
//!
//! - The merge coordinator folds duplicate documents into one survivor,
//!   moving inbound references and content before deleting each source.
//! - The delete coordinator removes items one at a time, so a single
//!   failure never aborts the rest of a batch.
//!
//! Both report per-item results instead of failing fast: callers get an
//! outcome struct listing what succeeded and what failed, and only the
//! confirmed successes are counted.

pub mod delete;
pub mod merge;

// Re-export commonly used types
pub use delete::{
    clean_duplicate_groups, delete_all, delete_documents_by_id, DeleteError, DeleteOutcome,
};
pub use merge::{merge_documents, MergeError, MergeOutcome, MergeRequest};

use thiserror::Error;

/// A request rejected before any host call was made.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The merge target id was empty or whitespace.
    #[error("merge target must not be blank")]
    BlankTarget,

    /// Nothing was selected to operate on.
    #[error("no items selected")]
    EmptySelection,
}
