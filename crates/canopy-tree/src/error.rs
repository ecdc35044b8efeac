//! Error types for tree operations.

use canopy_attrs::AttrError;
use canopy_store::StoreError;

use crate::group::GroupId;
use crate::leaf::LeafId;

/// Errors that can occur while attaching, renaming, or detaching nodes.
///
/// `InvalidName` and `DuplicateName` are raised before any index is touched,
/// so the caller may retry with another name. `InconsistentTree` means an
/// index update was left half applied; the tree must not be used further.
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    /// The proposed name fails format validation.
    #[error("invalid name {name:?}: {reason}")]
    InvalidName { name: String, reason: String },

    /// Another sibling already uses the proposed name.
    #[error("another sibling ({sibling}) already has the name {name:?}")]
    DuplicateName { name: String, sibling: String },

    /// A storage-name translation would make two names share a storage
    /// name, or would not map a storage name to itself.
    #[error("invalid translation of {name:?}: {reason}")]
    InvalidTranslation { name: String, reason: String },

    /// A multi-step index update was left partially applied.
    #[error("inconsistent tree: {0}")]
    InconsistentTree(String),

    /// The leaf handle does not refer to a live leaf.
    #[error("leaf not found: {0}")]
    LeafNotFound(LeafId),

    /// The group handle does not refer to a live group.
    #[error("group not found: {0}")]
    GroupNotFound(GroupId),

    /// The operation needs a leaf that is attached to the tree.
    #[error("leaf is not attached: {path}")]
    NotAttached { path: String },

    /// Only unattached leaves can be attached.
    #[error("leaf cannot be attached again: {path}")]
    AlreadyAttached { path: String },

    /// A payload kind failed to flush its buffered state.
    #[error("flush failed for {path}: {reason}")]
    Flush { path: String, reason: String },

    /// Backing-store failure, propagated unchanged.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Attribute-store failure.
    #[error("attribute error: {0}")]
    Attr(#[from] AttrError),
}

impl TreeError {
    /// Returns `true` for errors raised by pre-condition checks, which leave
    /// the tree unchanged and can be retried with different input.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            TreeError::InvalidName { .. } | TreeError::DuplicateName { .. }
        )
    }
}

/// Convenience alias for tree results.
pub type TreeResult<T> = Result<T, TreeError>;
