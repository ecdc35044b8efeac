use canopy_types::ObjectId;

/// Errors from backing-store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No object with this storage name exists under the parent.
    #[error("object not found: {name} under {}", parent.short_hex())]
    NotFound { parent: ObjectId, name: String },

    /// An object with this storage name already exists under the parent.
    #[error("object already exists: {name} under {}", parent.short_hex())]
    AlreadyExists { parent: ObjectId, name: String },

    /// The parent object is unknown to the store.
    #[error("parent object not found: {0:?}")]
    ParentNotFound(ObjectId),

    /// The store refused or could not complete the operation.
    #[error("store unavailable during {operation}: {reason}")]
    Unavailable {
        operation: &'static str,
        reason: String,
    },

    /// Internal state of the store can no longer be trusted.
    #[error("store lock poisoned: {0}")]
    Poisoned(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
