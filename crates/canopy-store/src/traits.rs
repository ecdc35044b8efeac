use canopy_types::ObjectId;

use crate::error::StoreResult;
use crate::pipeline::FilterPipeline;

/// The persistent container behind a canopy tree.
///
/// Objects are addressed by `(parent, storage_name)`, where `parent` is the
/// identity of the containing group and `storage_name` is the on-disk name
/// produced by name translation. All implementations must satisfy these
/// invariants:
/// - An identity returned by `create_object` or `open_object` stays valid
///   until the object is deleted, and survives `relink_object`.
/// - Failed operations leave the store unchanged.
/// - Errors are propagated, never retried internally.
pub trait BackingStore: Send + Sync {
    /// Identity of the root group, which always exists.
    fn root_object(&self) -> ObjectId;

    /// Materialize a new object and return its identity.
    ///
    /// Fails with `AlreadyExists` if the storage name is taken.
    fn create_object(&self, parent: &ObjectId, storage_name: &str) -> StoreResult<ObjectId>;

    /// Bind to an existing object and return its identity.
    ///
    /// Fails with `NotFound` if no such object exists.
    fn open_object(&self, parent: &ObjectId, storage_name: &str) -> StoreResult<ObjectId>;

    /// Delete an object.
    fn delete_object(&self, parent: &ObjectId, storage_name: &str) -> StoreResult<()>;

    /// Move an object to a new storage name under the same parent.
    fn relink_object(
        &self,
        parent: &ObjectId,
        old_storage_name: &str,
        new_storage_name: &str,
    ) -> StoreResult<()>;

    /// The filter pipeline applied to an object's payload.
    ///
    /// Returns `Ok(None)` when the object has no filters at all.
    fn filter_pipeline(
        &self,
        parent: &ObjectId,
        storage_name: &str,
    ) -> StoreResult<Option<FilterPipeline>>;

    /// Check whether an object exists.
    fn exists(&self, parent: &ObjectId, storage_name: &str) -> StoreResult<bool> {
        match self.open_object(parent, storage_name) {
            Ok(_) => Ok(true),
            Err(crate::StoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
