use std::collections::{HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use canopy_types::ObjectId;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::pipeline::FilterPipeline;
use crate::traits::BackingStore;

/// Store operations that can be made to fail with [`InMemoryBackingStore::fail_next`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Create,
    Open,
    Delete,
    Relink,
    Filters,
}

impl StoreOp {
    fn as_str(&self) -> &'static str {
        match self {
            StoreOp::Create => "create",
            StoreOp::Open => "open",
            StoreOp::Delete => "delete",
            StoreOp::Relink => "relink",
            StoreOp::Filters => "filters",
        }
    }
}

#[derive(Clone, Debug)]
struct StoredEntry {
    id: ObjectId,
    filters: Option<FilterPipeline>,
}

#[derive(Debug, Default)]
struct Inner {
    objects: HashMap<(ObjectId, String), StoredEntry>,
    live: HashSet<ObjectId>,
    generation: u64,
    default_filters: Option<FilterPipeline>,
    faults: Vec<StoreOp>,
}

impl Inner {
    fn take_fault(&mut self, op: StoreOp) -> StoreResult<()> {
        if let Some(pos) = self.faults.iter().position(|f| *f == op) {
            self.faults.remove(pos);
            return Err(StoreError::Unavailable {
                operation: op.as_str(),
                reason: "injected failure".into(),
            });
        }
        Ok(())
    }

    fn check_parent(&self, parent: &ObjectId) -> StoreResult<()> {
        if self.live.contains(parent) {
            Ok(())
        } else {
            Err(StoreError::ParentNotFound(*parent))
        }
    }

    fn insert(
        &mut self,
        parent: &ObjectId,
        storage_name: &str,
        filters: Option<FilterPipeline>,
    ) -> StoreResult<ObjectId> {
        self.check_parent(parent)?;
        let key = (*parent, storage_name.to_string());
        if self.objects.contains_key(&key) {
            return Err(StoreError::AlreadyExists {
                parent: *parent,
                name: storage_name.to_string(),
            });
        }
        self.generation += 1;
        let id = ObjectId::derive(parent, storage_name, self.generation);
        self.objects.insert(key, StoredEntry { id, filters });
        self.live.insert(id);
        Ok(id)
    }

    fn entry(&self, parent: &ObjectId, storage_name: &str) -> StoreResult<&StoredEntry> {
        self.objects
            .get(&(*parent, storage_name.to_string()))
            .ok_or_else(|| StoreError::NotFound {
                parent: *parent,
                name: storage_name.to_string(),
            })
    }
}

/// In-memory, HashMap-based backing store.
///
/// Intended for tests and embedding. Objects are keyed by parent identity and
/// storage name behind a single `RwLock`. Failures can be injected per
/// operation to exercise error paths of callers.
pub struct InMemoryBackingStore {
    root: ObjectId,
    inner: RwLock<Inner>,
}

impl InMemoryBackingStore {
    /// Create a store holding only the root group.
    pub fn new() -> Self {
        let root = ObjectId::from_bytes(b"/");
        let mut inner = Inner::default();
        inner.live.insert(root);
        Self {
            root,
            inner: RwLock::new(inner),
        }
    }

    /// Apply `pipeline` to every object created from now on.
    pub fn with_default_filters(self, pipeline: FilterPipeline) -> Self {
        if let Ok(mut inner) = self.inner.write() {
            inner.default_filters = Some(pipeline);
        }
        self
    }

    /// Put an object in the store as if it had been persisted earlier.
    ///
    /// Used to prepare objects that a tree will later reopen.
    pub fn seed_object(
        &self,
        parent: &ObjectId,
        storage_name: &str,
        filters: Option<FilterPipeline>,
    ) -> StoreResult<ObjectId> {
        let mut inner = self.write()?;
        inner.insert(parent, storage_name, filters)
    }

    /// Replace the filter pipeline of an existing object.
    pub fn set_filters(
        &self,
        parent: &ObjectId,
        storage_name: &str,
        filters: Option<FilterPipeline>,
    ) -> StoreResult<()> {
        let mut inner = self.write()?;
        let entry = inner
            .objects
            .get_mut(&(*parent, storage_name.to_string()))
            .ok_or_else(|| StoreError::NotFound {
                parent: *parent,
                name: storage_name.to_string(),
            })?;
        entry.filters = filters;
        Ok(())
    }

    /// Make the next call of `op` fail with [`StoreError::Unavailable`].
    pub fn fail_next(&self, op: StoreOp) {
        if let Ok(mut inner) = self.inner.write() {
            inner.faults.push(op);
        }
    }

    /// Returns `true` if an object with this storage name exists.
    pub fn contains(&self, parent: &ObjectId, storage_name: &str) -> bool {
        self.inner
            .read()
            .map(|inner| inner.objects.contains_key(&(*parent, storage_name.to_string())))
            .unwrap_or(false)
    }

    /// Number of objects currently stored, excluding the root.
    pub fn len(&self) -> usize {
        self.inner.read().map(|inner| inner.objects.len()).unwrap_or(0)
    }

    /// Returns `true` if only the root exists.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Inner>> {
        self.inner
            .read()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Inner>> {
        self.inner
            .write()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }
}

impl Default for InMemoryBackingStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BackingStore for InMemoryBackingStore {
    fn root_object(&self) -> ObjectId {
        self.root
    }

    fn create_object(&self, parent: &ObjectId, storage_name: &str) -> StoreResult<ObjectId> {
        let mut inner = self.write()?;
        inner.take_fault(StoreOp::Create)?;
        let filters = inner.default_filters.clone();
        let id = inner.insert(parent, storage_name, filters)?;
        debug!(parent = %parent.short_hex(), name = storage_name, id = %id.short_hex(), "object created");
        Ok(id)
    }

    fn open_object(&self, parent: &ObjectId, storage_name: &str) -> StoreResult<ObjectId> {
        let mut inner = self.write()?;
        inner.take_fault(StoreOp::Open)?;
        Ok(inner.entry(parent, storage_name)?.id)
    }

    fn delete_object(&self, parent: &ObjectId, storage_name: &str) -> StoreResult<()> {
        let mut inner = self.write()?;
        inner.take_fault(StoreOp::Delete)?;
        let key = (*parent, storage_name.to_string());
        let entry = inner.objects.remove(&key).ok_or_else(|| StoreError::NotFound {
            parent: *parent,
            name: storage_name.to_string(),
        })?;
        inner.live.remove(&entry.id);
        debug!(parent = %parent.short_hex(), name = storage_name, "object deleted");
        Ok(())
    }

    fn relink_object(
        &self,
        parent: &ObjectId,
        old_storage_name: &str,
        new_storage_name: &str,
    ) -> StoreResult<()> {
        let mut inner = self.write()?;
        inner.take_fault(StoreOp::Relink)?;
        let new_key = (*parent, new_storage_name.to_string());
        if inner.objects.contains_key(&new_key) {
            return Err(StoreError::AlreadyExists {
                parent: *parent,
                name: new_storage_name.to_string(),
            });
        }
        let entry = inner
            .objects
            .remove(&(*parent, old_storage_name.to_string()))
            .ok_or_else(|| StoreError::NotFound {
                parent: *parent,
                name: old_storage_name.to_string(),
            })?;
        inner.objects.insert(new_key, entry);
        debug!(
            parent = %parent.short_hex(),
            from = old_storage_name,
            to = new_storage_name,
            "object relinked"
        );
        Ok(())
    }

    fn filter_pipeline(
        &self,
        parent: &ObjectId,
        storage_name: &str,
    ) -> StoreResult<Option<FilterPipeline>> {
        let mut inner = self.write()?;
        inner.take_fault(StoreOp::Filters)?;
        Ok(inner.entry(parent, storage_name)?.filters.clone())
    }

    fn exists(&self, parent: &ObjectId, storage_name: &str) -> StoreResult<bool> {
        let inner = self.read()?;
        Ok(inner.objects.contains_key(&(*parent, storage_name.to_string())))
    }
}

impl std::fmt::Debug for InMemoryBackingStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBackingStore")
            .field("root", &self.root)
            .field("object_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_then_open_returns_same_identity() {
        let store = InMemoryBackingStore::new();
        let root = store.root_object();
        let id = store.create_object(&root, "temp").unwrap();
        assert_eq!(store.open_object(&root, "temp").unwrap(), id);
        assert!(store.contains(&root, "temp"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn create_rejects_duplicate_name() {
        let store = InMemoryBackingStore::new();
        let root = store.root_object();
        store.create_object(&root, "temp").unwrap();
        let err = store.create_object(&root, "temp").unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists { .. }));
    }

    #[test]
    fn create_under_unknown_parent_fails() {
        let store = InMemoryBackingStore::new();
        let ghost = ObjectId::from_bytes(b"ghost");
        let err = store.create_object(&ghost, "x").unwrap_err();
        assert!(matches!(err, StoreError::ParentNotFound(p) if p == ghost));
    }

    #[test]
    fn nested_objects_use_their_parent_identity() {
        let store = InMemoryBackingStore::new();
        let root = store.root_object();
        let group = store.create_object(&root, "group").unwrap();
        store.create_object(&group, "leaf").unwrap();
        assert!(store.contains(&group, "leaf"));
        assert!(!store.contains(&root, "leaf"));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn open_missing_object_fails() {
        let store = InMemoryBackingStore::new();
        let err = store.open_object(&store.root_object(), "nope").unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
        assert!(!store.exists(&store.root_object(), "nope").unwrap());
    }

    #[test]
    fn relink_preserves_identity() {
        let store = InMemoryBackingStore::new();
        let root = store.root_object();
        let id = store.create_object(&root, "temp").unwrap();
        store.relink_object(&root, "temp", "sensor1").unwrap();
        assert!(!store.contains(&root, "temp"));
        assert_eq!(store.open_object(&root, "sensor1").unwrap(), id);
    }

    #[test]
    fn relink_onto_existing_name_fails_without_change() {
        let store = InMemoryBackingStore::new();
        let root = store.root_object();
        store.create_object(&root, "a").unwrap();
        store.create_object(&root, "b").unwrap();
        let err = store.relink_object(&root, "a", "b").unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists { .. }));
        assert!(store.contains(&root, "a"));
        assert!(store.contains(&root, "b"));
    }

    #[test]
    fn delete_removes_object() {
        let store = InMemoryBackingStore::new();
        let root = store.root_object();
        store.create_object(&root, "temp").unwrap();
        store.delete_object(&root, "temp").unwrap();
        assert!(store.is_empty());
        assert!(matches!(
            store.delete_object(&root, "temp"),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn recreated_object_gets_a_new_identity() {
        let store = InMemoryBackingStore::new();
        let root = store.root_object();
        let first = store.create_object(&root, "temp").unwrap();
        store.delete_object(&root, "temp").unwrap();
        let second = store.create_object(&root, "temp").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn filters_default_to_none() {
        let store = InMemoryBackingStore::new();
        let root = store.root_object();
        store.create_object(&root, "plain").unwrap();
        assert_eq!(store.filter_pipeline(&root, "plain").unwrap(), None);
    }

    #[test]
    fn default_filters_apply_to_new_objects() {
        let pipeline = FilterPipeline::new().with("deflate", vec![5]);
        let store = InMemoryBackingStore::new().with_default_filters(pipeline.clone());
        let root = store.root_object();
        store.create_object(&root, "packed").unwrap();
        assert_eq!(store.filter_pipeline(&root, "packed").unwrap(), Some(pipeline));
    }

    #[test]
    fn seeded_objects_can_be_opened() {
        let store = InMemoryBackingStore::new();
        let root = store.root_object();
        let pipeline = FilterPipeline::new().with("lzo", vec![1]);
        let id = store.seed_object(&root, "old", Some(pipeline.clone())).unwrap();
        assert_eq!(store.open_object(&root, "old").unwrap(), id);
        assert_eq!(store.filter_pipeline(&root, "old").unwrap(), Some(pipeline));

        store.set_filters(&root, "old", None).unwrap();
        assert_eq!(store.filter_pipeline(&root, "old").unwrap(), None);
    }

    #[test]
    fn injected_fault_fails_once() {
        let store = InMemoryBackingStore::new();
        let root = store.root_object();
        store.fail_next(StoreOp::Create);
        let err = store.create_object(&root, "temp").unwrap_err();
        assert!(matches!(err, StoreError::Unavailable { operation: "create", .. }));
        assert!(store.is_empty());
        store.create_object(&root, "temp").unwrap();
    }
}
