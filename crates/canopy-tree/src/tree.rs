//! The tree registry and node lifecycle.
//!
//! [`Tree`] owns every group and leaf in an arena keyed by handle and keeps
//! four indices in step with it:
//!
//! - per group: `children` (simple name → leaf or group) and `leaves`
//!   (simple name → leaf)
//! - tree-wide: `leaves_by_path` (every leaf) and `objects_by_path` (every
//!   leaf and group, including the root at `/`)
//!
//! # Invariants
//!
//! After every successful operation, for each attached leaf:
//!
//! - its parent's `children[name]` and `leaves[name]` are the leaf, and both
//!   `leaves_by_path[path]` and `objects_by_path[path]` are the leaf;
//! - `path` is the parent's path joined with `name`, so paths are unique;
//! - no two siblings share a name;
//! - the leaf holds an open attribute binding.
//!
//! Mutations take `&mut self`, so callers sharing a tree across threads must
//! wrap it in a single lock.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use canopy_attrs::{AttributeBinding, AttributeStore, TITLE};
use canopy_store::BackingStore;
use canopy_types::{Compression, ObjectId};
use tracing::{debug, info, warn};

use crate::config::TreeConfig;
use crate::error::{TreeError, TreeResult};
use crate::filters::decode_filters;
use crate::group::{Group, GroupId, NodeRef};
use crate::leaf::{Leaf, LeafId, LeafState};
use crate::names::{join_path, NameTranslator, TranslationMap};

/// How much of a prospective child name `check_new_child` verifies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum NameCheck {
    /// Only name legality; the caller vouches for uniqueness.
    ValidOnly,
    /// No sibling may use the name or its storage name.
    Unused,
    /// As `Unused`, and the backing store must not hold the storage name.
    Absent,
}

/// Close a binding the tree is letting go of; a failure is only logged.
fn close_quietly(mut binding: Box<dyn AttributeBinding>, path: &str) {
    if let Err(e) = binding.close() {
        warn!(path, error = %e, "failed to close attribute set");
    }
}

/// In-memory mirror of a hierarchical container.
pub struct Tree {
    config: TreeConfig,
    store: Arc<dyn BackingStore>,
    attrs: Arc<dyn AttributeStore>,
    names: Arc<dyn NameTranslator>,
    groups: HashMap<GroupId, Group>,
    leaves: HashMap<LeafId, Leaf>,
    leaves_by_path: BTreeMap<String, LeafId>,
    objects_by_path: BTreeMap<String, NodeRef>,
    root: GroupId,
    next_id: u64,
}

impl std::fmt::Debug for Tree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tree")
            .field("groups", &self.groups.len())
            .field("leaves", &self.leaves.len())
            .field("config", &self.config)
            .finish()
    }
}

impl Tree {
    /// Create a tree with the default configuration.
    pub fn new(store: Arc<dyn BackingStore>, attrs: Arc<dyn AttributeStore>) -> Self {
        let config = TreeConfig::default();
        let names = Arc::new(TranslationMap::unchecked(&config));
        Self::assemble(store, attrs, config, names)
    }

    /// Create a tree holding only the root group.
    ///
    /// Fails with [`TreeError::InvalidTranslation`] if the configured
    /// translation table is unusable.
    pub fn with_config(
        store: Arc<dyn BackingStore>,
        attrs: Arc<dyn AttributeStore>,
        config: TreeConfig,
    ) -> TreeResult<Self> {
        let names = Arc::new(TranslationMap::from_config(&config)?);
        Ok(Self::assemble(store, attrs, config, names))
    }

    fn assemble(
        store: Arc<dyn BackingStore>,
        attrs: Arc<dyn AttributeStore>,
        config: TreeConfig,
        names: Arc<dyn NameTranslator>,
    ) -> Self {
        let root = GroupId(0);
        let mut groups = HashMap::new();
        groups.insert(root, Group::root(store.root_object()));
        let mut objects_by_path = BTreeMap::new();
        objects_by_path.insert("/".to_string(), NodeRef::Group(root));
        Self {
            config,
            store,
            attrs,
            names,
            groups,
            leaves: HashMap::new(),
            leaves_by_path: BTreeMap::new(),
            objects_by_path,
            root,
            next_id: 1,
        }
    }

    /// Replace the name translator built from the configuration.
    pub fn with_translator(mut self, names: Arc<dyn NameTranslator>) -> Self {
        self.names = names;
        self
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    pub fn root(&self) -> GroupId {
        self.root
    }

    // ---------------------------------------------------------------
    // Lookups
    // ---------------------------------------------------------------

    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.get(&id)
    }

    pub fn leaf(&self, id: LeafId) -> Option<&Leaf> {
        self.leaves.get(&id)
    }

    pub fn leaf_mut(&mut self, id: LeafId) -> Option<&mut Leaf> {
        self.leaves.get_mut(&id)
    }

    /// The leaf registered at `path`, via the leaf-only registry.
    pub fn leaf_by_path(&self, path: &str) -> Option<&Leaf> {
        self.leaves_by_path
            .get(path)
            .and_then(|id| self.leaves.get(id))
    }

    pub fn leaf_id_by_path(&self, path: &str) -> Option<LeafId> {
        self.leaves_by_path.get(path).copied()
    }

    /// Any node registered at `path`.
    pub fn object_by_path(&self, path: &str) -> Option<NodeRef> {
        self.objects_by_path.get(path).copied()
    }

    pub fn group_by_path(&self, path: &str) -> Option<GroupId> {
        self.object_by_path(path).and_then(|node| node.as_group())
    }

    /// Paths of all attached leaves, sorted.
    pub fn leaf_paths(&self) -> impl Iterator<Item = &str> {
        self.leaves_by_path.keys().map(String::as_str)
    }

    /// Number of attached leaves.
    pub fn leaf_count(&self) -> usize {
        self.leaves_by_path.len()
    }

    /// Number of registered nodes, groups and root included.
    pub fn object_count(&self) -> usize {
        self.objects_by_path.len()
    }

    /// Diagnostic line for a leaf (see [`Leaf`]'s `Display`).
    pub fn describe(&self, id: LeafId) -> TreeResult<String> {
        Ok(self.live_leaf(id)?.to_string())
    }

    fn describe_node(&self, node: NodeRef) -> String {
        match node {
            NodeRef::Leaf(id) => self
                .leaves
                .get(&id)
                .map(ToString::to_string)
                .unwrap_or_else(|| id.to_string()),
            NodeRef::Group(id) => self
                .groups
                .get(&id)
                .map(ToString::to_string)
                .unwrap_or_else(|| id.to_string()),
        }
    }

    fn live_leaf(&self, id: LeafId) -> TreeResult<&Leaf> {
        self.leaves.get(&id).ok_or(TreeError::LeafNotFound(id))
    }

    fn live_group(&self, id: GroupId) -> TreeResult<&Group> {
        self.groups.get(&id).ok_or(TreeError::GroupNotFound(id))
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn storage_name_of(&self, node: NodeRef) -> Option<&str> {
        match node {
            NodeRef::Leaf(id) => self.leaves.get(&id).map(Leaf::storage_name),
            NodeRef::Group(id) => self.groups.get(&id).map(Group::storage_name),
        }
    }

    /// Validate `name` and make sure it is free under `parent`.
    ///
    /// A name is taken when a sibling uses it, when a sibling is stored
    /// under the same storage name, or (for [`NameCheck::Absent`]) when the
    /// backing store still holds an object with that storage name, such as
    /// the object of a closed leaf.
    fn check_new_child(
        &self,
        parent: &Group,
        name: &str,
        storage_name: &str,
        check: NameCheck,
    ) -> TreeResult<()> {
        self.names.check_name_validity(name)?;
        if check == NameCheck::ValidOnly {
            return Ok(());
        }
        let duplicate = |sibling: String| TreeError::DuplicateName {
            name: name.to_string(),
            sibling,
        };
        if let Some(existing) = parent.child(name) {
            return Err(duplicate(self.describe_node(existing)));
        }
        if let Some(existing) = parent
            .children
            .values()
            .copied()
            .find(|node| self.storage_name_of(*node) == Some(storage_name))
        {
            return Err(duplicate(self.describe_node(existing)));
        }
        if check == NameCheck::Absent && self.store.exists(&parent.object_id(), storage_name)? {
            return Err(duplicate(format!(
                "stored object {storage_name:?} under {}",
                parent.path()
            )));
        }
        Ok(())
    }

    // ---------------------------------------------------------------
    // Groups
    // ---------------------------------------------------------------

    /// Create a new group under `parent`.
    pub fn create_group(&mut self, parent: GroupId, name: &str) -> TreeResult<GroupId> {
        self.add_group(parent, name, true)
    }

    /// Register a group that already exists in the backing store.
    pub fn open_group(&mut self, parent: GroupId, name: &str) -> TreeResult<GroupId> {
        self.add_group(parent, name, false)
    }

    fn add_group(&mut self, parent: GroupId, name: &str, is_new: bool) -> TreeResult<GroupId> {
        let group = self.live_group(parent)?;
        let storage_name = self.names.to_storage_name(name);
        let check = if is_new {
            NameCheck::Absent
        } else {
            NameCheck::Unused
        };
        self.check_new_child(group, name, &storage_name, check)?;
        let path = join_path(group.path(), name);
        let parent_object = group.object_id();

        let object_id = if is_new {
            self.store.create_object(&parent_object, &storage_name)?
        } else {
            self.store.open_object(&parent_object, &storage_name)?
        };

        let id = GroupId(self.next_id());
        if self.objects_by_path.contains_key(&path) {
            return Err(TreeError::InconsistentTree(format!(
                "path {path} already registered"
            )));
        }
        self.objects_by_path.insert(path.clone(), NodeRef::Group(id));
        let group = self
            .groups
            .get_mut(&parent)
            .ok_or(TreeError::GroupNotFound(parent))?;
        group.children.insert(name.to_string(), NodeRef::Group(id));
        group.child_count += 1;
        self.groups.insert(
            id,
            Group::child_group(name, storage_name, path.clone(), object_id, parent),
        );
        debug!(group = %id, path = %path, "group registered");
        Ok(id)
    }

    // ---------------------------------------------------------------
    // Leaf lifecycle
    // ---------------------------------------------------------------

    /// Attach an unattached leaf under `parent` as `name`.
    ///
    /// A fresh leaf gets its backing-store object created, a reopened leaf is
    /// bound to the existing object. The attribute binding is opened and the
    /// filter pipeline decoded before any index is touched, so a failure in
    /// either leaves the tree unchanged (a freshly created object is deleted
    /// again).
    pub fn attach(&mut self, mut leaf: Leaf, parent: GroupId, name: &str) -> TreeResult<LeafId> {
        if leaf.state() != LeafState::Unattached {
            return Err(TreeError::AlreadyAttached {
                path: leaf.path().to_string(),
            });
        }

        let group = self.live_group(parent)?;
        let storage_name = self.names.to_storage_name(name);
        let check = match (self.config.check_unique_on_attach, leaf.is_new()) {
            (false, _) => NameCheck::ValidOnly,
            (true, true) => NameCheck::Absent,
            (true, false) => NameCheck::Unused,
        };
        self.check_new_child(group, name, &storage_name, check)?;
        let path = join_path(group.path(), name);
        let parent_object = group.object_id();

        let object_id = if leaf.is_new() {
            self.store.create_object(&parent_object, &storage_name)?
        } else {
            self.store.open_object(&parent_object, &storage_name)?
        };

        let (binding, compression) =
            match self.prepare_attach(&mut leaf, &object_id, &parent_object, &storage_name, &path) {
                Ok(prepared) => prepared,
                Err(e) => {
                    self.discard_created(&leaf, &parent_object, &storage_name, &path);
                    return Err(e);
                }
            };

        let id = LeafId(self.next_id());
        if let Err(e) = self.register(id, parent, name, &path) {
            close_quietly(binding, &path);
            self.discard_created(&leaf, &parent_object, &storage_name, &path);
            return Err(e);
        }

        leaf.relocate(name, storage_name, path.clone());
        leaf.object_id = object_id;
        leaf.parent = Some(parent);
        leaf.attrs = Some(binding);
        leaf.compression = compression;
        leaf.state = LeafState::Attached;
        self.groups
            .get_mut(&parent)
            .ok_or(TreeError::GroupNotFound(parent))?
            .child_count += 1;
        self.leaves.insert(id, leaf);

        info!(leaf = %id, path = %path, object = %object_id.short_hex(), "leaf attached");
        Ok(id)
    }

    /// Open the attribute binding, write the initial title of a fresh leaf,
    /// and decode its filters. The binding is closed again on failure.
    fn prepare_attach(
        &self,
        leaf: &mut Leaf,
        object_id: &ObjectId,
        parent_object: &ObjectId,
        storage_name: &str,
        path: &str,
    ) -> TreeResult<(Box<dyn AttributeBinding>, Compression)> {
        let mut binding = self.attrs.open(object_id, path)?;
        let decoded = (|| {
            if leaf.is_new() {
                if let Some(title) = leaf.initial_title.take() {
                    binding.set(TITLE, title.into())?;
                }
            }
            let filters = self.store.filter_pipeline(parent_object, storage_name)?;
            Ok::<_, TreeError>(decode_filters(filters.as_ref()))
        })();
        match decoded {
            Ok(compression) => Ok((binding, compression)),
            Err(e) => {
                close_quietly(binding, path);
                Err(e)
            }
        }
    }

    /// Delete the object a fresh leaf created before its attach failed.
    fn discard_created(&self, leaf: &Leaf, parent_object: &ObjectId, storage_name: &str, path: &str) {
        if !leaf.is_new() {
            return;
        }
        if let Err(e) = self.store.delete_object(parent_object, storage_name) {
            warn!(path, error = %e, "failed to delete object of aborted attach");
        }
    }

    /// Rename a leaf within its parent group.
    ///
    /// The backing-store relink runs before any index changes, so a store
    /// failure leaves the tree exactly as it was. The object identity is
    /// preserved.
    pub fn rename_leaf(&mut self, id: LeafId, new_name: &str) -> TreeResult<()> {
        let leaf = self.live_leaf(id)?;
        let parent = leaf.parent().ok_or_else(|| TreeError::NotAttached {
            path: leaf.path().to_string(),
        })?;
        let group = self.live_group(parent)?;
        let new_storage_name = self.names.to_storage_name(new_name);
        self.check_new_child(group, new_name, &new_storage_name, NameCheck::Absent)?;

        let old_name = leaf.name().to_string();
        let old_path = leaf.path().to_string();
        let old_storage_name = leaf.storage_name().to_string();
        let new_path = join_path(group.path(), new_name);

        if new_storage_name != old_storage_name {
            self.store
                .relink_object(&group.object_id(), &old_storage_name, &new_storage_name)?;
        }

        self.unregister(id, parent, &old_name, &old_path)?;
        self.leaves
            .get_mut(&id)
            .ok_or(TreeError::LeafNotFound(id))?
            .relocate(new_name, new_storage_name, new_path.clone());
        self.register(id, parent, new_name, &new_path)?;

        info!(leaf = %id, from = %old_path, to = %new_path, "leaf renamed");
        Ok(())
    }

    /// Flush a leaf and detach it, keeping its backing-store object.
    ///
    /// Returns the detached leaf; its handle is no longer valid.
    pub fn close_leaf(&mut self, id: LeafId) -> TreeResult<Leaf> {
        self.leaves
            .get_mut(&id)
            .ok_or(TreeError::LeafNotFound(id))?
            .flush()?;
        self.detach(id, LeafState::Closed)
    }

    /// Delete a leaf's backing-store object, then detach it and discard its
    /// attributes.
    ///
    /// If the store refuses the delete nothing else happens.
    pub fn remove_leaf(&mut self, id: LeafId) -> TreeResult<Leaf> {
        let leaf = self.live_leaf(id)?;
        let parent = leaf.parent().ok_or_else(|| TreeError::NotAttached {
            path: leaf.path().to_string(),
        })?;
        let parent_object = self.live_group(parent)?.object_id();
        self.store
            .delete_object(&parent_object, leaf.storage_name())?;

        if let Some(leaf) = self.leaves.get_mut(&id) {
            if let Err(e) = leaf.flush() {
                warn!(leaf = %id, error = %e, "flush failed for removed leaf");
            }
        }
        let removed = self.detach(id, LeafState::Removed)?;
        if let Err(e) = self.attrs.purge(&removed.object_id()) {
            warn!(leaf = %id, error = %e, "failed to purge attributes of removed leaf");
        }
        Ok(removed)
    }

    /// Flush every attached leaf.
    pub fn flush(&mut self) -> TreeResult<()> {
        for leaf in self.leaves.values_mut() {
            leaf.flush()?;
        }
        Ok(())
    }

    /// Close every attached leaf, deepest paths first.
    ///
    /// Returns how many leaves were closed. Groups stay registered.
    pub fn close(&mut self) -> TreeResult<usize> {
        let mut by_depth: Vec<(&str, LeafId)> = self
            .leaves_by_path
            .iter()
            .map(|(path, id)| (path.as_str(), *id))
            .collect();
        by_depth.sort_by_key(|(path, _)| std::cmp::Reverse(path.matches('/').count()));
        let ids: Vec<LeafId> = by_depth.into_iter().map(|(_, id)| id).collect();
        for id in &ids {
            self.close_leaf(*id)?;
        }
        info!(closed = ids.len(), "tree closed");
        Ok(ids.len())
    }

    fn detach(&mut self, id: LeafId, state: LeafState) -> TreeResult<Leaf> {
        let leaf = self.live_leaf(id)?;
        let parent = leaf.parent().ok_or_else(|| TreeError::NotAttached {
            path: leaf.path().to_string(),
        })?;
        let name = leaf.name().to_string();
        let path = leaf.path().to_string();

        self.unregister(id, parent, &name, &path)?;
        let group = self
            .groups
            .get_mut(&parent)
            .ok_or(TreeError::GroupNotFound(parent))?;
        group.child_count = group.child_count.checked_sub(1).ok_or_else(|| {
            TreeError::InconsistentTree(format!("child count of {} underflowed", group.path))
        })?;

        let mut leaf = self.leaves.remove(&id).ok_or(TreeError::LeafNotFound(id))?;
        leaf.parent = None;
        leaf.state = state;
        if let Some(attrs) = leaf.attrs.take() {
            close_quietly(attrs, &path);
        }

        info!(leaf = %id, path = %path, state = ?state, "leaf detached");
        Ok(leaf)
    }

    // ---------------------------------------------------------------
    // Index maintenance
    // ---------------------------------------------------------------

    fn register(&mut self, id: LeafId, parent: GroupId, name: &str, path: &str) -> TreeResult<()> {
        if self.objects_by_path.contains_key(path) || self.leaves_by_path.contains_key(path) {
            return Err(TreeError::InconsistentTree(format!(
                "path {path} already registered"
            )));
        }
        let group = self
            .groups
            .get_mut(&parent)
            .ok_or(TreeError::GroupNotFound(parent))?;
        if group.children.contains_key(name) {
            return Err(TreeError::InconsistentTree(format!(
                "{} already has a child named {name:?}",
                group.path
            )));
        }
        group.children.insert(name.to_string(), NodeRef::Leaf(id));
        group.leaves.insert(name.to_string(), id);
        self.leaves_by_path.insert(path.to_string(), id);
        self.objects_by_path.insert(path.to_string(), NodeRef::Leaf(id));
        Ok(())
    }

    /// Remove every index entry of a leaf. All four removals are attempted;
    /// any entry that was missing or pointed elsewhere is reported.
    fn unregister(&mut self, id: LeafId, parent: GroupId, name: &str, path: &str) -> TreeResult<()> {
        let group = self
            .groups
            .get_mut(&parent)
            .ok_or(TreeError::GroupNotFound(parent))?;
        let mut missing = Vec::new();
        if group.children.remove(name) != Some(NodeRef::Leaf(id)) {
            missing.push("children");
        }
        if group.leaves.remove(name) != Some(id) {
            missing.push("leaves");
        }
        if self.leaves_by_path.remove(path) != Some(id) {
            missing.push("leaves_by_path");
        }
        if self.objects_by_path.remove(path) != Some(NodeRef::Leaf(id)) {
            missing.push("objects_by_path");
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(TreeError::InconsistentTree(format!(
                "{id} at {path} was not registered in {}",
                missing.join(", ")
            )))
        }
    }

    /// Verify every index invariant, reporting the first violation found.
    pub fn check_invariants(&self) -> TreeResult<()> {
        let fail = |msg: String| Err(TreeError::InconsistentTree(msg));

        for (id, leaf) in &self.leaves {
            let Some(parent) = leaf.parent().and_then(|p| self.groups.get(&p)) else {
                return fail(format!("{id} has no live parent"));
            };
            if leaf.path() != join_path(parent.path(), leaf.name()) {
                return fail(format!("{id} path {} does not match its parent", leaf.path()));
            }
            if parent.child(leaf.name()) != Some(NodeRef::Leaf(*id))
                || parent.leaf(leaf.name()) != Some(*id)
            {
                return fail(format!("{id} missing from children of {}", parent.path()));
            }
            if self.leaves_by_path.get(leaf.path()) != Some(id)
                || self.objects_by_path.get(leaf.path()) != Some(&NodeRef::Leaf(*id))
            {
                return fail(format!("{id} missing from path registries"));
            }
            if !leaf.has_attrs() || !leaf.is_attached() {
                return fail(format!("{id} attached without a live attribute set"));
            }
        }

        if self.leaves_by_path.len() != self.leaves.len() {
            return fail("leaf registry size differs from leaf count".into());
        }
        if self.objects_by_path.len() != self.leaves.len() + self.groups.len() {
            return fail("object registry size differs from node count".into());
        }
        for group in self.groups.values() {
            if group.child_count() != group.children.len() {
                return fail(format!("child count of {} is off", group.path()));
            }
        }
        Ok(())
    }
}
