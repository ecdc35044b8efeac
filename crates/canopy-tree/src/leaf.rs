//! The leaf node entity and the payload-kind interface.
//!
//! A [`Leaf`] carries everything the tree needs to know about a node that is
//! not a group: its names and path, the backing-store identity, the cached
//! compression settings, and its attribute binding. Kind-specific behaviour
//! (arrays, tables, ...) lives behind the [`LeafKind`] trait.

use std::fmt;

use canopy_attrs::{AttrValue, AttributeBinding, TITLE};
use canopy_types::{ByteOrder, Compression, ObjectId, Shape};
use serde::{Deserialize, Serialize};

use crate::error::{TreeError, TreeResult};
use crate::group::GroupId;

/// Handle to a leaf owned by a [`Tree`](crate::Tree).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LeafId(pub(crate) u64);

impl fmt::Display for LeafId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "leaf#{}", self.0)
    }
}

/// Lifecycle state of a leaf. `Closed` and `Removed` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LeafState {
    Unattached,
    Attached,
    Closed,
    Removed,
}

/// Payload-specific behaviour of a leaf.
pub trait LeafKind: Send + Sync + fmt::Debug {
    /// Name of the kind, shown in diagnostics (e.g. `Array`, `Table`).
    fn kind_name(&self) -> &str;

    fn shape(&self) -> Shape;

    fn byte_order(&self) -> ByteOrder {
        ByteOrder::Irrelevant
    }

    /// Write out any buffered payload. Called before the leaf is closed.
    fn flush(&mut self) -> TreeResult<()> {
        Ok(())
    }
}

/// A payload kind with fixed metadata and nothing to flush.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlainLeaf {
    pub kind_name: String,
    pub shape: Shape,
    pub byte_order: ByteOrder,
}

impl PlainLeaf {
    pub fn new(kind_name: impl Into<String>, shape: impl Into<Shape>) -> Self {
        Self {
            kind_name: kind_name.into(),
            shape: shape.into(),
            byte_order: ByteOrder::Irrelevant,
        }
    }

    pub fn with_byte_order(mut self, byte_order: ByteOrder) -> Self {
        self.byte_order = byte_order;
        self
    }
}

impl LeafKind for PlainLeaf {
    fn kind_name(&self) -> &str {
        &self.kind_name
    }

    fn shape(&self) -> Shape {
        self.shape.clone()
    }

    fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }
}

/// Serializable snapshot of a leaf for diagnostics.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LeafInfo {
    pub name: String,
    pub storage_name: String,
    pub path: String,
    pub kind: String,
    pub shape: Shape,
    pub byte_order: ByteOrder,
    pub compression: Compression,
    pub object_id: ObjectId,
    pub state: LeafState,
    pub title: Option<String>,
}

/// One non-group node of the tree.
///
/// Built unattached with [`Leaf::create`] (new content) or [`Leaf::open`]
/// (existing backing-store object), then handed to
/// [`Tree::attach`](crate::Tree::attach). Once closed or removed the leaf
/// keeps its last names and identity but has no parent and no attributes.
pub struct Leaf {
    pub(crate) name: String,
    pub(crate) storage_name: String,
    pub(crate) path: String,
    pub(crate) object_id: ObjectId,
    pub(crate) is_new: bool,
    pub(crate) state: LeafState,
    pub(crate) compression: Compression,
    pub(crate) parent: Option<GroupId>,
    pub(crate) attrs: Option<Box<dyn AttributeBinding>>,
    pub(crate) initial_title: Option<String>,
    kind: Box<dyn LeafKind>,
}

impl Leaf {
    /// A leaf whose backing-store object will be created on attach.
    pub fn create(kind: impl LeafKind + 'static) -> Self {
        Self::unattached(Box::new(kind), true)
    }

    /// A leaf bound on attach to an object that already exists.
    pub fn open(kind: impl LeafKind + 'static) -> Self {
        Self::unattached(Box::new(kind), false)
    }

    fn unattached(kind: Box<dyn LeafKind>, is_new: bool) -> Self {
        Self {
            name: String::new(),
            storage_name: String::new(),
            path: String::new(),
            object_id: ObjectId::null(),
            is_new,
            state: LeafState::Unattached,
            compression: Compression::default(),
            parent: None,
            attrs: None,
            initial_title: None,
            kind,
        }
    }

    /// Title written to the attribute set when a fresh leaf is attached.
    /// Ignored for reopened leaves, which keep their stored title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.initial_title = Some(title.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn storage_name(&self) -> &str {
        &self.storage_name
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Backing-store identity; null until attached.
    pub fn object_id(&self) -> ObjectId {
        self.object_id
    }

    /// Whether the backing-store object is created (rather than opened) on attach.
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub fn state(&self) -> LeafState {
        self.state
    }

    pub fn is_attached(&self) -> bool {
        self.state == LeafState::Attached
    }

    /// Compression settings decoded when the leaf was attached.
    pub fn compression(&self) -> &Compression {
        &self.compression
    }

    pub fn parent(&self) -> Option<GroupId> {
        self.parent
    }

    pub fn kind_name(&self) -> &str {
        self.kind.kind_name()
    }

    pub fn shape(&self) -> Shape {
        self.kind.shape()
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.kind.byte_order()
    }

    pub fn kind(&self) -> &dyn LeafKind {
        self.kind.as_ref()
    }

    pub fn kind_mut(&mut self) -> &mut dyn LeafKind {
        self.kind.as_mut()
    }

    /// Returns `true` while the leaf holds a live attribute binding.
    pub fn has_attrs(&self) -> bool {
        self.attrs.as_ref().is_some_and(|a| a.is_open())
    }

    fn binding(&self) -> TreeResult<&dyn AttributeBinding> {
        self.attrs
            .as_deref()
            .ok_or_else(|| TreeError::NotAttached {
                path: self.path.clone(),
            })
    }

    // ---------------------------------------------------------------
    // Attributes
    // ---------------------------------------------------------------

    /// Read an attribute. Missing keys read as `None`.
    pub fn get_attr(&self, key: &str) -> TreeResult<Option<AttrValue>> {
        Ok(self.binding()?.get(key)?)
    }

    pub fn set_attr(&self, key: &str, value: impl Into<AttrValue>) -> TreeResult<()> {
        Ok(self.binding()?.set(key, value.into())?)
    }

    /// Names of all attributes, sorted.
    pub fn attr_keys(&self) -> TreeResult<Vec<String>> {
        Ok(self.binding()?.keys()?)
    }

    /// The title, read from the `TITLE` attribute on every call.
    pub fn get_title(&self) -> TreeResult<Option<String>> {
        Ok(self.get_attr(TITLE)?.map(|value| match value {
            AttrValue::Str(s) => s,
            other => other.to_string(),
        }))
    }

    /// Write the `TITLE` attribute.
    pub fn set_title(&self, title: impl Into<String>) -> TreeResult<()> {
        self.set_attr(TITLE, title.into())
    }

    /// Write out buffered payload state.
    pub fn flush(&mut self) -> TreeResult<()> {
        self.kind.flush()
    }

    pub fn info(&self) -> LeafInfo {
        LeafInfo {
            name: self.name.clone(),
            storage_name: self.storage_name.clone(),
            path: self.path.clone(),
            kind: self.kind_name().to_string(),
            shape: self.shape(),
            byte_order: self.byte_order(),
            compression: self.compression.clone(),
            object_id: self.object_id,
            state: self.state,
            title: self.get_title().ok().flatten(),
        }
    }

    pub(crate) fn relocate(&mut self, name: &str, storage_name: String, path: String) {
        self.name = name.to_string();
        self.storage_name = storage_name;
        self.path = path;
        if let Some(attrs) = self.attrs.as_mut() {
            attrs.relocate(&self.path);
        }
    }
}

impl fmt::Debug for Leaf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Leaf")
            .field("path", &self.path)
            .field("storage_name", &self.storage_name)
            .field("object_id", &self.object_id)
            .field("state", &self.state)
            .field("compression", &self.compression)
            .field("kind", &self.kind)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canopy_attrs::{AttributeStore, InMemoryAttributeStore};

    fn array(dims: Vec<u64>) -> PlainLeaf {
        PlainLeaf::new("Array", dims)
    }

    #[test]
    fn create_and_open_set_is_new() {
        assert!(Leaf::create(array(vec![3])).is_new());
        assert!(!Leaf::open(array(vec![3])).is_new());
    }

    #[test]
    fn unattached_leaf_has_no_identity() {
        let leaf = Leaf::create(array(vec![3]));
        assert_eq!(leaf.state(), LeafState::Unattached);
        assert!(leaf.object_id().is_null());
        assert!(leaf.parent().is_none());
        assert!(!leaf.has_attrs());
    }

    #[test]
    fn attribute_access_requires_binding() {
        let leaf = Leaf::create(array(vec![3]));
        assert!(matches!(leaf.get_title(), Err(TreeError::NotAttached { .. })));
        assert!(matches!(
            leaf.set_attr("units", "m"),
            Err(TreeError::NotAttached { .. })
        ));
    }

    #[test]
    fn title_delegates_to_binding() {
        let store = InMemoryAttributeStore::new();
        let id = ObjectId::from_bytes(b"leaf");
        let mut leaf = Leaf::create(array(vec![3]));
        leaf.attrs = Some(store.open(&id, "/leaf").unwrap());

        assert_eq!(leaf.get_title().unwrap(), None);
        leaf.set_title("X").unwrap();
        assert_eq!(leaf.get_title().unwrap().as_deref(), Some("X"));
        assert_eq!(
            store.attributes_of(&id).unwrap().get(TITLE),
            Some(&AttrValue::from("X"))
        );
    }

    #[test]
    fn non_string_title_is_rendered() {
        let store = InMemoryAttributeStore::new();
        let mut leaf = Leaf::create(array(vec![3]));
        leaf.attrs = Some(store.open(&ObjectId::from_bytes(b"l"), "/l").unwrap());
        leaf.set_attr(TITLE, 42i64).unwrap();
        assert_eq!(leaf.get_title().unwrap().as_deref(), Some("42"));
    }

    #[test]
    fn kind_metadata_is_exposed() {
        let leaf = Leaf::create(array(vec![3, 4]).with_byte_order(ByteOrder::Big));
        assert_eq!(leaf.kind_name(), "Array");
        assert_eq!(leaf.shape(), Shape::new(vec![3, 4]));
        assert_eq!(leaf.byte_order(), ByteOrder::Big);
    }

    #[test]
    fn info_serializes() {
        let leaf = Leaf::create(array(vec![2]));
        let json = serde_json::to_value(leaf.info()).unwrap();
        assert_eq!(json["kind"], "Array");
        assert_eq!(json["state"], "Unattached");
        assert_eq!(json["title"], serde_json::Value::Null);
    }
}
