//! Groups: the directory-like parents leaves hang from.

use std::collections::BTreeMap;
use std::fmt;

use canopy_types::ObjectId;
use serde::{Deserialize, Serialize};

use crate::leaf::LeafId;

/// Handle to a group owned by a [`Tree`](crate::Tree).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupId(pub(crate) u64);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "group#{}", self.0)
    }
}

/// A child of a group: either a leaf or another group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeRef {
    Leaf(LeafId),
    Group(GroupId),
}

impl NodeRef {
    pub fn as_leaf(&self) -> Option<LeafId> {
        match self {
            NodeRef::Leaf(id) => Some(*id),
            NodeRef::Group(_) => None,
        }
    }

    pub fn as_group(&self) -> Option<GroupId> {
        match self {
            NodeRef::Group(id) => Some(*id),
            NodeRef::Leaf(_) => None,
        }
    }
}

/// A group node and its sibling-name indices.
#[derive(Clone, Debug)]
pub struct Group {
    pub(crate) name: String,
    pub(crate) storage_name: String,
    pub(crate) path: String,
    pub(crate) object_id: ObjectId,
    pub(crate) parent: Option<GroupId>,
    /// Every child (leaf or group), keyed by simple name.
    pub(crate) children: BTreeMap<String, NodeRef>,
    /// Leaf children only, keyed by simple name.
    pub(crate) leaves: BTreeMap<String, LeafId>,
    pub(crate) child_count: usize,
}

impl Group {
    pub(crate) fn root(object_id: ObjectId) -> Self {
        Self {
            name: "/".to_string(),
            storage_name: "/".to_string(),
            path: "/".to_string(),
            object_id,
            parent: None,
            children: BTreeMap::new(),
            leaves: BTreeMap::new(),
            child_count: 0,
        }
    }

    pub(crate) fn child_group(
        name: &str,
        storage_name: String,
        path: String,
        object_id: ObjectId,
        parent: GroupId,
    ) -> Self {
        Self {
            name: name.to_string(),
            storage_name,
            path,
            object_id,
            parent: Some(parent),
            children: BTreeMap::new(),
            leaves: BTreeMap::new(),
            child_count: 0,
        }
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

    pub fn object_id(&self) -> ObjectId {
        self.object_id
    }

    /// The containing group; `None` for the root.
    pub fn parent(&self) -> Option<GroupId> {
        self.parent
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Look up a direct child by simple name.
    pub fn child(&self, name: &str) -> Option<NodeRef> {
        self.children.get(name).copied()
    }

    /// Look up a direct leaf child by simple name.
    pub fn leaf(&self, name: &str) -> Option<LeafId> {
        self.leaves.get(name).copied()
    }

    /// Names of all direct children, sorted.
    pub fn child_names(&self) -> impl Iterator<Item = &str> {
        self.children.keys().map(String::as_str)
    }

    /// Number of attached children, maintained as leaves come and go.
    pub fn child_count(&self) -> usize {
        self.child_count
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Group)", self.path)
    }
}
