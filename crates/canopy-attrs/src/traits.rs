//! The attribute store interface.
//!
//! An [`AttributeStore`] hands out one [`AttributeBinding`] per node. The
//! node owns its binding exclusively and closes it exactly once when it
//! leaves the tree.

use canopy_types::ObjectId;

use crate::error::AttrResult;
use crate::value::AttrValue;

/// Factory for per-object attribute bindings.
pub trait AttributeStore: Send + Sync {
    /// Open the attribute set of `object`, currently reachable at `path`.
    ///
    /// Attributes written through an earlier binding of the same object are
    /// visible through the new one.
    fn open(&self, object: &ObjectId, path: &str) -> AttrResult<Box<dyn AttributeBinding>>;

    /// Discard every attribute stored for `object` once the object itself
    /// has been deleted. Returns `true` if anything was stored.
    fn purge(&self, object: &ObjectId) -> AttrResult<bool>;
}

/// A live attribute set attached to one node.
pub trait AttributeBinding: Send + Sync {
    /// Read an attribute. Returns `Ok(None)` if the key is not set.
    fn get(&self, key: &str) -> AttrResult<Option<AttrValue>>;

    /// Write an attribute, replacing any previous value.
    fn set(&self, key: &str, value: AttrValue) -> AttrResult<()>;

    /// Delete an attribute. Returns `true` if it existed.
    fn remove(&self, key: &str) -> AttrResult<bool>;

    /// All attribute keys, sorted.
    fn keys(&self) -> AttrResult<Vec<String>>;

    /// Follow the owning node to a new path after a rename.
    fn relocate(&mut self, _path: &str) {}

    /// Release the binding. Calling this twice is a caller error.
    fn close(&mut self) -> AttrResult<()>;

    /// Returns `true` until `close` has been called.
    fn is_open(&self) -> bool;
}
