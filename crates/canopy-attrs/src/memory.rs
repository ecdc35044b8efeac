//! In-memory attribute store for testing and ephemeral use.
//!
//! [`InMemoryAttributeStore`] keeps one `BTreeMap` per object identity, each
//! behind its own `RwLock`, so bindings opened for the same object share
//! their attributes. The store counts live bindings, which lets callers
//! check that every binding they opened was also closed.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use canopy_types::ObjectId;
use tracing::debug;

use crate::error::{AttrError, AttrResult};
use crate::traits::{AttributeBinding, AttributeStore};
use crate::value::AttrValue;

type AttrMap = Arc<RwLock<BTreeMap<String, AttrValue>>>;

/// An in-memory implementation of [`AttributeStore`].
#[derive(Debug, Default)]
pub struct InMemoryAttributeStore {
    sets: RwLock<HashMap<ObjectId, AttrMap>>,
    live: Arc<AtomicUsize>,
}

impl InMemoryAttributeStore {
    /// Create a new empty attribute store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bindings opened and not yet closed.
    pub fn live_bindings(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Number of objects with an attribute set, purged ones excluded.
    pub fn object_count(&self) -> AttrResult<usize> {
        let sets = self
            .sets
            .read()
            .map_err(|e| AttrError::Poisoned(e.to_string()))?;
        Ok(sets.len())
    }

    /// Snapshot of every attribute stored for `object`.
    pub fn attributes_of(&self, object: &ObjectId) -> AttrResult<BTreeMap<String, AttrValue>> {
        let sets = self
            .sets
            .read()
            .map_err(|e| AttrError::Poisoned(e.to_string()))?;
        let Some(values) = sets.get(object) else {
            return Ok(BTreeMap::new());
        };
        let values = values
            .read()
            .map_err(|e| AttrError::Poisoned(e.to_string()))?;
        Ok(values.clone())
    }
}

impl AttributeStore for InMemoryAttributeStore {
    fn open(&self, object: &ObjectId, path: &str) -> AttrResult<Box<dyn AttributeBinding>> {
        let mut sets = self
            .sets
            .write()
            .map_err(|e| AttrError::Poisoned(e.to_string()))?;
        let values = Arc::clone(sets.entry(*object).or_default());
        self.live.fetch_add(1, Ordering::SeqCst);
        debug!(object = %object.short_hex(), path, "attribute set opened");
        Ok(Box::new(InMemoryBinding {
            path: path.to_string(),
            values,
            live: Arc::clone(&self.live),
            open: true,
        }))
    }

    fn purge(&self, object: &ObjectId) -> AttrResult<bool> {
        let mut sets = self
            .sets
            .write()
            .map_err(|e| AttrError::Poisoned(e.to_string()))?;
        let purged = sets.remove(object).is_some();
        debug!(object = %object.short_hex(), purged, "attribute set purged");
        Ok(purged)
    }
}

/// A binding handed out by [`InMemoryAttributeStore`].
#[derive(Debug)]
pub struct InMemoryBinding {
    path: String,
    values: AttrMap,
    live: Arc<AtomicUsize>,
    open: bool,
}

impl InMemoryBinding {
    /// Path of the node this binding belongs to.
    pub fn path(&self) -> &str {
        &self.path
    }

    fn ensure_open(&self) -> AttrResult<()> {
        if self.open {
            Ok(())
        } else {
            Err(AttrError::Closed {
                path: self.path.clone(),
            })
        }
    }
}

impl AttributeBinding for InMemoryBinding {
    fn get(&self, key: &str) -> AttrResult<Option<AttrValue>> {
        self.ensure_open()?;
        let values = self
            .values
            .read()
            .map_err(|e| AttrError::Poisoned(e.to_string()))?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: AttrValue) -> AttrResult<()> {
        self.ensure_open()?;
        if key.is_empty() {
            return Err(AttrError::InvalidKey(key.to_string()));
        }
        let mut values = self
            .values
            .write()
            .map_err(|e| AttrError::Poisoned(e.to_string()))?;
        values.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> AttrResult<bool> {
        self.ensure_open()?;
        let mut values = self
            .values
            .write()
            .map_err(|e| AttrError::Poisoned(e.to_string()))?;
        Ok(values.remove(key).is_some())
    }

    fn keys(&self) -> AttrResult<Vec<String>> {
        self.ensure_open()?;
        let values = self
            .values
            .read()
            .map_err(|e| AttrError::Poisoned(e.to_string()))?;
        Ok(values.keys().cloned().collect())
    }

    fn relocate(&mut self, path: &str) {
        self.path = path.to_string();
    }

    fn close(&mut self) -> AttrResult<()> {
        self.ensure_open()?;
        self.open = false;
        self.live.fetch_sub(1, Ordering::SeqCst);
        debug!(path = %self.path, "attribute set closed");
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }
}
