//! In-memory mirror of a hierarchical container.
//!
//! A [`Tree`] tracks the leaves and groups of a persisted container, keeping
//! its name and path indices consistent as leaves are attached, renamed,
//! closed, and removed. Each attached [`Leaf`] owns an attribute binding and
//! caches the compression settings decoded from its filter pipeline.
//!
//! # Architecture
//!
//! - **Backing store** ([`canopy_store::BackingStore`]) creates, opens,
//!   relinks, and deletes objects and reports their filter pipelines.
//! - **Attribute store** ([`canopy_attrs::AttributeStore`]) hands out one
//!   binding per attached leaf; the title is the `TITLE` attribute.
//! - **Name translation** ([`NameTranslator`]) validates names and maps
//!   them to storage names.
//!
//! # Lifecycle
//!
//! ```text
//! Leaf::create / Leaf::open ──attach──▶ Attached ──close_leaf──▶ Closed
//!                                          │ ▲
//!                                   rename_leaf
//!                                          │
//!                                          └──remove_leaf──▶ Removed
//! ```
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use canopy_attrs::InMemoryAttributeStore;
//! use canopy_store::InMemoryBackingStore;
//! use canopy_tree::{Leaf, PlainLeaf, Tree};
//!
//! let mut tree = Tree::new(
//!     Arc::new(InMemoryBackingStore::new()),
//!     Arc::new(InMemoryAttributeStore::new()),
//! );
//! let root = tree.root();
//! let id = tree
//!     .attach(Leaf::create(PlainLeaf::new("Array", vec![3])), root, "temp")
//!     .unwrap();
//! tree.rename_leaf(id, "sensor1").unwrap();
//! assert!(tree.leaf_by_path("/sensor1").is_some());
//! tree.remove_leaf(id).unwrap();
//! assert_eq!(tree.leaf_count(), 0);
//! ```

pub mod config;
pub mod display;
pub mod error;
pub mod filters;
pub mod group;
pub mod leaf;
pub mod names;
pub mod tree;

pub use config::TreeConfig;
pub use error::{TreeError, TreeResult};
pub use filters::decode_filters;
pub use group::{Group, GroupId, NodeRef};
pub use leaf::{Leaf, LeafId, LeafInfo, LeafKind, LeafState, PlainLeaf};
pub use names::{NameTranslator, TranslationMap};
pub use tree::Tree;
