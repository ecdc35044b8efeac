//! Per-node attribute stores for canopy.
//!
//! Every attached leaf owns one live [`AttributeBinding`], opened from an
//! [`AttributeStore`] when the leaf joins the tree and closed when it leaves.
//! A binding is a small key/value map scoped to one object. The reserved
//! [`TITLE`] key carries the leaf's title.
//!
//! # Modules
//!
//! - [`error`] — Error types for attribute operations
//! - [`value`] — [`AttrValue`], the stored value type
//! - [`traits`] — [`AttributeStore`] and [`AttributeBinding`]
//! - [`memory`] — In-memory [`InMemoryAttributeStore`]

pub mod error;
pub mod memory;
pub mod traits;
pub mod value;

pub use error::{AttrError, AttrResult};
pub use memory::{InMemoryAttributeStore, InMemoryBinding};
pub use traits::{AttributeBinding, AttributeStore};
pub use value::AttrValue;

/// Reserved attribute key holding a node's title.
pub const TITLE: &str = "TITLE";
