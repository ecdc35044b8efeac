//! Backing-store interface for canopy.
//!
//! The backing store is the persistent container that actually holds object
//! bytes, hands out object identities, and records the filter pipeline
//! applied to each object's payload. The tree core only talks to it through
//! the [`BackingStore`] trait; objects are addressed by their parent's
//! identity plus their on-disk (storage) name.
//!
//! # Storage Backends
//!
//! - [`InMemoryBackingStore`] -- `HashMap`-based store for tests and embedding
//!
//! # Design Rules
//!
//! 1. Object identities are assigned by the store and never change on relink.
//! 2. Every operation either completes or fails; nothing blocks indefinitely.
//! 3. Failures are reported as [`StoreError`] and never retried by the store.

pub mod error;
pub mod memory;
pub mod pipeline;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use memory::{InMemoryBackingStore, StoreOp};
pub use pipeline::{FilterEntry, FilterPipeline};
pub use traits::BackingStore;
