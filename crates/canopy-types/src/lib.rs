//! Foundation types for canopy.
//!
//! This crate provides the identity and descriptive metadata types shared by
//! every canopy crate. Every other canopy crate depends on `canopy-types`.
//!
//! # Key Types
//!
//! - [`ObjectId`] — Opaque identity assigned by the backing store to an object
//! - [`Shape`] — Dimension sizes of a leaf's payload
//! - [`ByteOrder`] — Byte order of a leaf's payload
//! - [`CompressionLibrary`] — Compression algorithm named by a filter pipeline
//! - [`Compression`] — Decoded `(level, library, shuffle)` settings of a leaf

pub mod compression;
pub mod error;
pub mod object;
pub mod shape;

pub use compression::{Compression, CompressionLibrary};
pub use error::TypeError;
pub use object::ObjectId;
pub use shape::{ByteOrder, Shape};
