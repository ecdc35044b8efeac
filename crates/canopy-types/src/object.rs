use std::fmt;

use serde::{Deserialize, Serialize};

/// Domain separator mixed into every derived identity.
const DERIVE_CONTEXT: &str = "canopy 2024 object identity v1";

/// Opaque identifier for an object held by a backing store.
///
/// Identities are assigned by the backing store when an object is created or
/// opened and never change for the lifetime of the in-memory node, including
/// across renames.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId([u8; 32]);

impl ObjectId {
    /// Compute an `ObjectId` from raw bytes.
    pub fn from_bytes(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    /// Derive a fresh identity for an object created under `parent`.
    ///
    /// `generation` is a store-wide counter, so re-creating an object with
    /// the same name after a delete yields a different identity.
    pub fn derive(parent: &ObjectId, storage_name: &str, generation: u64) -> Self {
        let mut hasher = blake3::Hasher::new_derive_key(DERIVE_CONTEXT);
        hasher.update(&parent.0);
        hasher.update(&(storage_name.len() as u64).to_le_bytes());
        hasher.update(storage_name.as_bytes());
        hasher.update(&generation.to_le_bytes());
        Self(*hasher.finalize().as_bytes())
    }

    /// The null object ID (all zeros). Represents "no object".
    pub const fn null() -> Self {
        Self([0u8; 32])
    }

    /// Returns `true` if this is the null object ID.
    pub fn is_null(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// The raw 32-byte identity.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hex-encoded string representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short hex representation (first 8 characters).
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.short_hex())
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}
