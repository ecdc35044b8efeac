//! Descriptive payload metadata: dimensions and byte order.
//!
//! Both types are opaque to the tree core. They are produced by the leaf's
//! payload kind and only rendered for diagnostics.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Dimension sizes of a leaf's payload.
///
/// Renders like a tuple: `()` for a scalar, `(3,)` for one dimension and
/// `(3, 4)` for more.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Shape(Vec<u64>);

impl Shape {
    /// Create a shape from its dimension sizes.
    pub fn new(dims: impl Into<Vec<u64>>) -> Self {
        Self(dims.into())
    }

    /// A zero-dimensional shape.
    pub fn scalar() -> Self {
        Self(Vec::new())
    }

    /// The dimension sizes.
    pub fn dims(&self) -> &[u64] {
        &self.0
    }

    /// Number of dimensions.
    pub fn rank(&self) -> usize {
        self.0.len()
    }

    /// Total number of elements (1 for a scalar).
    pub fn element_count(&self) -> u64 {
        self.0.iter().product()
    }
}

impl From<Vec<u64>> for Shape {
    fn from(dims: Vec<u64>) -> Self {
        Self(dims)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.as_slice() {
            [] => write!(f, "()"),
            [only] => write!(f, "({only},)"),
            [first, rest @ ..] => {
                write!(f, "({first}")?;
                for dim in rest {
                    write!(f, ", {dim}")?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Byte order of a leaf's payload.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ByteOrder {
    Little,
    Big,
    /// Single-byte or otherwise order-free payloads.
    #[default]
    Irrelevant,
}

impl ByteOrder {
    /// The byte order of the running machine.
    pub fn native() -> Self {
        if cfg!(target_endian = "big") {
            ByteOrder::Big
        } else {
            ByteOrder::Little
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ByteOrder::Little => "little",
            ByteOrder::Big => "big",
            ByteOrder::Irrelevant => "irrelevant",
        }
    }
}

impl fmt::Display for ByteOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ByteOrder {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "little" => Ok(ByteOrder::Little),
            "big" => Ok(ByteOrder::Big),
            "irrelevant" => Ok(ByteOrder::Irrelevant),
            other => Err(TypeError::UnknownByteOrder(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_renders_like_a_tuple() {
        assert_eq!(Shape::scalar().to_string(), "()");
        assert_eq!(Shape::new(vec![3]).to_string(), "(3,)");
        assert_eq!(Shape::new(vec![3, 4]).to_string(), "(3, 4)");
        assert_eq!(Shape::new(vec![2, 0, 7]).to_string(), "(2, 0, 7)");
    }

    #[test]
    fn element_count() {
        assert_eq!(Shape::scalar().element_count(), 1);
        assert_eq!(Shape::new(vec![3, 4]).element_count(), 12);
        assert_eq!(Shape::new(vec![3, 0]).element_count(), 0);
        assert_eq!(Shape::new(vec![3, 4]).rank(), 2);
    }

    #[test]
    fn byte_order_parses_its_own_names() {
        for order in [ByteOrder::Little, ByteOrder::Big, ByteOrder::Irrelevant] {
            assert_eq!(order.as_str().parse::<ByteOrder>().unwrap(), order);
        }
        assert_eq!(
            "middle".parse::<ByteOrder>(),
            Err(TypeError::UnknownByteOrder("middle".into()))
        );
    }

    #[test]
    fn byte_order_serializes_lowercase() {
        let json = serde_json::to_string(&ByteOrder::Big).unwrap();
        assert_eq!(json, "\"big\"");
    }
}
