//! Compression settings decoded from a backing-store filter pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Compression algorithm applied to a leaf's stored payload.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionLibrary {
    None,
    #[default]
    Zlib,
    Lzo,
    Ucl,
    /// A library this crate has no dedicated variant for.
    Other(String),
}

impl CompressionLibrary {
    pub fn as_str(&self) -> &str {
        match self {
            CompressionLibrary::None => "none",
            CompressionLibrary::Zlib => "zlib",
            CompressionLibrary::Lzo => "lzo",
            CompressionLibrary::Ucl => "ucl",
            CompressionLibrary::Other(name) => name,
        }
    }
}

impl fmt::Display for CompressionLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The normalized `(level, library, shuffle)` triple cached on every leaf.
///
/// The default is level 0 with the zlib library and shuffle disabled, which
/// is also what a leaf without any filters reports.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Compression {
    /// Compression level; 0 means uncompressed.
    pub level: u32,
    /// Library named by the last compression filter seen.
    pub library: CompressionLibrary,
    /// Whether a shuffle filter precedes compression.
    pub shuffle: bool,
}

impl Compression {
    pub fn new(level: u32, library: CompressionLibrary, shuffle: bool) -> Self {
        Self {
            level,
            library,
            shuffle,
        }
    }

    /// Returns `true` when the payload is stored compressed (`level > 0`).
    pub fn is_compressed(&self) -> bool {
        self.level > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_uncompressed_zlib() {
        let c = Compression::default();
        assert_eq!(c.level, 0);
        assert_eq!(c.library, CompressionLibrary::Zlib);
        assert!(!c.shuffle);
        assert!(!c.is_compressed());
    }

    #[test]
    fn library_names() {
        assert_eq!(CompressionLibrary::Lzo.to_string(), "lzo");
        assert_eq!(CompressionLibrary::None.to_string(), "none");
        assert_eq!(CompressionLibrary::Other("bzip2".into()).to_string(), "bzip2");
    }
}
