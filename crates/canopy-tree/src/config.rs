use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{TreeError, TreeResult};
use crate::names::SEPARATOR;

/// Name prefixes reserved for internal use and refused as node names.
pub const DEFAULT_RESERVED_PREFIXES: &[&str] = &["_v_", "_f_", "_g_", "_c_"];

/// Longest accepted node name, in bytes.
pub const DEFAULT_MAX_NAME_LEN: usize = 255;

/// Configuration for a [`Tree`](crate::Tree).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Whether attaching a node checks that no sibling already uses its
    /// name. When disabled the caller guarantees uniqueness, and a clash is
    /// only detected at registration time as an inconsistent tree.
    pub check_unique_on_attach: bool,
    /// Names starting with any of these prefixes are invalid.
    pub reserved_prefixes: Vec<String>,
    /// Longest accepted name, in bytes.
    pub max_name_len: usize,
    /// Simple name to storage name overrides. Names without an entry are
    /// stored under their own name.
    pub translations: BTreeMap<String, String>,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            check_unique_on_attach: true,
            reserved_prefixes: DEFAULT_RESERVED_PREFIXES
                .iter()
                .map(|p| p.to_string())
                .collect(),
            max_name_len: DEFAULT_MAX_NAME_LEN,
            translations: BTreeMap::new(),
        }
    }
}

impl TreeConfig {
    /// A configuration that trusts callers to attach only unused names.
    pub fn trusting() -> Self {
        Self {
            check_unique_on_attach: false,
            ..Default::default()
        }
    }

    /// Store `name` under `storage_name` in the backing store.
    ///
    /// Fails if the resulting translation table is rejected by
    /// [`TreeConfig::validate`].
    pub fn with_translation(
        mut self,
        name: impl Into<String>,
        storage_name: impl Into<String>,
    ) -> TreeResult<Self> {
        self.translations.insert(name.into(), storage_name.into());
        self.validate()?;
        Ok(self)
    }

    /// Check that the translation table is usable.
    ///
    /// Storage names must be non-empty and free of the path separator, no
    /// two names may share a storage name, and a storage name that is itself
    /// translated must translate to itself. The last rule keeps translation
    /// idempotent: `a -> b` together with `b -> c` is refused.
    pub fn validate(&self) -> TreeResult<()> {
        let invalid = |name: &str, reason: String| TreeError::InvalidTranslation {
            name: name.to_string(),
            reason,
        };
        let mut claimed: BTreeMap<&str, &str> = BTreeMap::new();
        for (name, storage_name) in &self.translations {
            if storage_name.is_empty() || storage_name.contains(SEPARATOR) {
                return Err(invalid(name, format!("bad storage name {storage_name:?}")));
            }
            if let Some(next) = self.translations.get(storage_name) {
                if next != storage_name {
                    return Err(invalid(
                        name,
                        format!("{storage_name:?} is itself translated to {next:?}"),
                    ));
                }
            }
            if let Some(other) = claimed.insert(storage_name, name) {
                return Err(invalid(
                    name,
                    format!("{other:?} is already stored as {storage_name:?}"),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_checks_uniqueness() {
        let config = TreeConfig::default();
        assert!(config.check_unique_on_attach);
        assert_eq!(config.reserved_prefixes.len(), 4);
        assert!(!TreeConfig::trusting().check_unique_on_attach);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: TreeConfig =
            serde_json::from_str(r#"{"translations":{"class":"_class"}}"#).unwrap();
        assert!(config.check_unique_on_attach);
        assert_eq!(config.max_name_len, DEFAULT_MAX_NAME_LEN);
        assert_eq!(config.translations.get("class").map(String::as_str), Some("_class"));
    }

    #[test]
    fn with_translation_adds_entry() {
        let config = TreeConfig::default().with_translation("a b", "a_b").unwrap();
        assert_eq!(config.translations.len(), 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn chained_translations_are_refused() {
        let config = TreeConfig::default().with_translation("a", "b").unwrap();
        let err = config.with_translation("b", "c").unwrap_err();
        assert!(matches!(err, TreeError::InvalidTranslation { .. }));
    }

    #[test]
    fn identity_translation_is_accepted() {
        let config = TreeConfig::default()
            .with_translation("a", "a")
            .and_then(|c| c.with_translation("b", "_b"));
        assert!(config.is_ok());
    }

    #[test]
    fn shared_storage_names_are_refused() {
        let config = TreeConfig::default().with_translation("class", "klass").unwrap();
        let err = config.with_translation("clazz", "klass").unwrap_err();
        assert!(matches!(err, TreeError::InvalidTranslation { ref reason, .. } if reason.contains("klass")));
    }

    #[test]
    fn deserialized_tables_are_checked_too() {
        let config: TreeConfig =
            serde_json::from_str(r#"{"translations":{"x":"y","y":"z"}}"#).unwrap();
        assert!(config.validate().is_err());
        let config: TreeConfig = serde_json::from_str(r#"{"translations":{"x":"a/b"}}"#).unwrap();
        assert!(config.validate().is_err());
    }
}
