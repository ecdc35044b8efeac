//! Node name validation and storage-name translation.
//!
//! Valid node names:
//! - Must be non-empty and no longer than the configured maximum
//! - Must not contain the path separator `/`, NUL, or control characters
//! - Must not be `.` or `..`
//! - Must not start with a reserved prefix (`_v_`, `_f_`, `_g_`, `_c_` by default)
//!
//! The storage name of a node is the name it is recorded under in the
//! backing store. It equals the simple name unless a translation entry says
//! otherwise.

use std::collections::BTreeMap;

use crate::config::TreeConfig;
use crate::error::{TreeError, TreeResult};

/// Separator between path components.
pub const SEPARATOR: char = '/';

/// Maps simple names to storage names and decides which names are legal.
pub trait NameTranslator: Send + Sync {
    /// The on-disk name for `name`. Deterministic and idempotent.
    fn to_storage_name(&self, name: &str) -> String;

    /// Fail with [`TreeError::InvalidName`] if `name` is not acceptable.
    fn check_name_validity(&self, name: &str) -> TreeResult<()>;
}

/// The default [`NameTranslator`], built from a [`TreeConfig`].
#[derive(Clone, Debug, Default)]
pub struct TranslationMap {
    translations: BTreeMap<String, String>,
    reserved_prefixes: Vec<String>,
    max_len: usize,
}

impl TranslationMap {
    /// Build the translator for `config`, refusing translation tables that
    /// [`TreeConfig::validate`] rejects.
    pub fn from_config(config: &TreeConfig) -> TreeResult<Self> {
        config.validate()?;
        Ok(Self::unchecked(config))
    }

    pub(crate) fn unchecked(config: &TreeConfig) -> Self {
        Self {
            translations: config.translations.clone(),
            reserved_prefixes: config.reserved_prefixes.clone(),
            max_len: config.max_name_len,
        }
    }

    /// Number of names with an explicit storage name.
    pub fn len(&self) -> usize {
        self.translations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.translations.is_empty()
    }
}

impl NameTranslator for TranslationMap {
    fn to_storage_name(&self, name: &str) -> String {
        self.translations
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }

    fn check_name_validity(&self, name: &str) -> TreeResult<()> {
        validate_name(name, &self.reserved_prefixes, self.max_len)
    }
}

/// Validate a node name, returning `Ok(())` if valid.
///
/// # Examples
///
/// ```
/// use canopy_tree::names::validate_name;
///
/// assert!(validate_name("sensor1", &[], 255).is_ok());
/// assert!(validate_name("a/b", &[], 255).is_err());
/// assert!(validate_name("_v_attrs", &["_v_".to_string()], 255).is_err());
/// ```
pub fn validate_name(name: &str, reserved_prefixes: &[String], max_len: usize) -> TreeResult<()> {
    let invalid = |reason: String| TreeError::InvalidName {
        name: name.to_string(),
        reason,
    };

    if name.is_empty() {
        return Err(invalid("name must not be empty".into()));
    }

    if name.len() > max_len {
        return Err(invalid(format!("longer than {max_len} bytes")));
    }

    if name.contains(SEPARATOR) {
        return Err(invalid(format!("must not contain {SEPARATOR:?}")));
    }

    if let Some(ch) = name.chars().find(|c| c.is_control()) {
        return Err(invalid(format!("contains control character {ch:?}")));
    }

    if name == "." || name == ".." {
        return Err(invalid("must not be '.' or '..'".into()));
    }

    if let Some(prefix) = reserved_prefixes.iter().find(|p| name.starts_with(p.as_str())) {
        return Err(invalid(format!("prefix {prefix:?} is reserved")));
    }

    Ok(())
}

/// Join a parent path and a child name. Children of the root are `/name`.
pub fn join_path(parent: &str, name: &str) -> String {
    if parent.ends_with(SEPARATOR) {
        format!("{parent}{name}")
    } else {
        format!("{parent}{SEPARATOR}{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reserved() -> Vec<String> {
        crate::config::DEFAULT_RESERVED_PREFIXES
            .iter()
            .map(|p| p.to_string())
            .collect()
    }

    #[test]
    fn valid_names() {
        for name in ["temp", "sensor1", "Table 2", "x.y", "ünïcode", "_private"] {
            assert!(validate_name(name, &reserved(), 255).is_ok(), "{name}");
        }
    }

    #[test]
    fn reject_empty_name() {
        assert!(matches!(
            validate_name("", &reserved(), 255),
            Err(TreeError::InvalidName { .. })
        ));
    }

    #[test]
    fn reject_separator() {
        assert!(validate_name("a/b", &reserved(), 255).is_err());
        assert!(validate_name("/", &reserved(), 255).is_err());
    }

    #[test]
    fn reject_control_chars() {
        assert!(validate_name("a\nb", &reserved(), 255).is_err());
        assert!(validate_name("a\0b", &reserved(), 255).is_err());
    }

    #[test]
    fn reject_dot_names() {
        assert!(validate_name(".", &reserved(), 255).is_err());
        assert!(validate_name("..", &reserved(), 255).is_err());
    }

    #[test]
    fn reject_reserved_prefixes() {
        for name in ["_v_name", "_f_close", "_g_join", "_c_classid"] {
            assert!(validate_name(name, &reserved(), 255).is_err(), "{name}");
        }
    }

    #[test]
    fn reject_too_long() {
        let name = "n".repeat(9);
        assert!(validate_name(&name, &reserved(), 8).is_err());
        assert!(validate_name(&name, &reserved(), 9).is_ok());
    }

    #[test]
    fn translation_falls_back_to_simple_name() {
        let config = TreeConfig::default()
            .with_translation("class", "_class_")
            .unwrap();
        let map = TranslationMap::from_config(&config).unwrap();
        assert_eq!(map.to_storage_name("class"), "_class_");
        assert_eq!(map.to_storage_name("temp"), "temp");
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn translation_is_idempotent() {
        let config = TreeConfig::default()
            .with_translation("class", "klass")
            .unwrap();
        let map = TranslationMap::from_config(&config).unwrap();
        for name in ["class", "klass", "temp"] {
            let once = map.to_storage_name(name);
            assert_eq!(map.to_storage_name(&once), once, "{name}");
        }
    }

    #[test]
    fn from_config_refuses_chains() {
        let mut config = TreeConfig::default();
        config.translations.insert("a".into(), "b".into());
        config.translations.insert("b".into(), "c".into());
        assert!(matches!(
            TranslationMap::from_config(&config),
            Err(TreeError::InvalidTranslation { .. })
        ));
    }

    #[test]
    fn join_handles_root() {
        assert_eq!(join_path("/", "temp"), "/temp");
        assert_eq!(join_path("/group", "temp"), "/group/temp");
    }
}
