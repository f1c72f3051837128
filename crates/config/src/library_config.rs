//! Library configuration section

use crate::validation::{ConfigSection, ValidationError, Validator};
use serde::{Deserialize, Serialize};

/// Library cache settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LibraryConfig {
    /// Key of the cache entry holding the serialized collection
    pub storage_key: String,

    /// Start from the built-in collection when no cache entry exists
    pub seed_when_missing: bool,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            storage_key: "voxlibre_library".to_string(),
            seed_when_missing: true,
        }
    }
}

impl ConfigSection for LibraryConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut results = vec![Validator::not_empty(
            &self.storage_key,
            "library.storage_key",
        )];

        let has_separator = self
            .storage_key
            .chars()
            .any(|c| c == '/' || c == '\\');
        if has_separator {
            results.push(Err(ValidationError::with_value(
                "library.storage_key",
                "must not contain path separators",
                &self.storage_key,
            )));
        }

        Validator::collect_errors(results)
    }

    fn merge(&mut self, other: Self) {
        self.storage_key = other.storage_key;
        self.seed_when_missing = other.seed_when_missing;
    }

    fn section_name(&self) -> &'static str {
        "library"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = LibraryConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.storage_key, "voxlibre_library");
    }

    #[test]
    fn test_empty_key_is_invalid() {
        let config = LibraryConfig {
            storage_key: " ".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_key_with_separator_is_invalid() {
        let config = LibraryConfig {
            storage_key: "../escape".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_merge() {
        let mut base = LibraryConfig::default();
        let other = LibraryConfig {
            storage_key: "shelf".to_string(),
            seed_when_missing: false,
        };

        base.merge(other);
        assert_eq!(base.storage_key, "shelf");
        assert!(!base.seed_when_missing);
    }
}
