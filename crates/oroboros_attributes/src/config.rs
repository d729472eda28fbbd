//! # Store Configuration
//!
//! Sizing knobs for both strategies, loaded once at startup from TOML:
//!
//! ```toml
//! initial_capacity = 4096
//! max_capacity = 1048576
//! dense_reserve = 64
//! ```
//!
//! Every key is optional. Missing keys fall back to [`StoreConfig::default`].

use std::path::Path;

use serde::Deserialize;

use crate::error::{AttributeError, AttributeResult};
use crate::handle::INDEX_SPACE;

/// Sizing configuration shared by [`SparseStore`](crate::SparseStore) and
/// [`DenseStore`](crate::DenseStore).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Number of handle indices pre-sized at construction.
    pub initial_capacity: usize,
    /// Hard ceiling on the handle index range. `None` means unbounded.
    pub max_capacity: Option<usize>,
    /// Dense value slots reserved up front (dense strategy only).
    pub dense_reserve: usize,
}

impl StoreConfig {
    /// Parses and validates a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`AttributeError::InvalidConfig`] if the text is not valid
    /// TOML, contains unknown keys, or fails [`StoreConfig::validate`].
    pub fn from_toml_str(text: &str) -> AttributeResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| AttributeError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`AttributeError::InvalidConfig`] if the file cannot be read
    /// or its contents are rejected by [`StoreConfig::from_toml_str`].
    pub fn from_toml_file(path: impl AsRef<Path>) -> AttributeResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            AttributeError::InvalidConfig(format!("{}: {e}", path.display()))
        })?;
        Self::from_toml_str(&text)
    }

    /// Checks that the sizing values are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`AttributeError::InvalidConfig`] if any size exceeds the
    /// 2^32 handle index space, or `initial_capacity` exceeds `max_capacity`.
    pub fn validate(&self) -> AttributeResult<()> {
        let bounded = [
            ("initial_capacity", Some(self.initial_capacity)),
            ("max_capacity", self.max_capacity),
            ("dense_reserve", Some(self.dense_reserve)),
        ];
        for (key, value) in bounded {
            if let Some(value) = value.filter(|&v| v > INDEX_SPACE) {
                return Err(AttributeError::InvalidConfig(format!(
                    "{key} {value} exceeds the handle index space {INDEX_SPACE}"
                )));
            }
        }

        match self.max_capacity {
            Some(limit) if self.initial_capacity > limit => Err(AttributeError::InvalidConfig(
                format!(
                    "initial_capacity {} exceeds max_capacity {limit}",
                    self.initial_capacity
                ),
            )),
            _ => Ok(()),
        }
    }

    /// Returns `Ok(())` if an index range of `requested` fits under the limit.
    pub(crate) fn check_capacity(&self, requested: usize) -> AttributeResult<()> {
        match self.max_capacity {
            Some(limit) if requested > limit => {
                tracing::warn!(requested, limit, "attribute store capacity limit reached");
                Err(AttributeError::CapacityExceeded { requested, limit })
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config = StoreConfig::from_toml_str(
            "initial_capacity = 4096\nmax_capacity = 1048576\ndense_reserve = 64\n",
        )
        .unwrap();
        assert_eq!(config.initial_capacity, 4096);
        assert_eq!(config.max_capacity, Some(1_048_576));
        assert_eq!(config.dense_reserve, 64);
    }

    #[test]
    fn test_missing_keys_use_defaults() {
        let config = StoreConfig::from_toml_str("dense_reserve = 8").unwrap();
        assert_eq!(config.initial_capacity, 0);
        assert_eq!(config.max_capacity, None);
        assert_eq!(config.dense_reserve, 8);
        assert_eq!(StoreConfig::from_toml_str("").unwrap(), StoreConfig::default());
    }

    #[test]
    fn test_rejects_bad_config() {
        assert!(matches!(
            StoreConfig::from_toml_str("initial_capacity = 10\nmax_capacity = 5"),
            Err(AttributeError::InvalidConfig(_))
        ));
        assert!(matches!(
            StoreConfig::from_toml_str("initial_capacity = \"lots\""),
            Err(AttributeError::InvalidConfig(_))
        ));
        assert!(matches!(
            StoreConfig::from_toml_str("capacity = 10"),
            Err(AttributeError::InvalidConfig(_))
        ));
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_rejects_sizes_beyond_index_space() {
        for key in ["initial_capacity", "max_capacity", "dense_reserve"] {
            let text = format!("{key} = 9223372036854775807");
            assert!(
                matches!(
                    StoreConfig::from_toml_str(&text),
                    Err(AttributeError::InvalidConfig(_))
                ),
                "{key} accepted"
            );
        }

        let config = StoreConfig {
            initial_capacity: INDEX_SPACE,
            max_capacity: Some(INDEX_SPACE),
            dense_reserve: INDEX_SPACE,
        };
        assert!(config.validate().is_ok());
        let config = StoreConfig {
            dense_reserve: INDEX_SPACE + 1,
            ..StoreConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = StoreConfig::from_toml_file("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, AttributeError::InvalidConfig(_)));
    }

    #[test]
    fn test_check_capacity() {
        let config = StoreConfig { max_capacity: Some(16), ..StoreConfig::default() };
        assert!(config.check_capacity(16).is_ok());
        assert_eq!(
            config.check_capacity(17),
            Err(AttributeError::CapacityExceeded { requested: 17, limit: 16 })
        );
        assert!(StoreConfig::default().check_capacity(usize::MAX).is_ok());
    }
}
