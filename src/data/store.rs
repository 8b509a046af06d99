//! Registry of static data items.

use indexmap::IndexMap;
use serde_yaml::Value;
use tracing::debug;

use super::{DataItem, parse_data_item};
use crate::config::stringify;
use crate::core::{Result, SuiteError};

/// Data directory used when none is configured.
pub const DEFAULT_DATA_DIR: &str = "$DATA_DIR";

/// Configuration section holding the data items.
pub const STATIC_DATA_SECTION: &str = "static_data";

/// Static data items of a suite, in configuration order.
#[derive(Debug, Clone, Default)]
pub struct StaticDataStore {
    data_dir: String,
    items: IndexMap<String, DataItem>,
}

impl StaticDataStore {
    /// Build every item of a `static_data` section under `data_dir`.
    pub fn new(data_dir: &str, section: &Value) -> Result<Self> {
        let entries = match section {
            Value::Null => return Ok(Self::empty(data_dir)),
            Value::Mapping(entries) => entries,
            _ => {
                return Err(SuiteError::InvalidOptions {
                    name: STATIC_DATA_SECTION.to_string(),
                    reason: "expected a mapping of data items".to_string(),
                });
            }
        };

        let mut items = IndexMap::with_capacity(entries.len());
        for (name, options) in entries {
            let name = stringify(name);
            let item = parse_data_item(data_dir, &name, options)?;
            items.insert(name, item);
        }
        debug!("Built {} static data items under {data_dir}", items.len());

        Ok(Self {
            data_dir: data_dir.to_string(),
            items,
        })
    }

    /// Build from a resolved configuration tree.
    ///
    /// `data_dir` is either a top-level key of the tree holding the
    /// directory, or the directory itself; `None` selects `$DATA_DIR`.
    pub fn from_config(tree: &Value, data_dir: Option<&str>) -> Result<Self> {
        let root = match data_dir {
            None => DEFAULT_DATA_DIR.to_string(),
            Some(key) => tree.get(key).map(stringify).unwrap_or_else(|| key.to_string()),
        };
        let section = tree.get(STATIC_DATA_SECTION).ok_or_else(|| SuiteError::MissingRequiredKey {
            key: STATIC_DATA_SECTION.to_string(),
        })?;
        Self::new(&root, section)
    }

    fn empty(data_dir: &str) -> Self {
        Self {
            data_dir: data_dir.to_string(),
            items: IndexMap::new(),
        }
    }

    pub fn data_dir(&self) -> &str {
        &self.data_dir
    }

    /// Item by name.
    pub fn get(&self, name: &str) -> Result<&DataItem> {
        self.items.get(name).ok_or_else(|| SuiteError::DataNotFound {
            name: name.to_string(),
        })
    }

    /// Items in configuration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DataItem)> {
        self.items.iter().map(|(name, item)| (name.as_str(), item))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.items.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(text: &str) -> Value {
        serde_yaml::from_str(text).unwrap()
    }

    #[test]
    fn test_store_keeps_order() {
        let config = tree(
            "static_data:\n  zeta: {type: custom}\n  alpha: {type: rsync, source: /src}\n",
        );
        let store = StaticDataStore::from_config(&config, None).unwrap();
        assert_eq!(store.names().collect::<Vec<_>>(), vec!["zeta", "alpha"]);
        assert_eq!(store.data_dir(), "$DATA_DIR");
        assert_eq!(store.get("alpha").unwrap().path, "$DATA_DIR/alpha");
    }

    #[test]
    fn test_data_dir_from_key_or_literal() {
        let config = tree("data_root: /scratch/data\nstatic_data:\n  a: {type: custom}\n");
        let by_key = StaticDataStore::from_config(&config, Some("data_root")).unwrap();
        assert_eq!(by_key.data_dir(), "/scratch/data");

        let literal = StaticDataStore::from_config(&config, Some("/other")).unwrap();
        assert_eq!(literal.data_dir(), "/other");
    }

    #[test]
    fn test_unknown_item() {
        let store = StaticDataStore::new("/data", &Value::Null).unwrap();
        assert!(store.is_empty());
        assert!(matches!(store.get("x"), Err(SuiteError::DataNotFound { .. })));
    }

    #[test]
    fn test_missing_section() {
        let err = StaticDataStore::from_config(&tree("host: hpc"), None).unwrap_err();
        assert!(matches!(err, SuiteError::MissingRequiredKey { key } if key == "static_data"));
    }
}
