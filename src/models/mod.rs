//! Shared option models for tool and data definitions
//!
//! Configuration sections hand every entity an untyped options sub-tree.
//! The helpers here turn that sub-tree into typed option records and cover
//! the shapes that recur across variants (a value given either as one item or
//! as a list, a dispatch tag with "did you mean" suggestions, path joining
//! inside generated scripts).

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use strsim::levenshtein;

use crate::core::{Result, SuiteError};

/// Maximum Levenshtein distance, as a percentage of the tag length, for a
/// known tag to be offered as a suggestion.
const SIMILARITY_THRESHOLD_PERCENT: usize = 50;

/// A value that may be written as a single item or as a list.
///
/// `depends: python3` and `depends: [python3]` mean the same thing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    /// Single item
    One(T),
    /// Ordered list of items
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    /// Flatten into an ordered list.
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::One(item) => vec![item],
            Self::Many(items) => items,
        }
    }
}

impl<T> Default for OneOrMany<T> {
    fn default() -> Self {
        Self::Many(Vec::new())
    }
}

/// Deserialize an entity's options sub-tree into a typed record.
///
/// Shape errors are reported against the entity name.
pub fn from_options<T>(name: &str, options: &Value) -> Result<T>
where
    T: DeserializeOwned,
{
    let options = match options {
        Value::Null => Value::Mapping(Default::default()),
        other => other.clone(),
    };
    serde_yaml::from_value(options).map_err(|e| SuiteError::InvalidOptions {
        name: name.to_string(),
        reason: e.to_string(),
    })
}

/// Read the dispatch tag (`type`) of an entity.
pub fn type_tag<'a>(name: &str, options: &'a Value) -> Result<&'a str> {
    options.get("type").and_then(Value::as_str).ok_or_else(|| SuiteError::MissingOption {
        name: name.to_string(),
        option: "type".to_string(),
    })
}

/// Closest known tag to `target`, if any is within the similarity threshold.
pub fn closest_match<'a>(target: &str, candidates: &[&'a str]) -> Option<&'a str> {
    candidates
        .iter()
        .map(|candidate| (*candidate, levenshtein(target, candidate)))
        .filter(|(_, dist)| *dist <= target.len() * SIMILARITY_THRESHOLD_PERCENT / 100)
        .min_by_key(|(_, dist)| *dist)
        .map(|(candidate, _)| candidate)
}

/// Join two path segments as they will appear in a shell script.
///
/// Paths in generated scripts are plain text (they may contain `$VAR`
/// expansions), so this never touches the local filesystem.
pub fn join_path(base: &str, segment: &str) -> String {
    if base.is_empty() {
        segment.to_string()
    } else if segment.starts_with('/') {
        segment.to_string()
    } else if base.ends_with('/') {
        format!("{base}{segment}")
    } else {
        format!("{base}/{segment}")
    }
}

/// Last path segment of a path or URL (`a/b/env.yml` -> `env.yml`).
pub fn basename(path: &str) -> &str {
    path.trim_end_matches('/').rsplit('/').next().unwrap_or(path)
}
