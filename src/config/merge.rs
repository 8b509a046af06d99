//! Merging several configuration documents into one tree.
//!
//! Each top-level key may be defined by a single document. Mergeable
//! sections (by default `ecflow_variables`) are the exception: their
//! sub-mappings are unioned across documents, later leaves winning.

use serde_yaml::{Mapping, Value};
use tracing::{debug, trace};

use crate::core::{Result, SuiteError};

/// Sections that may be spread over several documents unless configured otherwise.
pub const DEFAULT_MERGEABLE_SECTIONS: &[&str] = &["ecflow_variables"];

/// A parsed configuration document and where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Label used in error messages (usually the file path)
    pub source: String,
    /// Parsed tree
    pub tree: Value,
}

impl Document {
    /// Wrap a parsed tree.
    pub fn new(source: impl Into<String>, tree: Value) -> Self {
        Self {
            source: source.into(),
            tree,
        }
    }

    /// Parse a YAML string, labelling it with `source`.
    pub fn from_yaml(source: impl Into<String>, content: &str) -> Result<Self> {
        let source = source.into();
        let tree = super::parser::parse_yaml(content, &source)?;
        Ok(Self::new(source, tree))
    }

    fn top_level(&self) -> Result<Mapping> {
        match &self.tree {
            Value::Null => Ok(Mapping::new()),
            Value::Mapping(map) => Ok(map.clone()),
            _ => Err(SuiteError::InvalidDocument {
                file: self.source.clone(),
                reason: "top level must be a mapping".to_string(),
            }),
        }
    }
}

/// Merge documents in order. Inputs are not modified.
pub fn merge_documents<S: AsRef<str>>(documents: &[Document], mergeable: &[S]) -> Result<Value> {
    let is_mergeable = |key: &Value| {
        key.as_str().is_some_and(|key| mergeable.iter().any(|m| m.as_ref() == key))
    };

    let mut merged = Mapping::new();
    for document in documents {
        let top = document.top_level()?;

        let duplicates: Vec<String> = top
            .keys()
            .filter(|key| !is_mergeable(*key) && merged.contains_key(*key))
            .map(super::formatter::stringify)
            .collect();
        if !duplicates.is_empty() {
            return Err(SuiteError::DuplicateKeys {
                file: document.source.clone(),
                keys: duplicates,
            });
        }

        debug!("Merging {} top-level keys from {}", top.len(), document.source);
        for (key, value) in top {
            if is_mergeable(&key) {
                let section = section_mapping(&document.source, &key, value)?;
                trace!("Unioning mergeable section {:?}", key);
                match merged.get_mut(&key) {
                    Some(Value::Mapping(existing)) => deep_union(existing, section),
                    _ => {
                        merged.insert(key, Value::Mapping(section));
                    }
                }
            } else {
                merged.insert(key, value);
            }
        }
    }
    Ok(Value::Mapping(merged))
}

fn section_mapping(source: &str, key: &Value, value: Value) -> Result<Mapping> {
    match value {
        Value::Null => Ok(Mapping::new()),
        Value::Mapping(map) => Ok(map),
        _ => Err(SuiteError::InvalidDocument {
            file: source.to_string(),
            reason: format!(
                "mergeable section '{}' must be a mapping",
                super::formatter::stringify(key)
            ),
        }),
    }
}

/// Recursively union `source` into `target`; leaves from `source` win.
pub fn deep_union(target: &mut Mapping, source: Mapping) {
    for (key, value) in source {
        match (target.get_mut(&key), value) {
            (Some(Value::Mapping(existing)), Value::Mapping(incoming)) => {
                deep_union(existing, incoming);
            }
            (_, value) => {
                target.insert(key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(source: &str, text: &str) -> Document {
        Document::from_yaml(source, text).unwrap()
    }

    #[test]
    fn test_disjoint_documents_merge_in_order() {
        let merged = merge_documents(
            &[doc("a.yaml", "user: dummy\nroot: /scratch"), doc("b.yaml", "path: '{root}'")],
            DEFAULT_MERGEABLE_SECTIONS,
        )
        .unwrap();
        let keys: Vec<&str> = merged.as_mapping().unwrap().keys().filter_map(Value::as_str).collect();
        assert_eq!(keys, vec!["user", "root", "path"]);
    }

    #[test]
    fn test_duplicate_key_fails_even_with_equal_values() {
        let err = merge_documents(
            &[doc("a.yaml", "host: hpc\nx: 1"), doc("b.yaml", "host: hpc\ny: 2\nx: 3")],
            DEFAULT_MERGEABLE_SECTIONS,
        )
        .unwrap_err();
        match err {
            SuiteError::DuplicateKeys { file, keys } => {
                assert_eq!(file, "b.yaml");
                assert_eq!(keys, vec!["host", "x"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_mergeable_section_union() {
        let merged = merge_documents(
            &[
                doc("a.yaml", "ecflow_variables:\n  A: 1\n  B: 2"),
                doc("b.yaml", "ecflow_variables:\n  B: 3\n  C: 4"),
            ],
            DEFAULT_MERGEABLE_SECTIONS,
        )
        .unwrap();
        let vars = &merged["ecflow_variables"];
        assert_eq!(vars["A"], Value::from(1));
        assert_eq!(vars["B"], Value::from(3));
        assert_eq!(vars["C"], Value::from(4));
    }

    #[test]
    fn test_custom_mergeable_section_deep_union() {
        let merged = merge_documents(
            &[
                doc("a.yaml", "tools:\n  modules:\n    python3: {version: 3.10}"),
                doc("b.yaml", "tools:\n  modules:\n    gcc: {}\n  packages: {}"),
            ],
            &["tools"],
        )
        .unwrap();
        let modules = merged["tools"]["modules"].as_mapping().unwrap();
        assert_eq!(modules.len(), 2);
        assert!(merged["tools"]["packages"].is_mapping());
    }

    #[test]
    fn test_inputs_are_untouched() {
        let docs = [doc("a.yaml", "ecflow_variables: {A: 1}"), doc("b.yaml", "ecflow_variables: {B: 2}")];
        let before = docs.clone();
        merge_documents(&docs, DEFAULT_MERGEABLE_SECTIONS).unwrap();
        assert_eq!(docs, before);
    }

    #[test]
    fn test_non_mapping_document_is_rejected() {
        let err = merge_documents(&[doc("a.yaml", "- a\n- b")], DEFAULT_MERGEABLE_SECTIONS).unwrap_err();
        assert!(matches!(err, SuiteError::InvalidDocument { .. }));
    }

    #[test]
    fn test_empty_document_is_empty_mapping() {
        let merged = merge_documents(&[doc("a.yaml", ""), doc("b.yaml", "k: v")], DEFAULT_MERGEABLE_SECTIONS)
            .unwrap();
        assert_eq!(merged.as_mapping().unwrap().len(), 1);
    }
}
