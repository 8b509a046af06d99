//! Configuration document parsing.
//!
//! Documents are YAML unless their file name ends in `.toml`. Both formats
//! are read into the same tree type ([`serde_yaml::Value`]) whose mappings
//! keep document order, which the substitution walk depends on.
//!
//! Failures carry the file path so the user can tell which of several
//! layered documents is broken:
//!
//! ```text
//! Invalid YAML in config/host.yaml: mapping values are not allowed in this context at line 3 column 9
//! ```

use std::path::Path;

use serde_yaml::Value;
use tracing::debug;

use super::merge::Document;
use crate::core::{Result, SuiteError};

/// On-disk syntax of a configuration document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// YAML (the default)
    Yaml,
    /// TOML, converted into the YAML tree type
    Toml,
}

impl DocumentFormat {
    /// Pick the format from a file extension.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Self::Toml,
            _ => Self::Yaml,
        }
    }
}

/// Parse YAML text. Blank documents parse as an empty mapping.
pub fn parse_yaml(content: &str, label: &str) -> Result<Value> {
    if content.trim().is_empty() {
        return Ok(Value::Mapping(Default::default()));
    }
    let value: Value = serde_yaml::from_str(content).map_err(|e| SuiteError::YamlError {
        file: label.to_string(),
        reason: e.to_string(),
    })?;
    Ok(match value {
        Value::Null => Value::Mapping(Default::default()),
        other => other,
    })
}

/// Parse TOML text into the YAML tree type.
pub fn parse_toml(content: &str, label: &str) -> Result<Value> {
    toml::from_str::<Value>(content).map_err(|e| SuiteError::TomlError {
        file: label.to_string(),
        reason: e.message().to_string(),
    })
}

/// Parse text in the given format.
pub fn parse_document(content: &str, format: DocumentFormat, label: &str) -> Result<Value> {
    match format {
        DocumentFormat::Yaml => parse_yaml(content, label),
        DocumentFormat::Toml => parse_toml(content, label),
    }
}

/// Read and parse a configuration file.
pub fn load_document(path: &Path) -> Result<Document> {
    let content = std::fs::read_to_string(path).map_err(|source| SuiteError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    let label = path.display().to_string();
    let format = DocumentFormat::from_path(path);
    debug!("Loading {format:?} document {label}");
    let tree = parse_document(&content, format, &label)?;
    Ok(Document::new(label, tree))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_yaml_keeps_order() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(&path, "zeta: 1\nalpha: 2\nmid: {b: 1, a: 2}\n").unwrap();

        let doc = load_document(&path).unwrap();
        let keys: Vec<&str> = doc.tree.as_mapping().unwrap().keys().filter_map(Value::as_str).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
        assert_eq!(doc.source, path.display().to_string());
    }

    #[test]
    fn test_load_toml() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("tools.toml");
        std::fs::write(
            &path,
            "lib_dir = \"/lib\"\n\n[modules.python3]\nversion = \"3.10\"\n",
        )
        .unwrap();

        let doc = load_document(&path).unwrap();
        assert_eq!(doc.tree["lib_dir"], Value::String("/lib".into()));
        assert_eq!(doc.tree["modules"]["python3"]["version"], Value::String("3.10".into()));
    }

    #[test]
    fn test_invalid_yaml_names_file() {
        let err = parse_yaml("a: [unclosed", "bad.yaml").unwrap_err();
        match err {
            SuiteError::YamlError { file, .. } => assert_eq!(file, "bad.yaml"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_toml() {
        let err = parse_toml("invalid = toml {", "bad.toml").unwrap_err();
        assert!(matches!(err, SuiteError::TomlError { .. }));
    }

    #[test]
    fn test_missing_file() {
        let err = load_document(Path::new("/nonexistent/config.yaml")).unwrap_err();
        assert!(matches!(err, SuiteError::ConfigRead { .. }));
    }

    #[test]
    fn test_blank_and_comment_only_documents() {
        assert!(parse_yaml("", "x").unwrap().as_mapping().unwrap().is_empty());
        assert!(parse_yaml("# only a comment\n", "x").unwrap().as_mapping().unwrap().is_empty());
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(DocumentFormat::from_path(Path::new("a.toml")), DocumentFormat::Toml);
        assert_eq!(DocumentFormat::from_path(Path::new("a.yml")), DocumentFormat::Yaml);
        assert_eq!(DocumentFormat::from_path(Path::new("profiles")), DocumentFormat::Yaml);
    }
}
