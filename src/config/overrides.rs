//! Command-line `key.path=value` overrides.
//!
//! Overrides are applied to the merged tree before substitution. The new
//! value takes the type of the leaf it replaces, so `-s jobs.limit=4` keeps
//! `limit` an integer while `-s host=hpc2` stays a string.

use std::str::FromStr;

use serde_yaml::{Mapping, Value};
use tracing::debug;

use crate::core::{Result, SuiteError};

/// A parsed `key.path=value` override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Override {
    /// Path segments (`["jobs", "limit"]`)
    pub path: Vec<String>,
    /// Raw value text
    pub value: String,
}

impl Override {
    /// Dotted form of the path.
    pub fn dotted_path(&self) -> String {
        self.path.join(".")
    }
}

impl FromStr for Override {
    type Err = SuiteError;

    fn from_str(entry: &str) -> Result<Self> {
        let invalid = |reason: &str| SuiteError::InvalidOverride {
            entry: entry.to_string(),
            reason: reason.to_string(),
        };

        let (key, value) = entry.split_once('=').ok_or_else(|| invalid("expected KEY=VALUE"))?;
        if key.is_empty() {
            return Err(invalid("empty key"));
        }
        let path: Vec<String> = key.split('.').map(str::to_string).collect();
        if path.iter().any(String::is_empty) {
            return Err(invalid("empty path segment"));
        }
        Ok(Self {
            path,
            value: value.to_string(),
        })
    }
}

/// Apply overrides in order; later entries win on the same path.
///
/// Stops at the first failing entry, leaving earlier ones applied.
pub fn apply_overrides<S: AsRef<str>>(tree: &mut Value, overrides: &[S]) -> Result<()> {
    for entry in overrides {
        let entry = entry.as_ref();
        let parsed: Override = entry.parse()?;
        apply_override(tree, &parsed, entry)?;
    }
    Ok(())
}

fn apply_override(tree: &mut Value, item: &Override, entry: &str) -> Result<()> {
    let dotted = item.dotted_path();
    let (leaf, parents) = item.path.split_last().ok_or_else(|| SuiteError::InvalidOverride {
        entry: entry.to_string(),
        reason: "empty key".to_string(),
    })?;

    let mut node = as_mapping_mut(tree, entry, "<root>")?;
    for segment in parents {
        let child = node.get_mut(segment.as_str()).ok_or_else(|| SuiteError::OverridePathNotFound {
            path: dotted.clone(),
            segment: segment.clone(),
        })?;
        node = as_mapping_mut(child, entry, segment)?;
    }

    let value = coerce(node.get(leaf.as_str()), &item.value, &dotted, entry)?;
    debug!("Override {dotted} = {:?}", value);
    node.insert(Value::String(leaf.clone()), value);
    Ok(())
}

fn as_mapping_mut<'a>(value: &'a mut Value, entry: &str, segment: &str) -> Result<&'a mut Mapping> {
    match value {
        Value::Mapping(map) => Ok(map),
        _ => Err(SuiteError::InvalidOverride {
            entry: entry.to_string(),
            reason: format!("'{segment}' is not a mapping"),
        }),
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Sequence(items) => items.is_empty(),
        Value::Mapping(map) => map.is_empty(),
        Value::Tagged(_) => false,
    }
}

/// Convert `raw` to the type of `existing`.
///
/// A missing or falsy existing leaf gives a string.
fn coerce(existing: Option<&Value>, raw: &str, path: &str, entry: &str) -> Result<Value> {
    let existing = match existing {
        Some(value) if !is_falsy(value) => value,
        _ => return Ok(Value::String(raw.to_string())),
    };

    let mismatch = |expected: &str| SuiteError::OverrideCoercion {
        path: path.to_string(),
        value: raw.to_string(),
        expected: expected.to_string(),
    };

    match existing {
        Value::Bool(_) => parse_bool(raw).map(Value::Bool).ok_or_else(|| mismatch("boolean")),
        Value::Number(n) if n.is_f64() => {
            raw.trim().parse::<f64>().map(Value::from).map_err(|_| mismatch("float"))
        }
        Value::Number(_) => raw.trim().parse::<i64>().map(Value::from).map_err(|_| mismatch("integer")),
        Value::Sequence(_) => Ok(parse_sequence(raw)),
        Value::Mapping(_) => Err(SuiteError::InvalidOverride {
            entry: entry.to_string(),
            reason: format!("'{path}' is a mapping and cannot be replaced by a value"),
        }),
        _ => Ok(Value::String(raw.to_string())),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

/// `[a, b]` parses as a list; anything else is a one-element list.
fn parse_sequence(raw: &str) -> Value {
    match serde_yaml::from_str::<Value>(raw) {
        Ok(Value::Sequence(items)) => Value::Sequence(items),
        _ => Value::Sequence(vec![Value::String(raw.to_string())]),
    }
}
