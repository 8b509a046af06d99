//! Execution contexts (`submit_arguments`).
//!
//! A `defaults` context is layered under every other context, and its entries
//! are also exported as suite-level variables. Some names are not safe as
//! suite variables and are dropped or renamed on the way.

use indexmap::IndexMap;
use serde_yaml::{Mapping, Value};

use super::formatter::stringify;
use crate::core::{Result, SuiteError};

/// Name of the context merged under all others.
pub const DEFAULTS_CONTEXT: &str = "defaults";

/// Defaults that must not become suite variables.
const PROTECTED: &[&str] = &["sthost"];

/// Defaults exported under a different variable name (matched case-insensitively).
const RENAMED: &[(&str, &str)] = &[("tmpdir", "ssdtmp")];

/// Parsed execution contexts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionContexts {
    /// Context name to its settings, defaults already applied
    pub contexts: IndexMap<String, Mapping>,
    /// Upper-cased suite variables derived from `defaults`
    pub default_variables: IndexMap<String, Value>,
}

impl ExecutionContexts {
    /// Settings of one context.
    pub fn get(&self, name: &str) -> Option<&Mapping> {
        self.contexts.get(name)
    }
}

/// Parse a `submit_arguments` mapping.
pub fn parse_submit_arguments(options: &Value) -> Result<ExecutionContexts> {
    let options = match options {
        Value::Null => return Ok(ExecutionContexts::default()),
        Value::Mapping(map) => map,
        _ => return Err(invalid("expected a mapping of execution contexts")),
    };

    let defaults = match options.get(DEFAULTS_CONTEXT) {
        None | Some(Value::Null) => Mapping::new(),
        Some(Value::Mapping(map)) => map.clone(),
        Some(_) => return Err(invalid("'defaults' must be a mapping")),
    };

    let mut contexts = IndexMap::new();
    for (name, settings) in options {
        let name = stringify(name);
        if name == DEFAULTS_CONTEXT {
            continue;
        }
        let mut merged = defaults.clone();
        match settings {
            Value::Null => {}
            Value::Mapping(map) => {
                for (key, value) in map {
                    merged.insert(key.clone(), value.clone());
                }
            }
            _ => return Err(invalid(&format!("context '{name}' must be a mapping"))),
        }
        contexts.insert(name, merged);
    }

    let mut default_variables = IndexMap::new();
    for (key, value) in &defaults {
        let key = stringify(key);
        if PROTECTED.contains(&key.as_str()) {
            continue;
        }
        let lowered = key.to_lowercase();
        let renamed = RENAMED
            .iter()
            .find(|(from, _)| *from == lowered)
            .map_or(key.as_str(), |(_, to)| *to);
        default_variables.insert(renamed.to_uppercase(), value.clone());
    }

    Ok(ExecutionContexts {
        contexts,
        default_variables,
    })
}

fn invalid(reason: &str) -> SuiteError {
    SuiteError::InvalidOptions {
        name: "submit_arguments".to_string(),
        reason: reason.to_string(),
    }
}
