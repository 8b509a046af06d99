//! Variable substitution over a merged configuration tree.
//!
//! The walk visits keys depth-first in document order. Every resolved leaf is
//! recorded in one context shared by the whole walk, so a key becomes visible
//! to everything after it, whatever its nesting level:
//!
//! ```yaml
//! user: dummy
//! root: /scratch
//! paths:
//!   home: "{root}/{user}"     # -> /scratch/dummy
//! log: "{home}/log"           # -> /scratch/dummy/log
//! ```
//!
//! Only string leaves are formatted. Numbers, booleans and sequences are
//! recorded as-is and keep their type; a placeholder that references them
//! renders their text form.
//!
//! Substitution mutates the tree as it goes. When an error is returned the
//! keys visited before the failure are already substituted and the rest are
//! untouched.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde_yaml::{Mapping, Value};
use tracing::{debug, trace};

use super::formatter::{self, stringify};
use super::globals::{Environment, is_environment_name};
use crate::core::{Result, SuiteError};

/// Resolves `{name}` placeholders in a configuration tree.
#[derive(Debug, Clone, Default)]
pub struct Substituter {
    environment: Environment,
    globals: IndexMap<String, Value>,
}

impl Substituter {
    /// Substituter seeded from the process environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an explicit environment snapshot.
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Caller-supplied globals; they win over environment-derived ones.
    pub fn with_globals(mut self, globals: IndexMap<String, Value>) -> Self {
        self.globals.extend(globals);
        self
    }

    /// Add one caller-supplied global.
    pub fn global(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.globals.insert(name.into(), value.into());
        self
    }

    /// Initial context: environment globals overridden by caller globals.
    pub fn initial_context(&self) -> IndexMap<String, Value> {
        let mut context = self.environment.globals();
        context.extend(self.globals.iter().map(|(k, v)| (k.clone(), v.clone())));
        context
    }

    /// Substitute a tree, returning the resolved copy.
    pub fn substitute(&self, mut tree: Value) -> Result<Value> {
        self.substitute_in_place(&mut tree)?;
        Ok(tree)
    }

    /// Substitute a tree in place.
    ///
    /// A top level that is not a mapping is left unchanged.
    pub fn substitute_in_place(&self, tree: &mut Value) -> Result<()> {
        let Value::Mapping(root) = tree else {
            return Ok(());
        };

        let mut leaf_keys = HashSet::new();
        collect_leaf_keys(root, &mut leaf_keys);

        let mut context = self.initial_context();
        debug!("Substituting variables with {} seeded globals", context.len());
        self.walk(root, &mut context, &leaf_keys)
    }

    fn walk(
        &self,
        node: &mut Mapping,
        context: &mut IndexMap<String, Value>,
        leaf_keys: &HashSet<String>,
    ) -> Result<()> {
        for (key, value) in node.iter_mut() {
            let key_name = stringify(key);
            match value {
                Value::Mapping(child) => self.walk(child, context, leaf_keys)?,
                Value::String(text) => {
                    self.check_environment(text)?;
                    let resolved = formatter::format_with(text, |name| context.get(name))
                        .map_err(|err| classify(err, &key_name, leaf_keys))?;
                    if resolved != *text {
                        trace!("Resolved '{key_name}': '{text}' -> '{resolved}'");
                    }
                    *text = resolved.clone();
                    context.insert(key_name, Value::String(resolved));
                }
                other => {
                    context.insert(key_name, other.clone());
                }
            }
        }
        Ok(())
    }

    /// Reject placeholders naming an environment global that is not set.
    fn check_environment(&self, text: &str) -> Result<()> {
        for name in formatter::placeholder_names(text)? {
            if is_environment_name(name) && !self.environment.is_set(name) {
                return Err(SuiteError::EnvironmentVariableUnset {
                    name: name.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Turn a formatter miss into an ordering or undefined-name error.
fn classify(err: SuiteError, key: &str, leaf_keys: &HashSet<String>) -> SuiteError {
    match err {
        SuiteError::MissingPlaceholder { name } if leaf_keys.contains(&name) => {
            SuiteError::UsedBeforeAssignment {
                key: key.to_string(),
                name,
            }
        }
        SuiteError::MissingPlaceholder { name } => SuiteError::UndefinedVariable {
            key: key.to_string(),
            name,
        },
        other => other,
    }
}

fn collect_leaf_keys(node: &Mapping, keys: &mut HashSet<String>) {
    for (key, value) in node {
        match value {
            Value::Mapping(child) => collect_leaf_keys(child, keys),
            _ => {
                keys.insert(stringify(key));
            }
        }
    }
}

/// Substitute `tree` against the process environment and optional globals.
pub fn substitute_variables(tree: Value, globals: Option<IndexMap<String, Value>>) -> Result<Value> {
    let substituter = match globals {
        Some(globals) => Substituter::new().with_globals(globals),
        None => Substituter::new(),
    };
    substituter.substitute(tree)
}
