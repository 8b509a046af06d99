//! Environment-derived substitution globals.
//!
//! Configuration strings may reference a fixed set of environment variables
//! (`{USER}`, `{SCRATCH}`, ...) and two derived dates (`{TODAY}`,
//! `{YESTERDAY}`). The values come from an [`Environment`] snapshot so that
//! tests can inject their own instead of touching the process environment.

use std::collections::BTreeMap;

use chrono::{Local, NaiveDate};
use indexmap::IndexMap;
use serde_yaml::Value;

/// Environment variables seeded into every substitution context.
pub const ENV_VARS: &[&str] = &["USER", "HOME", "PERM", "HPCPERM", "SCRATCH", "PWD"];

/// Date format used for `TODAY` and `YESTERDAY`.
pub const DATE_FORMAT: &str = "%Y%m%d";

/// Whether `name` is one of the recognized environment-sourced globals.
pub fn is_environment_name(name: &str) -> bool {
    ENV_VARS.contains(&name)
}

/// Snapshot of the recognized environment variables and the current date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    vars: BTreeMap<String, String>,
    today: NaiveDate,
}

impl Environment {
    /// Capture the recognized variables from the process environment.
    pub fn capture() -> Self {
        let vars = ENV_VARS
            .iter()
            .filter_map(|name| std::env::var(name).ok().map(|value| ((*name).to_string(), value)))
            .collect();
        Self {
            vars,
            today: Local::now().date_naive(),
        }
    }

    /// Build a snapshot from explicit values.
    ///
    /// Names outside [`ENV_VARS`] are kept but never seeded as globals.
    pub fn from_vars<I, K, V>(vars: I, today: NaiveDate) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
            today,
        }
    }

    /// Whether the variable is set in this snapshot.
    pub fn is_set(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    /// Value of a variable, if set.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// The snapshot date.
    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Globals seeded into a substitution context.
    ///
    /// Set recognized variables in [`ENV_VARS`] order, then `TODAY` and
    /// `YESTERDAY`.
    pub fn globals(&self) -> IndexMap<String, Value> {
        let mut globals: IndexMap<String, Value> = ENV_VARS
            .iter()
            .filter_map(|name| {
                self.get(name).map(|value| ((*name).to_string(), Value::String(value.to_string())))
            })
            .collect();

        let yesterday = self.today.pred_opt().unwrap_or(self.today);
        globals.insert(
            "TODAY".to_string(),
            Value::String(self.today.format(DATE_FORMAT).to_string()),
        );
        globals.insert(
            "YESTERDAY".to_string(),
            Value::String(yesterday.format(DATE_FORMAT).to_string()),
        );
        globals
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::capture()
    }
}
