//! Arguments and output helpers shared by the subcommands.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use serde::Serialize;
use serde_yaml::Value;

use crate::config::ConfigLoader;

/// Selects and loads a configuration profile.
#[derive(Args, Debug, Clone)]
pub struct ProfileArgs {
    /// Profiles document mapping each profile to its configuration files
    #[arg(short = 'p', long = "profiles", value_name = "FILE", default_value = "profiles.yaml")]
    pub profiles: PathBuf,

    /// Profile to load
    #[arg(value_name = "PROFILE")]
    pub profile: String,

    /// Override a configuration value before substitution (repeatable)
    ///
    /// Nested keys are separated with dots, e.g. `-s tools.modules.python3.version=3.11`.
    #[arg(short = 's', long = "set", value_name = "KEY=VALUE")]
    pub set: Vec<String>,

    /// Fail unless the resolved configuration has this top-level key (repeatable)
    #[arg(long = "require", value_name = "KEY")]
    pub require: Vec<String>,
}

impl ProfileArgs {
    /// Resolve the selected profile.
    pub fn load(&self) -> Result<Value> {
        let loader = self
            .require
            .iter()
            .fold(ConfigLoader::new(), |loader, key| loader.require(key.as_str()))
            .with_overrides(self.set.iter().cloned());

        loader.load_profile(&self.profiles, &self.profile).with_context(|| {
            format!("Failed to load profile '{}' from {}", self.profile, self.profiles.display())
        })
    }
}

/// How results are printed.
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Plain text (scripts as shell, trees as YAML)
    #[default]
    Text,
    /// Pretty-printed JSON
    Json,
}

/// Print `value` as pretty JSON.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
