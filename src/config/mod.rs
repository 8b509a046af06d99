//! Configuration loading for suitekit
//!
//! A suite configuration is assembled from several documents, selected by a
//! named profile:
//!
//! ```yaml
//! # profiles.yaml
//! user:
//!   - configs/user.yaml
//!   - configs/tools.yaml
//!   - configs/data.yaml
//! hpc:
//!   - configs/hpc.yaml
//!   - configs/tools.yaml
//! ```
//!
//! Loading a profile runs the same pipeline every time:
//!
//! 1. **Merge** the documents ([`merge`]). A top-level key may come from one
//!    document only, except for mergeable sections such as `ecflow_variables`.
//! 2. **Override** leaves from the command line ([`overrides`], `-s key.path=value`).
//! 3. **Substitute** `{name}` placeholders ([`substitute`]) against earlier
//!    keys, caller globals and the environment ([`globals`]).
//! 4. **Validate** that required top-level keys are present.
//!
//! # Examples
//!
//! ```rust,no_run
//! use suitekit::config::ConfigLoader;
//! use std::path::Path;
//!
//! # fn example() -> suitekit::core::Result<()> {
//! let tree = ConfigLoader::new()
//!     .require("host")
//!     .with_overrides(["host=hpc2"])
//!     .load_profile(Path::new("profiles.yaml"), "user")?;
//! println!("{}", tree["lib_dir"].as_str().unwrap_or_default());
//! # Ok(())
//! # }
//! ```

pub mod formatter;
pub mod globals;
pub mod merge;
pub mod overrides;
pub mod parser;
pub mod submit;
pub mod substitute;

pub use formatter::{format_with, stringify};
pub use globals::Environment;
pub use merge::{DEFAULT_MERGEABLE_SECTIONS, Document, merge_documents};
pub use overrides::{Override, apply_overrides};
pub use parser::{DocumentFormat, load_document};
pub use submit::{ExecutionContexts, parse_submit_arguments};
pub use substitute::{Substituter, substitute_variables};

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde_yaml::Value;
use tracing::debug;

use crate::core::{Result, SuiteError};

/// Builder for the merge / override / substitute / validate pipeline.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    mergeable: Vec<String>,
    required: Vec<String>,
    overrides: Vec<String>,
    globals: IndexMap<String, Value>,
    environment: Option<Environment>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self {
            mergeable: DEFAULT_MERGEABLE_SECTIONS.iter().map(|s| (*s).to_string()).collect(),
            required: Vec::new(),
            overrides: Vec::new(),
            globals: IndexMap::new(),
            environment: None,
        }
    }
}

impl ConfigLoader {
    /// Loader with the default mergeable sections and no required keys.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow `section` to be unioned across documents.
    pub fn mergeable_section(mut self, section: impl Into<String>) -> Self {
        let section = section.into();
        if !self.mergeable.contains(&section) {
            self.mergeable.push(section);
        }
        self
    }

    /// Require a top-level key in the resolved tree.
    pub fn require(mut self, key: impl Into<String>) -> Self {
        self.required.push(key.into());
        self
    }

    /// Append `key.path=value` overrides.
    pub fn with_overrides<I, S>(mut self, overrides: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.overrides.extend(overrides.into_iter().map(Into::into));
        self
    }

    /// Caller-supplied substitution globals.
    pub fn with_globals(mut self, globals: IndexMap<String, Value>) -> Self {
        self.globals.extend(globals);
        self
    }

    /// Use an explicit environment snapshot instead of the process environment.
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = Some(environment);
        self
    }

    /// Run the pipeline over already-parsed documents.
    pub fn load_documents(&self, documents: &[Document]) -> Result<Value> {
        let mut tree = merge_documents(documents, self.mergeable.as_slice())?;
        apply_overrides(&mut tree, self.overrides.as_slice())?;

        let environment = self.environment.clone().unwrap_or_else(Environment::capture);
        Substituter::new()
            .with_environment(environment)
            .with_globals(self.globals.clone())
            .substitute_in_place(&mut tree)?;

        self.validate(&tree)?;
        debug!("Loaded configuration from {} documents", documents.len());
        Ok(tree)
    }

    /// Read files in order and run the pipeline.
    pub fn load_files<P: AsRef<Path>>(&self, paths: &[P]) -> Result<Value> {
        let documents = paths
            .iter()
            .map(|path| load_document(path.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        self.load_documents(&documents)
    }

    /// Load the files listed under `profile` in a profiles document.
    pub fn load_profile(&self, profiles: &Path, profile: &str) -> Result<Value> {
        let files = profile_files(profiles, profile)?;
        debug!("Profile '{profile}' selects {} files", files.len());
        self.load_files(&files)
    }

    fn validate(&self, tree: &Value) -> Result<()> {
        for key in &self.required {
            if tree.get(key.as_str()).is_none() {
                return Err(SuiteError::MissingRequiredKey {
                    key: key.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Files selected by `profile`, relative entries resolved against the
/// profiles document's directory.
pub fn profile_files(profiles: &Path, profile: &str) -> Result<Vec<PathBuf>> {
    let document = load_document(profiles)?;
    let invalid = |reason: String| SuiteError::InvalidDocument {
        file: document.source.clone(),
        reason,
    };

    let entry = document.tree.get(profile).ok_or_else(|| SuiteError::ProfileNotFound {
        profile: profile.to_string(),
        file: document.source.clone(),
    })?;

    let names: Vec<&str> = match entry {
        Value::String(name) => vec![name.as_str()],
        Value::Sequence(items) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .ok_or_else(|| invalid(format!("profile '{profile}' must list file paths")))
            })
            .collect::<Result<_>>()?,
        _ => return Err(invalid(format!("profile '{profile}' must list file paths"))),
    };

    let base = profiles.parent().unwrap_or_else(|| Path::new(""));
    Ok(names
        .into_iter()
        .map(|name| {
            let path = Path::new(name);
            if path.is_absolute() { path.to_path_buf() } else { base.join(path) }
        })
        .collect())
}

/// Load a profile with default loader settings.
pub fn parse_profiles<S: AsRef<str>>(
    profiles: &Path,
    profile: &str,
    overrides: &[S],
    globals: Option<IndexMap<String, Value>>,
) -> Result<Value> {
    loader_for(overrides, globals).load_profile(profiles, profile)
}

/// Load an explicit list of files with default loader settings.
pub fn parse_yaml_files<P: AsRef<Path>, S: AsRef<str>>(
    files: &[P],
    overrides: &[S],
    globals: Option<IndexMap<String, Value>>,
) -> Result<Value> {
    loader_for(overrides, globals).load_files(files)
}

fn loader_for<S: AsRef<str>>(overrides: &[S], globals: Option<IndexMap<String, Value>>) -> ConfigLoader {
    ConfigLoader::new()
        .with_overrides(overrides.iter().map(|s| s.as_ref().to_string()))
        .with_globals(globals.unwrap_or_default())
}
