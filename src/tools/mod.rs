//! Tools: software a suite loads, unloads and installs.
//!
//! Each tool exposes three script roles:
//!
//! - **load**: activate the tool in a task script
//! - **unload**: deactivate it
//! - **setup**: install it (run once by the deployment family)
//!
//! plus an ordered list of tools it depends on. Tools come from four
//! configuration sections:
//!
//! ```yaml
//! modules:
//!   python3: {version: "3.10"}
//! packages:
//!   mypackage:
//!     type: git
//!     source: git@github.com:org/mypackage.git
//!     branch: main
//!     depends: [python3]
//! environments:
//!   myenv: {type: venv, extra_packages: [numpy]}
//! env_variables:
//!   bin: {variable: PATH, value: /path/to/bin}
//! ```
//!
//! [`ToolStore`] builds every tool and composes dependency-ordered scripts.

pub mod graph;
pub mod parse;
pub mod store;
pub mod variants;

pub use graph::DependencyGraph;
pub use parse::{parse_env_var, parse_environment, parse_module, parse_package, parse_tool};
pub use store::{LOAD_HEADER, ToolStore, UNLOAD_HEADER};

use std::fmt;

use serde_yaml::Value;

use crate::scripts::Script;

/// A script role of a tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScriptRole {
    Load,
    Unload,
    Setup,
}

impl ScriptRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::Unload => "unload",
            Self::Setup => "setup",
        }
    }
}

impl fmt::Display for ScriptRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration section a tool is declared in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolSection {
    Modules,
    Packages,
    Environments,
    EnvVariables,
}

impl ToolSection {
    /// Sections in build order.
    pub const ALL: &'static [ToolSection] =
        &[Self::Modules, Self::Packages, Self::Environments, Self::EnvVariables];

    /// Configuration key of the section.
    pub fn key(self) -> &'static str {
        match self {
            Self::Modules => "modules",
            Self::Packages => "packages",
            Self::Environments => "environments",
            Self::EnvVariables => "env_variables",
        }
    }
}

impl fmt::Display for ToolSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Which strategy produced a tool's scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    /// Environment module
    Module,
    /// Environment module from a private module path
    PrivateModule,
    /// Environment variable export
    EnvVar,
    /// Directory under the lib dir, added to `PATH`
    Folder,
    /// Package retrieved like a data item
    Package,
    /// Python virtual environment
    Venv,
    /// Python virtual environment with system site packages
    SystemVenv,
    /// Existing conda environment
    CondaEnv,
    /// Conda environment created from an environment file
    FileCondaEnv,
    /// Conda environment created from a package list
    SimpleCondaEnv,
    /// Scripts given verbatim
    Custom,
}

/// A tool and its scripts. Built once, read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Tool {
    /// Unique name within a store
    pub name: String,
    pub kind: ToolKind,
    /// Names of tools to load first, in order
    pub depends: Vec<String>,
    pub load: Script,
    pub unload: Script,
    pub setup: Script,
    /// Raw options, kept for the caller (execution context, package lists)
    pub options: Value,
}

impl Tool {
    /// Tool with no scripts, dependencies or options.
    pub fn new(name: impl Into<String>, kind: ToolKind) -> Self {
        Self {
            name: name.into(),
            kind,
            depends: Vec::new(),
            load: Script::new(),
            unload: Script::new(),
            setup: Script::new(),
            options: Value::Null,
        }
    }

    pub fn with_depends(mut self, depends: Vec<String>) -> Self {
        self.depends = depends;
        self
    }

    pub fn with_options(mut self, options: Value) -> Self {
        self.options = options;
        self
    }

    /// Script for a role.
    pub fn script(&self, role: ScriptRole) -> &Script {
        match role {
            ScriptRole::Load => &self.load,
            ScriptRole::Unload => &self.unload,
            ScriptRole::Setup => &self.setup,
        }
    }
}
