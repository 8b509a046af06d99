//! Building tools from configuration sections.

use serde::Deserialize;
use serde_yaml::Value;

use super::variants::{CondaCommands, VenvSpec};
use super::{Tool, ToolSection};
use crate::config::stringify;
use crate::core::{Result, SuiteError};
use crate::models::{OneOrMany, closest_match, from_options, type_tag};
use crate::scripts::Script;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ModuleOptions {
    name: Option<String>,
    version: Option<Value>,
    modulefiles: Option<String>,
    depends: OneOrMany<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EnvVarOptions {
    variable: Option<String>,
    value: Option<Value>,
    depends: OneOrMany<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PackageOptions {
    build_dir: Option<String>,
    depends: OneOrMany<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EnvironmentOptions {
    depends: OneOrMany<String>,
    environment: Option<String>,
    env_file: Option<Value>,
    extra_packages: Option<OneOrMany<String>>,
    venv_options: OneOrMany<String>,
    build_dir: Option<String>,
    conda_cmd: Option<String>,
    conda_activate_cmd: Option<String>,
}

impl EnvironmentOptions {
    fn conda_commands(&self) -> CondaCommands {
        let defaults = CondaCommands::default();
        CondaCommands {
            create: self.conda_cmd.clone().unwrap_or(defaults.create),
            activate: self.conda_activate_cmd.clone().unwrap_or(defaults.activate),
        }
    }

    fn extra_packages(&self) -> Vec<String> {
        self.extra_packages.clone().map(OneOrMany::into_vec).unwrap_or_default()
    }
}

/// Environment strategies selectable with `type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EnvironmentType {
    Folder,
    Venv,
    SystemVenv,
    Conda,
    Custom,
}

impl EnvironmentType {
    const TAGS: &'static [(&'static str, EnvironmentType)] = &[
        ("folder", Self::Folder),
        ("venv", Self::Venv),
        ("system_venv", Self::SystemVenv),
        ("conda", Self::Conda),
        ("custom", Self::Custom),
    ];

    fn parse(name: &str, tag: &str) -> Result<Self> {
        Self::TAGS.iter().find(|(known, _)| *known == tag).map(|(_, kind)| *kind).ok_or_else(|| {
            let tags: Vec<&str> = Self::TAGS.iter().map(|(known, _)| *known).collect();
            SuiteError::UnsupportedType {
                kind: "Environment".to_string(),
                name: name.to_string(),
                type_name: tag.to_string(),
                suggestion: closest_match(tag, &tags).map(str::to_string),
            }
        })
    }
}

/// Build a tool declared in `section`.
pub fn parse_tool(section: ToolSection, lib_dir: &str, name: &str, options: &Value) -> Result<Tool> {
    match section {
        ToolSection::Modules => parse_module(name, options),
        ToolSection::Packages => parse_package(lib_dir, name, options),
        ToolSection::Environments => parse_environment(lib_dir, name, options),
        ToolSection::EnvVariables => parse_env_var(name, options),
    }
}

/// `modules` entry: `name` (defaults to the entry name), `version`
/// (defaults to `default`), optional `modulefiles`.
pub fn parse_module(name: &str, options: &Value) -> Result<Tool> {
    let opts: ModuleOptions = from_options(name, options)?;
    let module = opts.name.as_deref().unwrap_or(name);
    let version = opts.version.as_ref().map_or_else(|| "default".to_string(), stringify);

    let tool = match opts.modulefiles.as_deref() {
        Some(modulefiles) if !modulefiles.is_empty() => {
            Tool::private_module(name, module, &version, modulefiles)?
        }
        _ => Tool::module(name, module, &version)?,
    };
    Ok(tool.with_depends(opts.depends.into_vec()).with_options(options.clone()))
}

/// `env_variables` entry: `variable` (defaults to the entry name), `value`.
pub fn parse_env_var(name: &str, options: &Value) -> Result<Tool> {
    let opts: EnvVarOptions = from_options(name, options)?;
    let variable = opts.variable.as_deref().unwrap_or(name);
    let value = opts.value.as_ref().map(stringify).unwrap_or_default();
    Ok(Tool::env_var(name, variable, &value)
        .with_depends(opts.depends.into_vec())
        .with_options(options.clone()))
}

/// `packages` entry: data retrieval options plus `depends` and `build_dir`.
pub fn parse_package(lib_dir: &str, name: &str, options: &Value) -> Result<Tool> {
    let opts: PackageOptions = from_options(name, options)?;
    Ok(Tool::package(name, lib_dir, opts.build_dir.as_deref(), options)?
        .with_depends(opts.depends.into_vec())
        .with_options(options.clone()))
}

/// `environments` entry, dispatched on `type`.
///
/// A `conda` environment takes exactly one of `environment` (existing),
/// `env_file` (created from a retrieved file) or `extra_packages` (created
/// from a package list).
pub fn parse_environment(lib_dir: &str, name: &str, options: &Value) -> Result<Tool> {
    let kind = EnvironmentType::parse(name, type_tag(name, options)?)?;
    let opts: EnvironmentOptions = from_options(name, options)?;

    let tool = match kind {
        EnvironmentType::Folder => Tool::folder(name, lib_dir),
        EnvironmentType::Venv | EnvironmentType::SystemVenv => {
            let spec = VenvSpec {
                system_site_packages: kind == EnvironmentType::SystemVenv,
                venv_options: opts.venv_options.clone().into_vec(),
                extra_packages: opts.extra_packages(),
            };
            Tool::venv(name, lib_dir, &spec)
        }
        EnvironmentType::Conda => parse_conda(lib_dir, name, &opts)?,
        EnvironmentType::Custom => Tool::custom(
            name,
            Script::from_value(options.get("load")),
            Script::from_value(options.get("unload")),
            Script::from_value(options.get("setup")),
        ),
    };
    Ok(tool.with_depends(opts.depends.into_vec()).with_options(options.clone()))
}

fn parse_conda(lib_dir: &str, name: &str, opts: &EnvironmentOptions) -> Result<Tool> {
    let commands = opts.conda_commands();
    match (&opts.environment, &opts.env_file, &opts.extra_packages) {
        (Some(environment), None, None) => Tool::conda(name, environment, &commands),
        (None, Some(env_file), None) => {
            Tool::file_conda(name, lib_dir, env_file, opts.build_dir.as_deref(), &commands)
        }
        (None, None, Some(_)) => Tool::simple_conda(name, lib_dir, &opts.extra_packages(), &commands),
        (None, None, None) => Err(SuiteError::MissingOption {
            name: name.to_string(),
            option: "environment, env_file or extra_packages".to_string(),
        }),
        (environment, env_file, extra_packages) => {
            let given: Vec<&str> = [
                ("environment", environment.is_some()),
                ("env_file", env_file.is_some()),
                ("extra_packages", extra_packages.is_some()),
            ]
            .into_iter()
            .filter_map(|(option, present)| present.then_some(option))
            .collect();
            Err(SuiteError::ConflictingOptions {
                name: name.to_string(),
                reason: format!("{} cannot be used at the same time for conda", given.join(" and ")),
            })
        }
    }
}
