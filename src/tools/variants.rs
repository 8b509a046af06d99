//! Script synthesis for each tool kind.
//!
//! Constructors return a [`Tool`] with its scripts filled in; dependencies
//! and options are attached by the caller.

use serde_yaml::Value;

use super::{Tool, ToolKind};
use crate::core::{Result, SuiteError};
use crate::data::parse_data_item;
use crate::models::{basename, join_path};
use crate::scripts::{Script, templates, update_label_version};

/// Virtual environment settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VenvSpec {
    /// Inherit the system interpreter's site packages
    pub system_site_packages: bool,
    /// Extra `python3 -m venv` arguments
    pub venv_options: Vec<String>,
    /// Packages installed with pip after creation
    pub extra_packages: Vec<String>,
}

/// Conda commands used by conda-backed tools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CondaCommands {
    /// Command creating environments (`conda`, `mamba`)
    pub create: String,
    /// Command activating environments (`conda`, `source`)
    pub activate: String,
}

impl Default for CondaCommands {
    fn default() -> Self {
        Self {
            create: "conda".to_string(),
            activate: "conda".to_string(),
        }
    }
}

impl Tool {
    /// Environment module at a version.
    pub fn module(name: &str, module: &str, version: &str) -> Result<Self> {
        let mut tool = Self::new(name, ToolKind::Module);
        tool.load.push(templates::module_load(module, version, None)?);
        tool.unload.push(templates::module_unload(module));
        Ok(tool)
    }

    /// Environment module found through an extra module path.
    pub fn private_module(name: &str, module: &str, version: &str, modulefiles: &str) -> Result<Self> {
        let mut tool = Self::new(name, ToolKind::PrivateModule);
        tool.load.push(templates::module_load(module, version, Some(modulefiles))?);
        tool.unload.push(templates::module_unload(module));
        Ok(tool)
    }

    /// Environment variable. Variables whose name contains `PATH` are
    /// extended and trimmed rather than replaced.
    pub fn env_var(name: &str, variable: &str, value: &str) -> Self {
        let mut tool = Self::new(name, ToolKind::EnvVar);
        if variable.to_uppercase().contains("PATH") {
            tool.load.push(templates::env_path_load(variable, value));
            tool.unload.push(templates::env_path_unload(variable, value));
        } else {
            tool.load.push(templates::env_var_load(variable, value));
            tool.unload.push(templates::env_var_unload(variable));
        }
        tool
    }

    /// `lib_dir/name` added to `PATH`, created empty on setup.
    pub fn folder(name: &str, lib_dir: &str) -> Self {
        let folder = join_path(lib_dir, name);
        let mut tool = Self::env_var(name, "PATH", &folder);
        tool.kind = ToolKind::Folder;
        tool.setup = Script::from_fragments([format!("rm -rf {folder}"), format!("mkdir -p {folder}")]);
        tool
    }

    /// Package retrieved like a data item into a build directory.
    ///
    /// The build directory defaults to `lib_dir/build/${ENV_NAME:-}` so that
    /// each environment family gets its own copy.
    pub fn package(name: &str, lib_dir: &str, build_dir: Option<&str>, options: &Value) -> Result<Self> {
        let build_dir = match build_dir {
            Some(dir) => dir.to_string(),
            None => join_path(&join_path(lib_dir, "build"), "${ENV_NAME:-}"),
        };
        let retrieval = parse_data_item(&build_dir, name, options)?;

        let mut tool = Self::new(name, ToolKind::Package);
        tool.setup = retrieval.script;
        tool.setup.push(update_label_version());
        Ok(tool)
    }

    /// Python virtual environment in `lib_dir/name`.
    pub fn venv(name: &str, lib_dir: &str, spec: &VenvSpec) -> Self {
        let root = join_path(lib_dir, name);
        let kind = if spec.system_site_packages { ToolKind::SystemVenv } else { ToolKind::Venv };
        let mut tool = Self::new(name, kind);

        tool.load = Script::from_fragments([
            format!("source {}", join_path(&root, "bin/activate")),
            format!("export LD_LIBRARY_PATH={}:${{LD_LIBRARY_PATH:=}}", join_path(&root, "lib")),
        ]);
        tool.unload.push("deactivate");

        let mut venv_args = Vec::new();
        if spec.system_site_packages {
            venv_args.push("--system-site-packages".to_string());
        }
        venv_args.extend(spec.venv_options.iter().filter(|opt| !opt.is_empty()).cloned());
        let create = if venv_args.is_empty() {
            format!("python3 -m venv {root}")
        } else {
            format!("python3 -m venv {root} {}", venv_args.join(" "))
        };

        tool.setup = Script::from_fragments([format!("rm -rf {root}"), create]);
        if !spec.extra_packages.is_empty() {
            let load = tool.load.clone();
            tool.setup.append(&load);
            tool.setup.push(format!("pip install {}", spec.extra_packages.join(" ")));
        }
        tool
    }

    /// Existing conda environment, by name or path.
    pub fn conda(name: &str, environment: &str, commands: &CondaCommands) -> Result<Self> {
        let mut tool = Self::new(name, ToolKind::CondaEnv);
        tool.load.push(templates::conda_activate(&commands.activate, environment)?);
        tool.unload.push(templates::conda_deactivate(&commands.activate));
        Ok(tool)
    }

    /// Conda environment in `lib_dir/name` created from a retrieved
    /// environment file.
    ///
    /// `env_file` holds data retrieval options; the file lands in
    /// `build_dir/name/` (`build_dir` defaults to `lib_dir/build`).
    pub fn file_conda(
        name: &str,
        lib_dir: &str,
        env_file: &Value,
        build_dir: Option<&str>,
        commands: &CondaCommands,
    ) -> Result<Self> {
        let root = join_path(lib_dir, name);
        let build_dir = build_dir.map_or_else(|| join_path(lib_dir, "build"), str::to_string);
        let file_name = match env_file.get("files") {
            None | Some(Value::Null) => env_file
                .get("source")
                .and_then(Value::as_str)
                .map(|source| basename(source).to_string())
                .unwrap_or_default(),
            Some(Value::String(file)) if !file.is_empty() => file.clone(),
            Some(Value::Sequence(files)) => match files.as_slice() {
                [Value::String(file)] if !file.is_empty() => file.clone(),
                _ => return Err(env_file_error(name)),
            },
            Some(_) => return Err(env_file_error(name)),
        };
        let retrieval = parse_data_item(&build_dir, name, env_file)?;
        let env_file_path = join_path(&retrieval.path, &file_name);

        let mut tool = Self::conda(name, &root, commands)?;
        tool.kind = ToolKind::FileCondaEnv;
        tool.setup = retrieval.script;
        tool.setup.push(templates::conda_from_file(&commands.create, &env_file_path, &root)?);
        Ok(tool)
    }

    /// Conda environment in `lib_dir/name` created from a package list.
    pub fn simple_conda(name: &str, lib_dir: &str, packages: &[String], commands: &CondaCommands) -> Result<Self> {
        let root = join_path(lib_dir, name);
        let mut tool = Self::conda(name, &root, commands)?;
        tool.kind = ToolKind::SimpleCondaEnv;
        tool.setup.push(templates::conda_from_packages(&commands.create, &root, packages)?);
        Ok(tool)
    }

    /// Tool whose scripts are given verbatim.
    pub fn custom(name: &str, load: Script, unload: Script, setup: Script) -> Self {
        let mut tool = Self::new(name, ToolKind::Custom);
        tool.load = load;
        tool.unload = unload;
        tool.setup = setup;
        tool
    }
}

fn env_file_error(name: &str) -> SuiteError {
    SuiteError::InvalidOptions {
        name: name.to_string(),
        reason: "env_file.files must name exactly one file".to_string(),
    }
}
