//! `suitekit tools`: compose tool scripts from a profile.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use serde_json::json;
use serde_yaml::Value;

use super::args::{OutputFormat, ProfileArgs, print_json};
use crate::config::stringify;
use crate::tools::{ToolSection, ToolStore};

/// Library directory used when neither the flag nor the profile sets one.
pub const DEFAULT_LIB_DIR: &str = "$LIB_DIR";

/// Print load, unload and setup scripts of the tools of a profile.
///
/// Tools are read from the profile's `tools` section, or from the top level
/// when there is no such section.
#[derive(Args, Debug)]
pub struct ToolsCommand {
    #[command(flatten)]
    profile: ProfileArgs,

    /// Install root of the tools (defaults to the profile's `lib_dir`, then `$LIB_DIR`)
    #[arg(long = "lib-dir", value_name = "DIR")]
    lib_dir: Option<String>,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[command(subcommand)]
    action: ToolsAction,
}

#[derive(Subcommand, Debug)]
enum ToolsAction {
    /// Script loading the tools and their dependencies
    Load {
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Script unloading the tools, in reverse dependency order
    Unload {
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Script installing a tool after loading its dependencies
    Setup { name: String },
    /// Transitive dependencies of a tool
    Depends { name: String },
    /// Dependency tree of a tool
    Tree { name: String },
    /// Tools of every section
    List,
}

impl ToolsCommand {
    pub fn execute(self) -> Result<()> {
        let tree = self.profile.load()?;
        let lib_dir = resolve_lib_dir(self.lib_dir.as_deref(), &tree);
        let section = tree.get("tools").unwrap_or(&tree);
        let store = ToolStore::new(&lib_dir, section)
            .with_context(|| format!("Failed to build tools of profile '{}'", self.profile.profile))?;

        match &self.action {
            ToolsAction::Load { names } => self.print_script(&store.load(names)?),
            ToolsAction::Unload { names } => self.print_script(&store.unload(names)?),
            ToolsAction::Setup { name } => self.print_script(&store.setup(name)?),
            ToolsAction::Depends { name } => {
                let depends = store.depends(name)?;
                match self.format {
                    OutputFormat::Json => print_json(&depends),
                    OutputFormat::Text => {
                        depends.iter().for_each(|dep| println!("{dep}"));
                        Ok(())
                    }
                }
            }
            ToolsAction::Tree { name } => match self.format {
                OutputFormat::Json => print_json(&json!({
                    "name": name,
                    "depends": store.get(name)?.depends,
                    "install_order": store.install_order(&[name])?,
                })),
                OutputFormat::Text => {
                    print!("{}", store.tree(name)?);
                    Ok(())
                }
            },
            ToolsAction::List => {
                let sections: Vec<(&str, Vec<&str>)> = ToolSection::ALL
                    .iter()
                    .map(|&section| (section.key(), store.section_names(section)))
                    .collect();
                match self.format {
                    OutputFormat::Json => {
                        let map: serde_json::Map<String, serde_json::Value> =
                            sections.into_iter().map(|(key, names)| (key.to_string(), json!(names))).collect();
                        print_json(&map)
                    }
                    OutputFormat::Text => {
                        for (key, names) in sections.iter().filter(|(_, names)| !names.is_empty()) {
                            println!("{key}:");
                            names.iter().for_each(|name| println!("  {name}"));
                        }
                        Ok(())
                    }
                }
            }
        }
    }

    fn print_script(&self, script: &crate::scripts::Script) -> Result<()> {
        match self.format {
            OutputFormat::Json => print_json(script),
            OutputFormat::Text => {
                println!("{script}");
                Ok(())
            }
        }
    }
}

/// `--lib-dir`, else the profile's `lib_dir`, else `$LIB_DIR`.
fn resolve_lib_dir(flag: Option<&str>, tree: &Value) -> String {
    flag.map(str::to_string)
        .or_else(|| tree.get("lib_dir").map(stringify))
        .unwrap_or_else(|| DEFAULT_LIB_DIR.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lib_dir_resolution() {
        let tree: Value = serde_yaml::from_str("lib_dir: /suite/lib").unwrap();
        assert_eq!(resolve_lib_dir(Some("/flag"), &tree), "/flag");
        assert_eq!(resolve_lib_dir(None, &tree), "/suite/lib");
        assert_eq!(resolve_lib_dir(None, &Value::Null), DEFAULT_LIB_DIR);
    }
}
