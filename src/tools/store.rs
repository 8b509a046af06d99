//! Registry of tools and dependency-ordered script composition.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde_yaml::Value;
use tracing::{debug, warn};

use super::graph::DependencyGraph;
use super::parse::parse_tool;
use super::{ScriptRole, Tool, ToolSection};
use crate::config::stringify;
use crate::core::{Result, SuiteError};
use crate::scripts::Script;

/// First fragment of every load and setup script.
pub const LOAD_HEADER: &str = "# load tools and activate environment";

/// First fragment of every unload script.
pub const UNLOAD_HEADER: &str = "# unload tools and deactivate environment";

/// Tools of a suite, keyed by name in declaration order.
///
/// Sections are read in the order `modules`, `packages`, `environments`,
/// `env_variables`. Dependencies are checked for cycles when the store is
/// built; names that do not resolve fail with [`SuiteError::ToolNotFound`]
/// when a script needs them.
#[derive(Debug, Clone, Default)]
pub struct ToolStore {
    lib_dir: String,
    tools: IndexMap<String, Tool>,
    sections: IndexMap<ToolSection, Vec<String>>,
    graph: DependencyGraph,
}

impl ToolStore {
    /// Build every tool declared in `options` with `lib_dir` as install root.
    pub fn new(lib_dir: &str, options: &Value) -> Result<Self> {
        let mut store = Self {
            lib_dir: lib_dir.to_string(),
            ..Self::default()
        };
        match options {
            Value::Null => return Ok(store),
            Value::Mapping(_) => {}
            _ => {
                return Err(SuiteError::InvalidOptions {
                    name: "tools".to_string(),
                    reason: "expected a mapping of tool sections".to_string(),
                });
            }
        }

        for &section in ToolSection::ALL {
            let entries = match options.get(section.key()) {
                None | Some(Value::Null) => continue,
                Some(Value::Mapping(entries)) => entries,
                Some(_) => {
                    return Err(SuiteError::InvalidOptions {
                        name: section.key().to_string(),
                        reason: "expected a mapping of tools".to_string(),
                    });
                }
            };
            for (name, tool_options) in entries {
                let name = stringify(name);
                let tool = parse_tool(section, lib_dir, &name, tool_options)?;
                store.add_tool(section, tool);
            }
        }

        for tool in store.tools.values() {
            store.graph.ensure_node(&tool.name);
            for dependency in &tool.depends {
                store.graph.add_dependency(&tool.name, dependency);
            }
        }
        store.graph.detect_cycles()?;

        debug!(
            "Built {} tools under {} ({} dependency edges)",
            store.tools.len(),
            store.lib_dir,
            store.graph.edge_count()
        );
        Ok(store)
    }

    fn add_tool(&mut self, section: ToolSection, tool: Tool) {
        let name = tool.name.clone();
        if self.tools.contains_key(&name) {
            warn!("Tool '{name}' declared more than once; the {section} entry replaces the earlier one");
            for names in self.sections.values_mut() {
                names.retain(|existing| existing != &name);
            }
        }
        self.sections.entry(section).or_default().push(name.clone());
        self.tools.insert(name, tool);
    }

    pub fn lib_dir(&self) -> &str {
        &self.lib_dir
    }

    /// Tool by name.
    pub fn get(&self, name: &str) -> Result<&Tool> {
        self.tools.get(name).ok_or_else(|| SuiteError::ToolNotFound {
            name: name.to_string(),
        })
    }

    /// Tools in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Tool)> {
        self.tools.iter().map(|(name, tool)| (name.as_str(), tool))
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Names of the tools declared in `section`.
    pub fn section_names(&self, section: ToolSection) -> Vec<&str> {
        self.sections
            .get(&section)
            .map(|names| names.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Scripts of `name` and its transitive dependencies for `role`.
    ///
    /// Dependencies come before dependents. A tool reached through several
    /// paths appears once, at its first position. Tools with an empty script
    /// for `role` are left out.
    pub fn script_for(&self, role: ScriptRole, name: &str) -> Result<IndexMap<String, Script>> {
        let mut scripts = IndexMap::new();
        let mut visited = HashSet::new();
        self.collect(role, name, &mut scripts, &mut visited)?;
        Ok(scripts)
    }

    fn collect(
        &self,
        role: ScriptRole,
        name: &str,
        scripts: &mut IndexMap<String, Script>,
        visited: &mut HashSet<String>,
    ) -> Result<()> {
        if !visited.insert(name.to_string()) {
            return Ok(());
        }
        let tool = self.get(name)?;
        for dependency in &tool.depends {
            self.collect(role, dependency, scripts, visited)?;
        }
        let script = tool.script(role);
        if !script.is_empty() {
            scripts.entry(name.to_string()).or_insert_with(|| script.clone());
        }
        Ok(())
    }

    /// Load script for `names` and everything they depend on.
    pub fn load<S: AsRef<str>>(&self, names: &[S]) -> Result<Script> {
        let mut scripts = IndexMap::new();
        let mut visited = HashSet::new();
        for name in names {
            self.collect(ScriptRole::Load, name.as_ref(), &mut scripts, &mut visited)?;
        }
        Ok(Self::assemble(LOAD_HEADER, scripts.values()))
    }

    /// Unload script for `names`, in reverse dependency order.
    pub fn unload<S: AsRef<str>>(&self, names: &[S]) -> Result<Script> {
        let mut scripts = IndexMap::new();
        let mut visited = HashSet::new();
        for name in names {
            self.collect(ScriptRole::Unload, name.as_ref(), &mut scripts, &mut visited)?;
        }
        Ok(Self::assemble(UNLOAD_HEADER, scripts.values().rev()))
    }

    /// Setup script of `name`: its dependencies are loaded first.
    pub fn setup(&self, name: &str) -> Result<Script> {
        let tool = self.get(name)?;
        let mut scripts = IndexMap::new();
        let mut visited = HashSet::from([name.to_string()]);
        for dependency in &tool.depends {
            self.collect(ScriptRole::Load, dependency, &mut scripts, &mut visited)?;
        }
        Ok(Self::assemble(LOAD_HEADER, scripts.values()).then(&tool.setup))
    }

    fn assemble<'a>(header: &str, scripts: impl Iterator<Item = &'a Script>) -> Script {
        scripts.fold(Script::from(header), |script, next| script.then(next))
    }

    /// Transitive dependencies of `name`, each followed by its own.
    ///
    /// Shared dependencies are listed once per path that reaches them.
    pub fn depends(&self, name: &str) -> Result<Vec<String>> {
        let tool = self.get(name)?;
        let mut depends = Vec::new();
        for dependency in &tool.depends {
            depends.push(dependency.clone());
            depends.extend(self.depends(dependency)?);
        }
        Ok(depends)
    }

    /// Order in which `names` and their dependencies have to be set up.
    pub fn install_order<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<String>> {
        for name in names {
            self.get(name.as_ref())?;
        }
        let roots: Vec<&str> = names.iter().map(|name| name.as_ref()).collect();
        self.graph.install_order(&roots)
    }

    /// Dependency tree of `name` for display.
    pub fn tree(&self, name: &str) -> Result<String> {
        self.get(name)?;
        Ok(self.graph.to_tree_string(name))
    }
}
