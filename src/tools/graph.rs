//! Dependency graph between tools.
//!
//! Built once by the store to reject cycles before any script is composed,
//! and to answer ordering and display queries.

use std::collections::{HashMap, HashSet};

use petgraph::graph::{DiGraph, NodeIndex};

use crate::core::{Result, SuiteError};

/// Color states for cycle detection using DFS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    /// Node has not been visited.
    White,
    /// Node is on the current DFS path.
    Gray,
    /// Node and everything below it has been visited.
    Black,
}

/// Directed graph of tool names; an edge `a -> b` means `a` depends on `b`.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    graph: DiGraph<String, ()>,
    node_map: HashMap<String, NodeIndex>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node if it doesn't already exist.
    pub fn ensure_node(&mut self, name: &str) -> NodeIndex {
        if let Some(&index) = self.node_map.get(name) {
            index
        } else {
            let index = self.graph.add_node(name.to_string());
            self.node_map.insert(name.to_string(), index);
            index
        }
    }

    /// Record that `from` depends on `to`.
    pub fn add_dependency(&mut self, from: &str, to: &str) {
        let from_idx = self.ensure_node(from);
        let to_idx = self.ensure_node(to);
        if !self.graph.contains_edge(from_idx, to_idx) {
            self.graph.add_edge(from_idx, to_idx, ());
        }
    }

    /// Fail with the cycle path if the dependencies are cyclic.
    pub fn detect_cycles(&self) -> Result<()> {
        let mut colors: HashMap<NodeIndex, Color> =
            self.graph.node_indices().map(|node| (node, Color::White)).collect();
        let mut path: Vec<NodeIndex> = Vec::new();

        for node in self.graph.node_indices() {
            if matches!(colors.get(&node), Some(Color::White))
                && let Some(cycle) = self.dfs_visit(node, &mut colors, &mut path)
            {
                let chain = cycle.iter().map(|idx| self.graph[*idx].as_str()).collect::<Vec<_>>();
                return Err(SuiteError::CircularDependency {
                    chain: chain.join(" → "),
                });
            }
        }
        Ok(())
    }

    /// Returns the cycle, closed on its first node, if one is reachable.
    fn dfs_visit(
        &self,
        node: NodeIndex,
        colors: &mut HashMap<NodeIndex, Color>,
        path: &mut Vec<NodeIndex>,
    ) -> Option<Vec<NodeIndex>> {
        colors.insert(node, Color::Gray);
        path.push(node);

        for neighbor in self.neighbors(node) {
            match colors.get(&neighbor) {
                Some(Color::Gray) => {
                    let start = path.iter().position(|n| *n == neighbor).unwrap_or(0);
                    let mut cycle = path[start..].to_vec();
                    cycle.push(neighbor);
                    return Some(cycle);
                }
                Some(Color::White) => {
                    if let Some(cycle) = self.dfs_visit(neighbor, colors, path) {
                        return Some(cycle);
                    }
                }
                _ => {}
            }
        }

        path.pop();
        colors.insert(node, Color::Black);
        None
    }

    /// Direct dependencies in declaration order.
    fn neighbors(&self, node: NodeIndex) -> Vec<NodeIndex> {
        // petgraph yields the most recently added edge first
        let mut neighbors: Vec<NodeIndex> = self.graph.neighbors(node).collect();
        neighbors.reverse();
        neighbors
    }

    /// Direct dependencies of `name` in declaration order.
    pub fn direct_dependencies(&self, name: &str) -> Vec<&str> {
        self.node_map
            .get(name)
            .map(|&idx| self.neighbors(idx).into_iter().map(|n| self.graph[n].as_str()).collect())
            .unwrap_or_default()
    }

    /// Installation order for `roots`: every dependency before its dependents,
    /// each name once, ties broken by declaration order.
    pub fn install_order(&self, roots: &[&str]) -> Result<Vec<String>> {
        self.detect_cycles()?;
        let mut order = Vec::new();
        let mut visited = HashSet::new();
        for root in roots {
            if let Some(&idx) = self.node_map.get(*root) {
                self.post_order(idx, &mut visited, &mut order);
            }
        }
        Ok(order)
    }

    fn post_order(&self, node: NodeIndex, visited: &mut HashSet<NodeIndex>, order: &mut Vec<String>) {
        if !visited.insert(node) {
            return;
        }
        for neighbor in self.neighbors(node) {
            self.post_order(neighbor, visited, order);
        }
        order.push(self.graph[node].clone());
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Human-readable dependency tree rooted at `root`.
    ///
    /// Subtrees already printed are marked instead of repeated.
    pub fn to_tree_string(&self, root: &str) -> String {
        let mut result = format!("{root}\n");
        let mut visited = HashSet::new();
        visited.insert(root.to_string());
        let deps = self.direct_dependencies(root);
        for (i, dep) in deps.iter().enumerate() {
            self.build_tree_string(dep, &mut result, "", i == deps.len() - 1, &mut visited);
        }
        result
    }

    fn build_tree_string(
        &self,
        name: &str,
        result: &mut String,
        prefix: &str,
        is_last: bool,
        visited: &mut HashSet<String>,
    ) {
        let connector = if is_last { "└── " } else { "├── " };
        let child_prefix = if is_last { format!("{prefix}    ") } else { format!("{prefix}│   ") };

        if !visited.insert(name.to_string()) {
            result.push_str(&format!("{prefix}{connector}{name} (*)\n"));
            return;
        }
        result.push_str(&format!("{prefix}{connector}{name}\n"));

        let deps = self.direct_dependencies(name);
        for (i, dep) in deps.iter().enumerate() {
            self.build_tree_string(dep, result, &child_prefix, i == deps.len() - 1, visited);
        }
    }
}
