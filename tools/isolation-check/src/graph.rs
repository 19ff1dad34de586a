//! # Module Dependency Graph
//!
//! Nodes are modules, edges are references from one module into another.
//! An edge is a violation when its target is a domain module (not the
//! shared kernel) and the reference goes below that module's public
//! surface. A module referring to itself produces no edge.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::config::CheckerConfig;
use crate::scanner::{Reference, ScannedModule};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Allowed,
    Violation,
}

/// A scanned module and the modules it references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleNode {
    pub module_name: String,
    pub shared_kernel: bool,
    pub files_scanned: usize,
    pub declared_imports: BTreeSet<String>,
}

/// One distinct reference from `from_module` into `to_module`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyEdge {
    pub from_module: String,
    pub to_module: String,
    pub import_path: String,
    pub classification: Classification,
    /// First place the reference appears
    pub file: PathBuf,
    pub line: usize,
}

impl DependencyEdge {
    pub fn is_violation(&self) -> bool {
        self.classification == Classification::Violation
    }
}

impl fmt::Display for DependencyEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} (via {})",
            self.from_module, self.to_module, self.import_path
        )
    }
}

/// Directed graph of module references.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    nodes: BTreeMap<String, ModuleNode>,
    edges: Vec<DependencyEdge>,
}

impl DependencyGraph {
    /// Build the graph from a scan, classifying every edge.
    pub fn build(scanned: &[ScannedModule], config: &CheckerConfig) -> Self {
        let known: BTreeSet<&str> = scanned.iter().map(|m| m.name.as_str()).collect();
        let mut nodes = BTreeMap::new();
        let mut edges: BTreeMap<(String, String, String), DependencyEdge> = BTreeMap::new();

        for module in scanned {
            let mut declared_imports = BTreeSet::new();
            for reference in &module.references {
                let target = reference.target_module();
                if target == module.name {
                    continue;
                }
                if !known.contains(target) && !config.is_shared(target) {
                    continue;
                }
                declared_imports.insert(target.to_string());

                let key = (
                    module.name.clone(),
                    target.to_string(),
                    reference.import_path.clone(),
                );
                edges
                    .entry(key)
                    .or_insert_with(|| edge(&module.name, reference, config));
            }

            nodes.insert(
                module.name.clone(),
                ModuleNode {
                    module_name: module.name.clone(),
                    shared_kernel: config.is_shared(&module.name),
                    files_scanned: module.files.len(),
                    declared_imports,
                },
            );
        }

        Self {
            nodes,
            edges: edges.into_values().collect(),
        }
    }

    pub fn nodes(&self) -> impl Iterator<Item = &ModuleNode> {
        self.nodes.values()
    }

    pub fn node(&self, name: &str) -> Option<&ModuleNode> {
        self.nodes.get(name)
    }

    pub fn edges(&self) -> &[DependencyEdge] {
        &self.edges
    }

    pub fn violations(&self) -> impl Iterator<Item = &DependencyEdge> {
        self.edges.iter().filter(|e| e.is_violation())
    }

    /// Cycles among domain-to-domain edges, allowed edges included.
    ///
    /// One cycle is reported per back edge found by a depth-first walk.
    /// Each cycle starts at its alphabetically smallest module and repeats
    /// it at the end: `[a, b, a]`.
    pub fn find_cycles(&self) -> Vec<Vec<String>> {
        let adjacency = self.domain_adjacency();
        let mut state = BTreeMap::new();
        let mut stack = Vec::new();
        let mut found = BTreeSet::new();

        for &start in adjacency.keys() {
            if !state.contains_key(start) {
                visit(start, &adjacency, &mut state, &mut stack, &mut found);
            }
        }

        found.into_iter().collect()
    }

    fn domain_adjacency(&self) -> BTreeMap<&str, BTreeSet<&str>> {
        let mut adjacency: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        for edge in &self.edges {
            let shared = |name: &str| self.nodes.get(name).map_or(true, |n| n.shared_kernel);
            if shared(&edge.from_module) || shared(&edge.to_module) {
                continue;
            }
            adjacency
                .entry(edge.from_module.as_str())
                .or_default()
                .insert(edge.to_module.as_str());
        }
        adjacency
    }
}

fn edge(from: &str, reference: &Reference, config: &CheckerConfig) -> DependencyEdge {
    let target = reference.target_module();
    let allowed = config.is_shared(target)
        || reference
            .target_submodule()
            .is_some_and(|sub| config.is_public_surface(sub));

    DependencyEdge {
        from_module: from.to_string(),
        to_module: target.to_string(),
        import_path: reference.import_path.clone(),
        classification: if allowed {
            Classification::Allowed
        } else {
            Classification::Violation
        },
        file: reference.file.clone(),
        line: reference.line,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    OnStack,
    Done,
}

fn visit<'a>(
    node: &'a str,
    adjacency: &BTreeMap<&'a str, BTreeSet<&'a str>>,
    state: &mut BTreeMap<&'a str, Visit>,
    stack: &mut Vec<&'a str>,
    found: &mut BTreeSet<Vec<String>>,
) {
    state.insert(node, Visit::OnStack);
    stack.push(node);

    if let Some(targets) = adjacency.get(node) {
        for &next in targets {
            match state.get(next) {
                None => visit(next, adjacency, state, stack, found),
                Some(Visit::OnStack) => {
                    if let Some(pos) = stack.iter().position(|n| *n == next) {
                        found.insert(rotate_cycle(&stack[pos..]));
                    }
                }
                Some(Visit::Done) => {}
            }
        }
    }

    stack.pop();
    state.insert(node, Visit::Done);
}

fn rotate_cycle(members: &[&str]) -> Vec<String> {
    let start = members
        .iter()
        .enumerate()
        .min_by_key(|(_, name)| **name)
        .map_or(0, |(i, _)| i);
    let mut cycle: Vec<String> = members[start..]
        .iter()
        .chain(&members[..start])
        .map(|name| (*name).to_string())
        .collect();
    if let Some(first) = cycle.first().cloned() {
        cycle.push(first);
    }
    cycle
}
