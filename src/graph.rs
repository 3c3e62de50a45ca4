//! The structural code graph rules are evaluated against.
//!
//! A [`CodeGraph`] holds the classes of the codebase under check as nodes of a
//! directed dependency graph, plus the packages they live in. It is built once
//! per run by a [`CodeGraphImporter`] and shared read-only by every rule.
//!
//! The engine does not parse compiled code itself. [`JsonClassImporter`]
//! reads class manifests emitted by an external compile step:
//!
//! ```json
//! {
//!   "classes": [
//!     { "name": "com.acme.Foo", "annotations": ["Deprecated"], "dependencies": ["com.acme.Bar"] }
//!   ],
//!   "packages": [
//!     { "name": "com.acme.legacy", "annotations": ["Deprecated"] }
//!   ]
//! }
//! ```

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{ArchRulesError, Result};

/// A compiled class and its outgoing references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassNode {
    /// Fully-qualified, dot-separated name.
    pub name: String,
    #[serde(default)]
    pub annotations: Vec<String>,
    /// Fully-qualified names of referenced classes. Targets outside the graph are kept here
    /// but do not become edges.
    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl ClassNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            annotations: Vec::new(),
            dependencies: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_annotation(mut self, annotation: impl Into<String>) -> Self {
        self.annotations.push(annotation.into());
        self
    }

    #[must_use]
    pub fn with_dependency(mut self, target: impl Into<String>) -> Self {
        self.dependencies.push(target.into());
        self
    }

    /// The name after the last `.`.
    #[must_use]
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    /// The package part of the name, empty for the default package.
    #[must_use]
    pub fn package_name(&self) -> &str {
        self.name.rsplit_once('.').map_or("", |(pkg, _)| pkg)
    }

    #[must_use]
    pub fn is_annotated_with(&self, annotation: &str) -> bool {
        self.annotations.iter().any(|a| a == annotation)
    }
}

/// Package-level metadata (the equivalent of a `package-info`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageNode {
    pub name: String,
    #[serde(default)]
    pub annotations: Vec<String>,
}

impl PackageNode {
    #[must_use]
    pub fn is_annotated_with(&self, annotation: &str) -> bool {
        self.annotations.iter().any(|a| a == annotation)
    }
}

/// On-disk shape of one class manifest file.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassManifest {
    #[serde(default)]
    pub classes: Vec<ClassNode>,
    #[serde(default)]
    pub packages: Vec<PackageNode>,
}

/// Immutable structural graph of the codebase under check.
#[derive(Debug, Clone, Default)]
pub struct CodeGraph {
    graph: DiGraph<ClassNode, ()>,
    index: HashMap<String, NodeIndex>,
    packages: HashMap<String, PackageNode>,
    cyclic: HashSet<NodeIndex>,
}

impl CodeGraph {
    /// Builds a graph from classes and packages.
    ///
    /// A class name seen more than once keeps its first definition. Dependency
    /// edges are only created between classes present in the graph.
    pub fn new(classes: Vec<ClassNode>, packages: Vec<PackageNode>) -> Self {
        let mut graph = DiGraph::new();
        let mut index = HashMap::new();
        for class in classes {
            if index.contains_key(&class.name) {
                continue;
            }
            let name = class.name.clone();
            let idx = graph.add_node(class);
            index.insert(name, idx);
        }

        let edges: Vec<(NodeIndex, NodeIndex)> = graph
            .node_indices()
            .flat_map(|from| {
                graph[from]
                    .dependencies
                    .iter()
                    .filter_map(|target| index.get(target).map(|&to| (from, to)))
                    .collect::<Vec<_>>()
            })
            .collect();
        for (from, to) in edges {
            graph.update_edge(from, to, ());
        }

        let mut cyclic = HashSet::new();
        for component in tarjan_scc(&graph) {
            if component.len() > 1 {
                cyclic.extend(component);
            } else if let Some(&only) = component.first() {
                if graph.contains_edge(only, only) {
                    cyclic.insert(only);
                }
            }
        }

        let packages = packages.into_iter().map(|p| (p.name.clone(), p)).collect();
        Self {
            graph,
            index,
            packages,
            cyclic,
        }
    }

    /// Iterates over all classes in insertion order.
    pub fn classes(&self) -> impl Iterator<Item = &ClassNode> {
        self.graph.node_weights()
    }

    pub fn class(&self, name: &str) -> Option<&ClassNode> {
        self.index.get(name).map(|&idx| &self.graph[idx])
    }

    pub fn package(&self, name: &str) -> Option<&PackageNode> {
        self.packages.get(name)
    }

    /// Package metadata of the package `class` resides in.
    pub fn package_of(&self, class: &ClassNode) -> Option<&PackageNode> {
        self.package(class.package_name())
    }

    /// Classes inside the graph that `name` depends on.
    pub fn dependencies_of(&self, name: &str) -> Vec<&ClassNode> {
        self.index
            .get(name)
            .map(|&idx| self.graph.neighbors(idx).map(|n| &self.graph[n]).collect())
            .unwrap_or_default()
    }

    /// Whether `name` takes part in a dependency cycle.
    #[must_use]
    pub fn is_in_cycle(&self, name: &str) -> bool {
        self.index
            .get(name)
            .is_some_and(|idx| self.cyclic.contains(idx))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }
}

/// Produces a [`CodeGraph`] from a set of compiled-code locations.
///
/// Import is expected to be expensive; the runner calls it once per run.
pub trait CodeGraphImporter {
    fn import(&self, locations: &[PathBuf]) -> Result<CodeGraph>;
}

/// Imports class manifests written as JSON.
///
/// Each location is either a manifest file or a directory that is walked
/// recursively for `*.json` files.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonClassImporter;

impl JsonClassImporter {
    pub fn new() -> Self {
        JsonClassImporter
    }

    fn manifest_files(location: &Path) -> Result<Vec<PathBuf>> {
        if !location.exists() {
            return Err(ArchRulesError::import_error_at(
                location.to_path_buf(),
                "location does not exist",
            ));
        }
        if location.is_file() {
            return Ok(vec![location.to_path_buf()]);
        }
        let mut files = Vec::new();
        for entry in WalkDir::new(location).sort_by_file_name() {
            let entry = entry?;
            if entry.file_type().is_file()
                && entry.path().extension().is_some_and(|ext| ext == "json")
            {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }

    fn read_manifest(path: &Path) -> Result<ClassManifest> {
        let content = fs::read_to_string(path).map_err(|e| ArchRulesError::ImportError {
            location: Some(path.to_path_buf()),
            context: "failed to read class manifest".to_string(),
            source: Some(Box::new(e)),
        })?;
        serde_json::from_str(&content).map_err(|e| ArchRulesError::ImportError {
            location: Some(path.to_path_buf()),
            context: format!("malformed class manifest: {}", e),
            source: Some(Box::new(e)),
        })
    }
}

impl CodeGraphImporter for JsonClassImporter {
    #[tracing::instrument(level = "debug", skip_all, fields(locations = locations.len()), err)]
    fn import(&self, locations: &[PathBuf]) -> Result<CodeGraph> {
        let mut classes = Vec::new();
        let mut packages = Vec::new();
        for location in locations {
            for file in Self::manifest_files(location)? {
                tracing::trace!(file = %file.display(), "Reading class manifest");
                let manifest = Self::read_manifest(&file)?;
                classes.extend(manifest.classes);
                packages.extend(manifest.packages);
            }
        }
        let graph = CodeGraph::new(classes, packages);
        tracing::debug!(classes = graph.len(), "Imported code graph");
        Ok(graph)
    }
}
