//! Dependency graph between workflow modules.
//!
//! The graph is consumed lazily, one layer per wave: the ready set is every
//! canonical name whose modules have no remaining dependencies, and retiring a
//! ready set removes those names from every other module's dependency set.

use crate::actions::module::ActionModule;
use crate::error::{ActionError, Result};
use petgraph::Graph;
use petgraph::algo::tarjan_scc;
use petgraph::graph::NodeIndex;
use std::collections::{BTreeSet, HashMap};

/// Mutable dependency state for one resolver run
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    modules: Vec<ActionModule>,
}

impl DependencyGraph {
    /// Build the graph, dropping references that cannot take part in it
    ///
    /// A reference to a name no module carries, or a module referencing its
    /// own name, is logged and removed from the dependency set.
    pub fn build(mut modules: Vec<ActionModule>) -> Self {
        let known: BTreeSet<String> = modules.iter().map(|m| m.canonical_name.clone()).collect();

        for module in &mut modules {
            let own_name = module.canonical_name.clone();
            module.dependencies.retain(|dependency| {
                if *dependency == own_name {
                    log::warn!("{} references itself at @main, leaving it as is", module.path);
                    false
                } else if !known.contains(dependency) {
                    log::warn!(
                        "{} references {}@main, which has no workflow definition",
                        module.path,
                        dependency
                    );
                    false
                } else {
                    true
                }
            });
        }

        Self { modules }
    }

    /// Modules in discovery order
    pub fn modules(&self) -> &[ActionModule] {
        &self.modules
    }

    /// Fail when the remaining dependencies contain a cycle
    pub fn validate_no_cycles(&self) -> Result<()> {
        let mut graph: Graph<String, (), petgraph::Directed> = Graph::new();
        let mut node_map: HashMap<&str, NodeIndex> = HashMap::with_capacity(self.modules.len());

        for module in &self.modules {
            let name = module.canonical_name.as_str();
            if !node_map.contains_key(name) {
                node_map.insert(name, graph.add_node(name.to_string()));
            }
        }

        // Edge from dependency to dependent
        for module in &self.modules {
            let dependent = node_map[module.canonical_name.as_str()];
            for dependency in &module.dependencies {
                if let Some(&index) = node_map.get(dependency.as_str()) {
                    graph.update_edge(index, dependent, ());
                }
            }
        }

        for component in tarjan_scc(&graph) {
            if component.len() > 1 {
                let mut names: Vec<String> = component
                    .into_iter()
                    .map(|index| graph[index].clone())
                    .collect();
                names.sort();
                return Err(ActionError::CircularDependency { modules: names }.into());
            }
        }
        Ok(())
    }

    /// Canonical names whose every module has no remaining dependencies
    pub fn ready_set(&self) -> BTreeSet<String> {
        let blocked: BTreeSet<&str> = self
            .modules
            .iter()
            .filter(|m| !m.dependencies.is_empty())
            .map(|m| m.canonical_name.as_str())
            .collect();

        self.modules
            .iter()
            .map(|m| m.canonical_name.as_str())
            .filter(|name| !blocked.contains(name))
            .map(str::to_string)
            .collect()
    }

    /// Pin every `@main` reference to a ready name at `commit_id`
    ///
    /// Returns the sorted paths of the modules whose content changed. A ready
    /// dependency whose reference the rewrite cannot find is an error, since
    /// retiring it would leave the file floating.
    pub fn pin_ready(&mut self, ready: &BTreeSet<String>, commit_id: &str) -> Result<Vec<String>> {
        let mut changed = BTreeSet::new();
        for module in &mut self.modules {
            let targets: Vec<String> = module.dependencies.intersection(ready).cloned().collect();
            for name in targets {
                if !module.pin_reference(&name, commit_id) {
                    return Err(ActionError::UnpinnableReference {
                        path: module.path.clone(),
                        name,
                    }
                    .into());
                }
                log::debug!("pinned {}@{} in {}", name, commit_id, module.path);
                changed.insert(module.path.clone());
            }
        }
        Ok(changed.into_iter().collect())
    }

    /// Remove every ready name from every dependency set
    pub fn retire(&mut self, ready: &BTreeSet<String>) {
        for module in &mut self.modules {
            module.dependencies.retain(|dependency| !ready.contains(dependency));
        }
    }

    /// Canonical names of modules that still have dependencies
    pub fn unresolved(&self) -> Vec<String> {
        self.modules
            .iter()
            .filter(|m| !m.dependencies.is_empty())
            .map(|m| m.canonical_name.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Module at `path`
    pub fn module(&self, path: &str) -> Option<&ActionModule> {
        self.modules.iter().find(|m| m.path == path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReleaseError;
    use crate::github::RepoSlug;

    fn module(path: &str, uses: &[&str]) -> ActionModule {
        let mut content = String::from("runs:\n  using: composite\n  steps:\n");
        for reference in uses {
            content.push_str(&format!("    - uses: {}\n", reference));
        }
        ActionModule::parse(&RepoSlug::new("octo", "hello"), path, content).expect("valid module")
    }

    fn chain() -> DependencyGraph {
        DependencyGraph::build(vec![
            module("a/action.yml", &["octo/hello/b@main"]),
            module("b/action.yml", &["octo/hello/c@main"]),
            module("c/action.yml", &["actions/checkout@v4"]),
        ])
    }

    fn names(set: &BTreeSet<String>) -> Vec<&str> {
        set.iter().map(String::as_str).collect()
    }

    #[test]
    fn test_build_drops_unknown_and_self_references() {
        let graph = DependencyGraph::build(vec![
            module("a/action.yml", &["octo/hello/a@main", "octo/hello/missing@main"]),
        ]);
        assert!(graph.modules()[0].dependencies.is_empty());
    }

    #[test]
    fn test_chain_layers() {
        let mut graph = chain();
        graph.validate_no_cycles().expect("acyclic");

        let ready = graph.ready_set();
        assert_eq!(names(&ready), vec!["octo/hello/c"]);
        assert_eq!(graph.pin_ready(&ready, "c0ffee").expect("pinned"), vec!["b/action.yml"]);
        graph.retire(&ready);
        assert!(
            graph
                .module("b/action.yml")
                .expect("b")
                .content
                .contains("octo/hello/c@c0ffee")
        );

        let ready = graph.ready_set();
        assert_eq!(names(&ready), vec!["octo/hello/b", "octo/hello/c"]);
        assert_eq!(graph.pin_ready(&ready, "beef").expect("pinned"), vec!["a/action.yml"]);
        graph.retire(&ready);

        let ready = graph.ready_set();
        assert_eq!(ready.len(), 3);
        assert!(graph.pin_ready(&ready, "f00d").expect("pinned").is_empty());
        assert!(graph.unresolved().is_empty());
    }

    #[test]
    fn test_cycle_is_reported() {
        let graph = DependencyGraph::build(vec![
            module("a/action.yml", &["octo/hello/b@main"]),
            module("b/action.yml", &["octo/hello/a@main"]),
            module("c/action.yml", &["octo/hello/a@main"]),
        ]);
        match graph.validate_no_cycles() {
            Err(ReleaseError::Action(ActionError::CircularDependency { modules })) => {
                assert_eq!(modules, vec!["octo/hello/a", "octo/hello/b"]);
            }
            other => panic!("expected a cycle, got {other:?}"),
        }
        assert!(graph.ready_set().is_empty());
        assert_eq!(graph.unresolved().len(), 3);
    }

    #[test]
    fn test_unmatched_reference_is_not_a_cycle() {
        let folded = ActionModule::parse(
            &RepoSlug::new("octo", "hello"),
            "a/action.yml",
            "runs:\n  steps:\n    - uses: >-\n        octo/hello/b@main\n".to_string(),
        )
        .expect("valid module");
        let mut graph = DependencyGraph::build(vec![folded, module("b/action.yml", &[])]);
        graph.validate_no_cycles().expect("acyclic");

        let ready = graph.ready_set();
        match graph.pin_ready(&ready, "c0ffee") {
            Err(ReleaseError::Action(ActionError::UnpinnableReference { path, name })) => {
                assert_eq!(path, "a/action.yml");
                assert_eq!(name, "octo/hello/b");
            }
            other => panic!("expected an unpinnable reference, got {other:?}"),
        }
    }

    #[test]
    fn test_shared_name_waits_for_every_module() {
        let graph = DependencyGraph::build(vec![
            module("d/action.yml", &["octo/hello/c@main"]),
            module("d/action.yaml", &[]),
            module("c/action.yml", &[]),
        ]);
        assert_eq!(names(&graph.ready_set()), vec!["octo/hello/c"]);
    }
}
