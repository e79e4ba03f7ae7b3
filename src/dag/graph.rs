// src/dag/graph.rs

use std::collections::{BTreeSet, HashMap, HashSet};

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::ConfigFile;

/// Internal node structure: stores immediate deps and dependents.
#[derive(Debug, Clone)]
struct DagNode {
    /// Direct prerequisites: tasks that must succeed before this one can run.
    deps: Vec<String>,
    /// Direct dependents: tasks that list this one in their `after`.
    dependents: Vec<String>,
}

/// In-memory task registry keyed by task name.
///
/// Acyclicity is validated in `config::validate`, so here we just keep
/// adjacency information for scheduling and diagnostics.
#[derive(Debug, Clone)]
pub struct DagGraph {
    nodes: HashMap<String, DagNode>,
}

impl DagGraph {
    /// Build a DAG from a validated [`ConfigFile`].
    pub fn from_config(cfg: &ConfigFile) -> Self {
        let mut nodes: HashMap<String, DagNode> = HashMap::new();

        for (name, task) in cfg.task.iter() {
            nodes.insert(
                name.clone(),
                DagNode {
                    deps: task.after.clone(),
                    dependents: Vec::new(),
                },
            );
        }

        // `cfg.task` is a BTreeMap, so dependents end up sorted by name.
        for (name, task) in cfg.task.iter() {
            for dep in task.after.iter() {
                if let Some(dep_node) = nodes.get_mut(dep) {
                    dep_node.dependents.push(name.clone());
                }
            }
        }

        Self { nodes }
    }

    /// Return all task names.
    pub fn tasks(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(|s| s.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// Immediate dependencies of a task (the tasks listed in its `after`).
    pub fn dependencies_of(&self, name: &str) -> &[String] {
        self.nodes
            .get(name)
            .map(|n| n.deps.as_slice())
            .unwrap_or(&[])
    }

    /// Immediate dependents of a task (tasks that list this one in their `after`).
    pub fn dependents_of(&self, name: &str) -> &[String] {
        self.nodes
            .get(name)
            .map(|n| n.dependents.as_slice())
            .unwrap_or(&[])
    }

    /// Tasks without prerequisites, sorted by name.
    pub fn roots(&self) -> Vec<String> {
        let mut roots: Vec<String> = self
            .nodes
            .iter()
            .filter(|(_, node)| node.deps.is_empty())
            .map(|(name, _)| name.clone())
            .collect();
        roots.sort();
        roots
    }

    /// Every transitive prerequisite of `targets` plus the targets themselves,
    /// leaves first.
    ///
    /// Ties are broken by name so the order is stable across runs. Unknown
    /// target names are skipped.
    pub fn prerequisite_order(&self, targets: &[String]) -> Vec<String> {
        let mut closure: BTreeSet<&str> = BTreeSet::new();
        let mut stack: Vec<&str> = targets
            .iter()
            .map(|t| t.as_str())
            .filter(|t| self.contains(t))
            .collect();

        while let Some(name) = stack.pop() {
            if !closure.insert(name) {
                continue;
            }
            stack.extend(self.dependencies_of(name).iter().map(|d| d.as_str()));
        }

        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
        for name in closure.iter().copied() {
            graph.add_node(name);
        }
        for name in closure.iter().copied() {
            for dep in self.dependencies_of(name) {
                graph.add_edge(dep.as_str(), name, ());
            }
        }

        // Kahn's algorithm with a sorted ready set keeps ties deterministic;
        // `toposort` only serves as the cycle guard.
        if toposort(&graph, None).is_err() {
            return closure.iter().map(|s| s.to_string()).collect();
        }

        let mut remaining: HashMap<&str, usize> = closure
            .iter()
            .map(|name| (*name, self.dependencies_of(name).len()))
            .collect();
        let mut ready: BTreeSet<&str> = remaining
            .iter()
            .filter(|(_, count)| **count == 0)
            .map(|(name, _)| *name)
            .collect();
        let mut emitted: HashSet<&str> = HashSet::new();
        let mut order = Vec::with_capacity(closure.len());

        while let Some(name) = ready.pop_first() {
            if !emitted.insert(name) {
                continue;
            }
            order.push(name.to_string());
            for dependent in self.dependents_of(name) {
                if let Some(count) = remaining.get_mut(dependent.as_str()) {
                    *count -= 1;
                    if *count == 0 {
                        ready.insert(dependent.as_str());
                    }
                }
            }
        }

        order
    }
}
