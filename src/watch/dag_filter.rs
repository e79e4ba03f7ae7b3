// src/watch/dag_filter.rs

//! DAG-aware filtering logic for watch events.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::dag::DagGraph;

/// Map of task name to its direct prerequisites.
pub type DepMap = HashMap<String, Vec<String>>;

/// Build the prerequisite map the watcher uses for ancestor checks.
pub fn dep_map_from_graph(graph: &DagGraph) -> DepMap {
    graph
        .tasks()
        .map(|name| (name.to_string(), graph.dependencies_of(name).to_vec()))
        .collect()
}

/// Return true if `task` has any ancestor whose name is in `matching_names`.
///
/// Ancestors are followed transitively via the `after = [...]` dependency
/// lists encoded in `dep_map`.
pub fn has_ancestor_in_matching(
    task: &str,
    matching_names: &BTreeSet<String>,
    dep_map: &DepMap,
) -> bool {
    let mut stack: Vec<&str> = dep_map
        .get(task)
        .map(|deps| deps.iter().map(String::as_str).collect())
        .unwrap_or_default();
    let mut visited: HashSet<&str> = HashSet::new();

    while let Some(current) = stack.pop() {
        if !visited.insert(current) {
            continue;
        }

        if matching_names.contains(current) {
            return true;
        }

        if let Some(parents) = dep_map.get(current) {
            stack.extend(parents.iter().map(String::as_str));
        }
    }

    false
}

/// Keep only the tasks that have no ancestor among `matching`.
///
/// Only meaningful when triggering a task also re-runs its dependents; with
/// an empty `dep_map` every matching task is kept.
pub fn root_tasks(matching: &BTreeSet<String>, dep_map: &DepMap) -> Vec<String> {
    matching
        .iter()
        .filter(|task| !has_ancestor_in_matching(task, matching, dep_map))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deps(pairs: &[(&str, &[&str])]) -> DepMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.iter().map(|s| s.to_string()).collect()))
            .collect()
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn transitive_ancestor_is_found() {
        let map = deps(&[("css", &[]), ("bundle", &["css"]), ("deploy", &["bundle"])]);
        assert!(has_ancestor_in_matching("deploy", &set(&["css"]), &map));
        assert!(!has_ancestor_in_matching("css", &set(&["deploy"]), &map));
    }

    #[test]
    fn only_roots_of_the_matching_set_survive() {
        let map = deps(&[("css", &[]), ("bundle", &["css"]), ("reload", &[])]);
        assert_eq!(
            root_tasks(&set(&["bundle", "css", "reload"]), &map),
            vec!["css".to_string(), "reload".to_string()]
        );
    }
}
