// src/dag/state_manager.rs

//! Per-run state management for tasks in the scheduler.

use std::collections::{HashMap, HashSet};

use tracing::{debug, info, warn};

use crate::dag::DagGraph;
use crate::dag::task_info::{RunState, ScheduledTask, TaskInfo};
use crate::engine::TaskName;

/// Which way the inclusion walk reached a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reach {
    /// The triggered task itself, or a dependent pulled in after it.
    Downstream,
    /// A prerequisite pulled in because it never succeeded.
    Upstream,
}

/// Manages per-run state transitions for tasks.
pub struct StateManager<'a> {
    graph: &'a DagGraph,
    tasks: &'a mut HashMap<TaskName, TaskInfo>,
    current_run_id: Option<u64>,
}

impl<'a> StateManager<'a> {
    pub fn new(
        graph: &'a DagGraph,
        tasks: &'a mut HashMap<TaskName, TaskInfo>,
        current_run_id: Option<u64>,
    ) -> Self {
        Self {
            graph,
            tasks,
            current_run_id,
        }
    }

    /// Include a triggered task in this run, together with:
    /// - every prerequisite (transitively) that has not succeeded in an
    ///   earlier run and is not already part of this one;
    /// - when `with_dependents` is set, every downstream dependent (and, in
    ///   turn, their missing prerequisites).
    ///
    /// Tasks already participating in this run keep their current state.
    pub fn include_in_run(&mut self, root: &str, with_dependents: bool) {
        let mut stack: Vec<(TaskName, Reach)> = vec![(root.to_string(), Reach::Downstream)];
        let mut visited: HashSet<TaskName> = HashSet::new();

        while let Some((name, reach)) = stack.pop() {
            if !visited.insert(name.clone()) {
                continue;
            }

            let deps = match self.tasks.get_mut(&name) {
                Some(info) => {
                    if info.run_state.is_none() {
                        info.run_state = Some(RunState::Pending);
                        debug!(task = %info.name, ?reach, "marked Pending for this run");
                    }
                    info.deps.clone()
                }
                None => {
                    warn!(task = %name, "node in DAG not present in tasks map");
                    continue;
                }
            };

            for dep in deps {
                let missing = self
                    .tasks
                    .get(&dep)
                    .is_some_and(|d| d.run_state.is_none() && !d.has_succeeded_before());
                if missing {
                    stack.push((dep, Reach::Upstream));
                }
            }

            if with_dependents && reach == Reach::Downstream {
                for dependent in self.graph.dependents_of(&name).iter().cloned() {
                    stack.push((dependent, Reach::Downstream));
                }
            }
        }
    }

    /// Determine whether all dependencies of the given task are satisfied for
    /// the *current run*.
    pub fn deps_satisfied_for_info(&self, info: &TaskInfo) -> bool {
        let ro = ReadOnlyStateManager::new(self.tasks);
        ro.deps_satisfied_for_info(info)
    }

    /// Mark all participating dependents (transitively) of a failed task as
    /// `DoneFailed` for this run.
    ///
    /// Returns the tasks newly marked as failed, excluding `failed_task`.
    pub fn mark_dependents_failed(&mut self, failed_task: &str) -> Vec<TaskName> {
        let mut stack: Vec<TaskName> = self
            .graph
            .dependents_of(failed_task)
            .iter()
            .cloned()
            .collect();

        let mut newly_failed = Vec::new();

        while let Some(name) = stack.pop() {
            if let Some(info) = self.tasks.get_mut(&name) {
                match info.run_state {
                    Some(RunState::Pending) | Some(RunState::Running) => {
                        info.run_state = Some(RunState::DoneFailed);
                        debug!(
                            task = %info.name,
                            "marking dependent as DoneFailed due to upstream failure"
                        );
                        newly_failed.push(info.name.clone());
                        stack.extend(self.graph.dependents_of(&name).iter().cloned());
                    }
                    Some(RunState::DoneSuccess) | Some(RunState::DoneFailed) | None => {}
                }
            }
        }

        newly_failed
    }

    /// Fail every `Pending` task that waits on a prerequisite already failed
    /// in this run.
    ///
    /// This covers tasks that join a run after one of their prerequisites
    /// failed; without it they would stay `Pending` forever.
    pub fn fail_blocked_tasks(&mut self) -> Vec<TaskName> {
        let mut newly_failed = Vec::new();

        loop {
            let blocked: Vec<TaskName> = self
                .tasks
                .values()
                .filter(|info| matches!(info.run_state, Some(RunState::Pending)))
                .filter(|info| {
                    info.deps.iter().any(|dep| {
                        self.tasks
                            .get(dep)
                            .is_some_and(|d| d.run_state == Some(RunState::DoneFailed))
                    })
                })
                .map(|info| info.name.clone())
                .collect();

            if blocked.is_empty() {
                break;
            }

            for name in blocked {
                if let Some(info) = self.tasks.get_mut(&name) {
                    debug!(task = %info.name, "prerequisite failed earlier in this run; failing task");
                    info.run_state = Some(RunState::DoneFailed);
                    newly_failed.push(name);
                }
            }
        }

        newly_failed
    }

    /// Collect tasks that are `Pending` and whose dependencies are satisfied,
    /// mark them as `Running`, and return them as `ScheduledTask`s.
    ///
    /// Tasks come back sorted by name so dispatch order is reproducible.
    pub fn collect_new_ready_tasks(&mut self) -> Vec<ScheduledTask> {
        let mut ready = Vec::new();

        let mut candidates: Vec<TaskName> = self
            .tasks
            .values()
            .filter_map(|info| {
                if matches!(info.run_state, Some(RunState::Pending))
                    && self.deps_satisfied_for_info(info)
                {
                    Some(info.name.clone())
                } else {
                    None
                }
            })
            .collect();
        candidates.sort();

        for name in candidates {
            if let Some(info) = self.tasks.get_mut(&name) {
                info.dispatch_count += 1;
                info.run_state = Some(RunState::Running);
                info!(
                    task = %info.name,
                    run_id = self.current_run_id,
                    action = info.action.label(),
                    attempt = info.dispatch_count,
                    "starting task"
                );
                ready.push(ScheduledTask::from_task_info(
                    info,
                    self.current_run_id.unwrap_or(0),
                ));
            }
        }

        ready
    }

    /// Check if all tasks are in a terminal state.
    pub fn all_tasks_terminal(&self) -> bool {
        !self.tasks.values().any(|info| {
            matches!(
                info.run_state,
                Some(RunState::Pending) | Some(RunState::Running)
            )
        })
    }
}

/// A read-only view used when only shared access to the tasks map is
/// available (e.g. in `Scheduler::deps_satisfied`).
pub struct ReadOnlyStateManager<'a> {
    tasks: &'a HashMap<TaskName, TaskInfo>,
}

impl<'a> ReadOnlyStateManager<'a> {
    pub fn new(tasks: &'a HashMap<TaskName, TaskInfo>) -> Self {
        Self { tasks }
    }

    /// A dependency is satisfied if it succeeded in this run, or it is not
    /// part of this run and succeeded in an earlier one.
    pub fn deps_satisfied_for_info(&self, info: &TaskInfo) -> bool {
        for dep_name in &info.deps {
            let dep = match self.tasks.get(dep_name) {
                Some(d) => d,
                None => {
                    warn!(
                        task = %info.name,
                        dep = %dep_name,
                        "dependency missing from tasks map"
                    );
                    return false;
                }
            };

            match dep.run_state {
                Some(RunState::DoneSuccess) => {}
                Some(RunState::DoneFailed) | Some(RunState::Pending) | Some(RunState::Running) => {
                    return false;
                }
                None => {
                    if !dep.has_succeeded_before() {
                        return false;
                    }
                }
            }
        }

        true
    }
}
