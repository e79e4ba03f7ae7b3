use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::config::model::ConfigFile;
use crate::dag::graph::DagGraph;
use crate::dag::scheduler_step::{RunSummary, SchedulerStep};
use crate::dag::state_manager::{ReadOnlyStateManager, StateManager};
use crate::dag::task_info::{RunState, ScheduledTask, TaskInfo, TaskRunState};
use crate::engine::{TaskName, TaskOutcome};

/// Scheduler holds the immutable DAG plus mutable per-run state.
///
/// It is responsible for:
/// - remembering which tasks are part of the current run
/// - pulling in prerequisites that have never succeeded
/// - deciding when a task is ready to run (deps satisfied)
/// - failing dependents when a task fails
#[derive(Debug)]
pub struct Scheduler {
    graph: DagGraph,
    tasks: HashMap<TaskName, TaskInfo>,
    rerun_dependents: bool,
    /// Monotonically increasing run ID.
    run_counter: u64,
    /// Currently active run ID, or `None` if there is no active run.
    current_run_id: Option<u64>,
}

impl Scheduler {
    /// Construct a scheduler from a validated [`ConfigFile`].
    pub fn from_config(cfg: &ConfigFile) -> Self {
        let graph = DagGraph::from_config(cfg);

        let mut tasks = HashMap::new();
        for (name, tc) in cfg.task.iter() {
            let deps = graph.dependencies_of(name).to_vec();
            let info = TaskInfo::from_config(name.clone(), tc, deps);
            tasks.insert(name.clone(), info);
        }

        Self {
            graph,
            tasks,
            rerun_dependents: cfg.config.rerun_dependents,
            run_counter: 0,
            current_run_id: None,
        }
    }

    /// Returns `true` if there is currently no active run.
    pub fn is_idle(&self) -> bool {
        self.current_run_id.is_none()
    }

    /// Current run ID, if any.
    pub fn current_run_id(&self) -> Option<u64> {
        self.current_run_id
    }

    pub fn graph(&self) -> &DagGraph {
        &self.graph
    }

    /// Read-only view of the given task's run state.
    pub fn run_state_of(&self, task: &str) -> Option<TaskRunState> {
        let info = self.tasks.get(task)?;
        Some(info.run_state.into())
    }

    /// Names of tasks participating in the *active* run, sorted.
    ///
    /// Empty when idle, even though tasks keep their terminal `run_state`
    /// from the previous run.
    pub fn tasks_in_current_run(&self) -> Vec<TaskName> {
        if self.current_run_id.is_none() {
            return Vec::new();
        }

        let mut names: Vec<TaskName> = self
            .tasks
            .values()
            .filter(|info| info.run_state.is_some())
            .map(|info| info.name.clone())
            .collect();
        names.sort();
        names
    }

    /// Whether the dependencies of `task` are satisfied for the current run.
    ///
    /// Returns `None` if the task is unknown.
    pub fn deps_satisfied(&self, task: &str) -> Option<bool> {
        let info = self.tasks.get(task)?;
        let mgr = ReadOnlyStateManager::new(&self.tasks);
        Some(mgr.deps_satisfied_for_info(info))
    }

    /// Start a new run, resetting per-run state but keeping historical success
    /// information (for dependency satisfaction on later runs).
    pub fn start_new_run(&mut self) {
        self.run_counter += 1;
        self.current_run_id = Some(self.run_counter);

        for info in self.tasks.values_mut() {
            info.run_state = None;
        }

        debug!(run_id = self.run_counter, "scheduler: starting new DAG run");
    }

    /// Handle a trigger for a task name.
    pub fn handle_trigger(&mut self, task: &str) -> Vec<ScheduledTask> {
        self.trigger_step_internal(task).newly_scheduled
    }

    /// Handle completion of a task with a concrete outcome.
    pub fn handle_completion(&mut self, task: &str, outcome: TaskOutcome) -> Vec<ScheduledTask> {
        self.completion_step_internal(task, outcome).newly_scheduled
    }

    /// Manual-step variant of `handle_trigger` that returns a rich [`SchedulerStep`].
    pub fn step_trigger(&mut self, task: &str) -> SchedulerStep {
        self.trigger_step_internal(task)
    }

    /// Manual-step variant of `handle_completion` that returns a rich [`SchedulerStep`].
    pub fn step_completion(&mut self, task: &str, outcome: TaskOutcome) -> SchedulerStep {
        self.completion_step_internal(task, outcome)
    }

    pub fn task_names(&self) -> impl Iterator<Item = &str> {
        self.graph.tasks()
    }

    /// End the active run once every participating task is terminal,
    /// returning what it did.
    fn maybe_finish_run(&mut self) -> Option<RunSummary> {
        let run_id = self.current_run_id?;

        let manager = StateManager::new(&self.graph, &mut self.tasks, self.current_run_id);
        if !manager.all_tasks_terminal() {
            return None;
        }

        let mut summary = RunSummary {
            run_id,
            succeeded: Vec::new(),
            failed: Vec::new(),
        };
        for info in self.tasks.values() {
            match info.run_state {
                Some(RunState::DoneSuccess) => summary.succeeded.push(info.name.clone()),
                Some(RunState::DoneFailed) => summary.failed.push(info.name.clone()),
                _ => {}
            }
        }
        summary.succeeded.sort();
        summary.failed.sort();

        info!(
            run_id,
            succeeded = summary.succeeded.len(),
            failed = summary.failed.len(),
            "scheduler: all tasks terminal; run finished"
        );
        self.current_run_id = None;
        Some(summary)
    }

    fn trigger_step_internal(&mut self, task: &str) -> SchedulerStep {
        if self.current_run_id.is_none() {
            debug!(task = %task, "trigger with no active run; starting a new run");
            self.start_new_run();
        }

        let mut newly_failed = Vec::new();
        let mut manager = StateManager::new(&self.graph, &mut self.tasks, self.current_run_id);

        if self.graph.contains(task) {
            manager.include_in_run(task, self.rerun_dependents);
            newly_failed = manager.fail_blocked_tasks();
        } else {
            warn!(task = %task, "trigger for unknown task; ignoring");
        }

        let newly_scheduled = manager.collect_new_ready_tasks();
        let finished_run = self.maybe_finish_run();

        SchedulerStep {
            newly_scheduled,
            newly_failed,
            finished_run,
        }
    }

    fn completion_step_internal(&mut self, task: &str, outcome: TaskOutcome) -> SchedulerStep {
        let run_id = match self.current_run_id {
            Some(id) => id,
            None => {
                warn!(
                    task = %task,
                    "completion with no active run; ignoring"
                );
                return SchedulerStep::default();
            }
        };

        let mut newly_scheduled = Vec::new();
        let mut newly_failed = Vec::new();

        match self.tasks.get_mut(task) {
            Some(info) if info.run_state != Some(RunState::Running) => {
                warn!(
                    task = %info.name,
                    run_id,
                    state = ?info.run_state,
                    "completion for a task that is not running in this run; ignoring"
                );
            }
            Some(info) => match outcome {
                TaskOutcome::Success => {
                    info.run_state = Some(RunState::DoneSuccess);
                    info.last_successful_run = Some(run_id);
                    debug!(task = %info.name, run_id, "task completed successfully");
                    let mut manager =
                        StateManager::new(&self.graph, &mut self.tasks, self.current_run_id);
                    newly_scheduled.extend(manager.collect_new_ready_tasks());
                }
                TaskOutcome::Failed(code) => {
                    info.run_state = Some(RunState::DoneFailed);
                    warn!(
                        task = %info.name,
                        run_id,
                        exit_code = code,
                        "task failed; failing dependents in this run"
                    );
                    newly_failed.push(info.name.clone());
                    let mut manager =
                        StateManager::new(&self.graph, &mut self.tasks, self.current_run_id);
                    let mut dep_failures = manager.mark_dependents_failed(task);
                    newly_failed.append(&mut dep_failures);
                }
            },
            None => {
                warn!(task = %task, "completion for unknown task; ignoring");
            }
        }

        let finished_run = self.maybe_finish_run();

        SchedulerStep {
            newly_scheduled,
            newly_failed,
            finished_run,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_and_validate;

    fn scheduler(toml: &str) -> Scheduler {
        Scheduler::from_config(&parse_and_validate(toml).unwrap())
    }

    const CHAIN: &str = r#"
[task.css]
cmd = "true"
[task.bundle]
cmd = "true"
after = ["css"]
[task.default]
after = ["bundle"]
"#;

    fn names(tasks: &[ScheduledTask]) -> Vec<&str> {
        tasks.iter().map(|t| t.name.as_str()).collect()
    }

    #[test]
    fn triggering_a_target_runs_prerequisites_first() {
        let mut s = scheduler(CHAIN);

        let step = s.step_trigger("default");
        assert_eq!(names(&step.newly_scheduled), vec!["css"]);
        assert_eq!(s.run_state_of("default"), Some(TaskRunState::Pending));

        let next = s.handle_completion("css", TaskOutcome::Success);
        assert_eq!(names(&next), vec!["bundle"]);

        let next = s.handle_completion("bundle", TaskOutcome::Success);
        assert_eq!(names(&next), vec!["default"]);

        let last = s.step_completion("default", TaskOutcome::Success);
        let summary = last.finished_run.expect("run finished");
        assert_eq!(summary.succeeded, vec!["bundle", "css", "default"]);
        assert!(summary.is_success());
        assert!(s.is_idle());
    }

    #[test]
    fn satisfied_prerequisites_are_not_rerun() {
        let mut s = scheduler(CHAIN);
        s.handle_trigger("css");
        s.handle_completion("css", TaskOutcome::Success);
        assert!(s.is_idle());

        let step = s.step_trigger("bundle");
        assert_eq!(names(&step.newly_scheduled), vec!["bundle"]);
        assert_eq!(s.run_state_of("css"), Some(TaskRunState::NotInRun));
    }

    #[test]
    fn attempt_counts_dispatches_across_runs() {
        let mut s = scheduler(CHAIN);

        let first = s.handle_trigger("css");
        assert_eq!((first[0].run_id, first[0].attempt), (1, 1));
        let step = s.step_completion("css", TaskOutcome::Success);
        assert!(step.finished_run.is_some());

        let second = s.handle_trigger("css");
        assert_eq!((second[0].run_id, second[0].attempt), (2, 2));

        let bundle = s.handle_completion("css", TaskOutcome::Success);
        assert!(bundle.is_empty());
        let third = s.handle_trigger("bundle");
        assert_eq!((third[0].name.as_str(), third[0].attempt), ("bundle", 1));
    }

    #[test]
    fn trigger_does_not_pull_dependents_by_default() {
        let mut s = scheduler(CHAIN);
        s.handle_trigger("default");
        for t in ["css", "bundle", "default"] {
            s.handle_completion(t, TaskOutcome::Success);
        }

        s.handle_trigger("css");
        assert_eq!(s.tasks_in_current_run(), vec!["css".to_string()]);
    }

    #[test]
    fn rerun_dependents_pulls_downstream_tasks() {
        let mut s = scheduler(&format!("[config]\nrerun_dependents = true\n{CHAIN}"));
        s.handle_trigger("css");
        assert_eq!(
            s.tasks_in_current_run(),
            vec!["bundle".to_string(), "css".to_string(), "default".to_string()]
        );
    }

    #[test]
    fn failure_fails_participating_dependents() {
        let mut s = scheduler(CHAIN);
        s.handle_trigger("default");

        let step = s.step_completion("css", TaskOutcome::Failed(2));
        assert_eq!(
            step.newly_failed,
            vec!["css".to_string(), "bundle".to_string(), "default".to_string()]
        );
        let summary = step.finished_run.expect("run finished");
        assert_eq!(summary.failed, vec!["bundle", "css", "default"]);
        assert!(summary.succeeded.is_empty());
    }

    #[test]
    fn task_joining_after_prerequisite_failure_fails_immediately() {
        let mut s = scheduler(
            r#"
[task.css]
cmd = "true"
[task.slow]
cmd = "true"
[task.bundle]
cmd = "true"
after = ["css"]
"#,
        );
        s.handle_trigger("css");
        s.handle_trigger("slow");
        s.handle_completion("css", TaskOutcome::Failed(1));
        assert!(!s.is_idle());

        let step = s.step_trigger("bundle");
        assert!(step.newly_scheduled.is_empty());
        assert_eq!(step.newly_failed, vec!["bundle".to_string()]);
        assert_eq!(s.run_state_of("bundle"), Some(TaskRunState::DoneFailed));
    }

    #[test]
    fn stale_completion_is_ignored() {
        let mut s = scheduler(CHAIN);
        let step = s.step_completion("css", TaskOutcome::Success);
        assert!(step.newly_scheduled.is_empty());
        assert!(s.is_idle());
    }
}
