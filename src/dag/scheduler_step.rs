// src/dag/scheduler_step.rs

use crate::dag::task_info::ScheduledTask;
use crate::engine::TaskName;

/// Tasks that ended a run, split by how they ended. Both lists are sorted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub run_id: u64,
    pub succeeded: Vec<TaskName>,
    /// Failed tasks, including dependents blocked by a failed prerequisite.
    pub failed: Vec<TaskName>,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// What one trigger or completion changed in the scheduler.
#[derive(Debug, Clone, Default)]
pub struct SchedulerStep {
    /// Tasks that became ready and should be dispatched now.
    pub newly_scheduled: Vec<ScheduledTask>,
    /// The failing task first, then every dependent it blocked.
    pub newly_failed: Vec<TaskName>,
    /// Set when this step brought the run to an end.
    pub finished_run: Option<RunSummary>,
}
