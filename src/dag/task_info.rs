// src/dag/task_info.rs

use crate::config::model::{TaskAction, TaskConfig};
use crate::engine::TaskName;

/// Where a task stands in the active run. `None` on [`TaskInfo`] means it
/// does not take part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Waiting for prerequisites.
    Pending,
    Running,
    DoneSuccess,
    /// Failed itself, or blocked by a failed prerequisite.
    DoneFailed,
}

/// [`RunState`] as seen from outside the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskRunState {
    NotInRun,
    Pending,
    Running,
    DoneSuccess,
    DoneFailed,
}

impl From<Option<RunState>> for TaskRunState {
    fn from(state: Option<RunState>) -> Self {
        match state {
            None => TaskRunState::NotInRun,
            Some(RunState::Pending) => TaskRunState::Pending,
            Some(RunState::Running) => TaskRunState::Running,
            Some(RunState::DoneSuccess) => TaskRunState::DoneSuccess,
            Some(RunState::DoneFailed) => TaskRunState::DoneFailed,
        }
    }
}

/// A task's config-derived facts plus what the scheduler remembers about it.
#[derive(Debug, Clone)]
pub struct TaskInfo {
    pub name: TaskName,
    pub action: TaskAction,
    /// Names from `after = [...]`.
    pub deps: Vec<TaskName>,
    pub run_state: Option<RunState>,
    /// Run that last built this task successfully. A prerequisite with a
    /// success on record does not have to run again.
    pub last_successful_run: Option<u64>,
    /// How many times the task has been dispatched since startup.
    pub dispatch_count: u32,
}

impl TaskInfo {
    pub fn from_config(name: TaskName, cfg: &TaskConfig, deps: Vec<TaskName>) -> Self {
        Self {
            name,
            action: cfg.action(),
            deps,
            run_state: None,
            last_successful_run: None,
            dispatch_count: 0,
        }
    }

    pub fn has_succeeded_before(&self) -> bool {
        self.last_successful_run.is_some()
    }
}

/// A task handed to the executor.
#[derive(Debug, Clone)]
pub struct ScheduledTask {
    pub name: TaskName,
    pub action: TaskAction,
    /// Shared by every task dispatched within one run.
    pub run_id: u64,
    /// 1 for the first build after startup, 2 for the first rebuild, ...
    pub attempt: u32,
}

impl ScheduledTask {
    pub fn from_task_info(info: &TaskInfo, run_id: u64) -> Self {
        Self {
            name: info.name.clone(),
            action: info.action.clone(),
            run_id,
            attempt: info.dispatch_count,
        }
    }
}
