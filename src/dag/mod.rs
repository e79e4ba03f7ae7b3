// src/dag/mod.rs

//! Task graph and per-run scheduling.
//!
//! [`DagGraph`] is the static `after = [...]` graph. [`Scheduler`] walks it
//! once per run: it decides which tasks join the run, which are ready, and
//! which fail because a prerequisite failed.

pub mod graph;
pub mod scheduler;
pub mod scheduler_step;
pub mod state_manager;
pub mod task_info;

pub use graph::DagGraph;
pub use scheduler::Scheduler;
pub use scheduler_step::{RunSummary, SchedulerStep};
pub use task_info::{ScheduledTask, TaskRunState};
