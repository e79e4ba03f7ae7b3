// src/engine/mod.rs

//! Everything between "something asked for a task" and "the executor runs
//! it": triggers from the CLI and the watcher, completions from the
//! executor, and Ctrl-C all arrive as [`RuntimeEvent`]s on one channel.
//! [`core`] decides, [`runtime`] acts.

pub type TaskName = String;

/// How a task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Success,
    /// Exit code of a command task; `1` for pipeline and internal failures.
    Failed(i32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerReason {
    /// Named on the command line, or picked as a default target.
    Manual,
    /// A watched file changed.
    FileWatch,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeOptions {
    /// Stop once the DAG is idle and nothing is queued (`--once`).
    pub exit_when_idle: bool,
}

#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    TaskTriggered { task: TaskName, reason: TriggerReason },
    TaskCompleted { task: TaskName, outcome: TaskOutcome },
    ShutdownRequested,
}

pub mod core;
pub mod event_handlers;
pub mod queue;
pub mod runtime;

pub use crate::types::TriggerWhileRunningBehaviour;
pub use core::CoreRuntime;
pub use event_handlers::{CoreCommand, CoreStep};
pub use queue::TriggerQueue;
pub use runtime::Runtime;
