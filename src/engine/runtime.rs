// src/engine/runtime.rs

use std::collections::HashMap;
use std::fmt;
use std::time::Instant;

use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::dag::{RunSummary, ScheduledTask};
use crate::errors::Result;
use crate::exec::ExecutorBackend;

use super::core::CoreRuntime;
use super::{CoreCommand, RuntimeEvent};

/// Async shell around [`CoreRuntime`]: receives events, dispatches tasks to
/// the executor and reports finished runs.
pub struct Runtime<E: ExecutorBackend> {
    core: CoreRuntime,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    executor: E,
    /// When each still-open run first dispatched a task.
    run_started: HashMap<u64, Instant>,
}

impl<E: ExecutorBackend> fmt::Debug for Runtime<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .field("open_runs", &self.run_started.len())
            .finish_non_exhaustive()
    }
}

impl<E: ExecutorBackend> Runtime<E> {
    pub fn new(core: CoreRuntime, event_rx: mpsc::Receiver<RuntimeEvent>, executor: E) -> Self {
        Self {
            core,
            event_rx,
            executor,
            run_started: HashMap::new(),
        }
    }

    /// Process events until the core asks to stop or every sender is gone.
    pub async fn run(mut self) -> Result<()> {
        info!("assetpipe runtime started");

        while let Some(event) = self.event_rx.recv().await {
            debug!(?event, "runtime received event");
            let step = self.core.step(event);

            for command in step.commands {
                match command {
                    CoreCommand::DispatchTasks(tasks) => self.dispatch(tasks).await?,
                    CoreCommand::ReportRun(summary) => self.report(&summary),
                    CoreCommand::RequestExit => debug!("core requested exit"),
                }
            }

            if !step.keep_running {
                info!("nothing left to do; stopping runtime");
                return Ok(());
            }
        }

        info!("runtime event channel closed; exiting");
        Ok(())
    }

    async fn dispatch(&mut self, tasks: Vec<ScheduledTask>) -> Result<()> {
        if tasks.is_empty() {
            return Ok(());
        }
        for task in &tasks {
            self.run_started.entry(task.run_id).or_insert_with(Instant::now);
        }

        let names: Vec<_> = tasks.iter().map(|t| t.name.as_str()).collect();
        debug!(?names, run_id = tasks[0].run_id, "dispatching ready tasks");
        self.executor.spawn_ready_tasks(tasks).await
    }

    fn report(&mut self, summary: &RunSummary) {
        let elapsed_ms = self
            .run_started
            .remove(&summary.run_id)
            .map(|started| started.elapsed().as_millis() as u64);

        if summary.succeeded.is_empty() && summary.failed.is_empty() {
            debug!(run_id = summary.run_id, "run finished without tasks");
        } else if summary.is_success() {
            info!(
                run_id = summary.run_id,
                tasks = ?summary.succeeded,
                elapsed_ms,
                "finished run"
            );
        } else {
            error!(
                run_id = summary.run_id,
                failed = ?summary.failed,
                succeeded = ?summary.succeeded,
                elapsed_ms,
                "run finished with failures"
            );
        }
    }
}
