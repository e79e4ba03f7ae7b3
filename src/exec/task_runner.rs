// src/exec/task_runner.rs

//! Runs one scheduled task to completion and reports the outcome.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::config::model::TaskAction;
use crate::dag::ScheduledTask;
use crate::engine::{RuntimeEvent, TaskOutcome};
use crate::pipeline::{build_stages, run_pipeline, PipelineEnv};
use crate::reload::ReloadEvent;

use super::command::run_command;

/// Execute `task` and send exactly one `TaskCompleted` for it.
///
/// Errors (spawn failures, pipeline failures, a panicking pipeline) become
/// a failed completion with exit code 1 and are logged at `error!`.
pub async fn run_task(task: ScheduledTask, runtime_tx: mpsc::Sender<RuntimeEvent>, env: Arc<PipelineEnv>) {
    let name = task.name.clone();
    let run_id = task.run_id;
    let attempt = task.attempt;
    let started = Instant::now();

    let outcome = match execute(task, env).await {
        Ok(outcome) => outcome,
        Err(err) => {
            error!(task = %name, run_id, attempt, error = %format!("{err:#}"), "task failed");
            TaskOutcome::Failed(1)
        }
    };

    let elapsed_ms = started.elapsed().as_millis() as u64;
    match outcome {
        TaskOutcome::Success => info!(task = %name, run_id, attempt, elapsed_ms, "finished task"),
        TaskOutcome::Failed(code) => debug!(task = %name, run_id, exit_code = code, elapsed_ms, "task ended with failure"),
    }

    if runtime_tx
        .send(RuntimeEvent::TaskCompleted {
            task: name.clone(),
            outcome,
        })
        .await
        .is_err()
    {
        debug!(task = %name, run_id, "runtime gone; dropping completion");
    }
}

async fn execute(task: ScheduledTask, env: Arc<PipelineEnv>) -> Result<TaskOutcome> {
    match task.action {
        TaskAction::Pipeline { src, stages } => {
            let name = task.name.clone();
            let report = tokio::task::spawn_blocking(move || {
                let stages = build_stages(&stages)?;
                run_pipeline(&name, &src, &stages, &env)
            })
            .await
            .with_context(|| format!("pipeline of task '{}' panicked", task.name))??;

            debug!(task = %task.name, written = ?report.written, "pipeline report");
            Ok(TaskOutcome::Success)
        }
        TaskAction::Command { cmd } => run_command(&task.name, &cmd, &env.root).await,
        TaskAction::Reload => {
            info!(task = %task.name, "broadcasting full reload");
            env.reload.notify(ReloadEvent::Reload);
            Ok(TaskOutcome::Success)
        }
        TaskAction::Group => {
            debug!(task = %task.name, "group task; prerequisites done");
            Ok(TaskOutcome::Success)
        }
    }
}
