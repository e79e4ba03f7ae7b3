// src/exec/executor_loop.rs

//! Main executor loop.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::dag::ScheduledTask;
use crate::engine::RuntimeEvent;
use crate::exec::task_runner::run_task;
use crate::pipeline::PipelineEnv;

/// Spawn the background executor loop.
///
/// Each scheduled task runs in its own Tokio task, so independent tasks run
/// in parallel. Per task name there is never more than one instance running:
/// a new instance first waits for the previous one to finish.
pub fn spawn_executor(
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    env: Arc<PipelineEnv>,
) -> mpsc::Sender<ScheduledTask> {
    let (tx, mut rx) = mpsc::channel::<ScheduledTask>(32);

    tokio::spawn(async move {
        info!("executor loop started");

        let mut active: HashMap<String, JoinHandle<()>> = HashMap::new();

        while let Some(task) = rx.recv().await {
            let previous = active.remove(&task.name).filter(|h| !h.is_finished());
            let name = task.name.clone();
            let handle = tokio::spawn(run_after(previous, task, runtime_tx.clone(), Arc::clone(&env)));
            active.insert(name, handle);
        }

        info!("executor loop finished (channel closed)");
    });

    tx
}

async fn run_after(
    previous: Option<JoinHandle<()>>,
    task: ScheduledTask,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    env: Arc<PipelineEnv>,
) {
    if let Some(previous) = previous {
        debug!(task = %task.name, run_id = task.run_id, "waiting for previous instance to finish");
        if let Err(e) = previous.await {
            debug!(task = %task.name, error = %e, "previous instance ended abnormally");
        }
    }
    run_task(task, runtime_tx, env).await;
}
