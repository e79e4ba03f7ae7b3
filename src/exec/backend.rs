// src/exec/backend.rs

//! Pluggable executor backend abstraction.
//!
//! The runtime talks to an `ExecutorBackend` instead of a raw mpsc sender,
//! so tests can swap in a fake executor that records what was scheduled
//! and emits `TaskCompleted` events itself.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::dag::ScheduledTask;
use crate::engine::RuntimeEvent;
use crate::errors::{AssetpipeError, Result};
use crate::pipeline::PipelineEnv;

use super::executor_loop::spawn_executor;

/// Trait abstracting how scheduled tasks are executed.
pub trait ExecutorBackend: Send {
    /// Dispatch the given tasks for execution.
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Real executor backend used in production.
///
/// Wraps the executor loop from [`spawn_executor`]; `spawn_ready_tasks`
/// forwards tasks to it over an mpsc channel.
pub struct RealExecutorBackend {
    tx: mpsc::Sender<ScheduledTask>,
}

impl RealExecutorBackend {
    /// Spawn the executor loop and wire it to the runtime event sender.
    pub fn new(runtime_tx: mpsc::Sender<RuntimeEvent>, env: Arc<PipelineEnv>) -> Self {
        let tx = spawn_executor(runtime_tx, env);
        Self { tx }
    }
}

impl ExecutorBackend for RealExecutorBackend {
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.tx.clone();

        Box::pin(async move {
            for task in tasks {
                tx.send(task)
                    .await
                    .map_err(|e| AssetpipeError::Other(anyhow::anyhow!("executor loop stopped: {e}")))?;
            }
            Ok(())
        })
    }
}
