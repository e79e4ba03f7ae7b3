// src/engine/event_handlers.rs

use std::collections::BTreeSet;

use tracing::{debug, warn};

use crate::dag::{RunSummary, ScheduledTask, Scheduler, SchedulerStep, TaskRunState};
use crate::engine::queue::TriggerQueue;
use crate::engine::{RuntimeOptions, TaskName, TaskOutcome, TriggerReason};

/// Work the core hands to the async shell.
#[derive(Debug, Clone)]
pub enum CoreCommand {
    /// Send these tasks to the executor.
    DispatchTasks(Vec<ScheduledTask>),
    /// A run just ended; report it.
    ReportRun(RunSummary),
    /// Stop the runtime (`--once` with nothing left to do).
    RequestExit,
}

/// Result of feeding one `RuntimeEvent` to the core.
#[derive(Debug, Clone)]
pub struct CoreStep {
    pub commands: Vec<CoreCommand>,
    /// False once the shell should leave its event loop.
    pub keep_running: bool,
}

impl CoreStep {
    fn from_commands(mut commands: Vec<CoreCommand>, exit: bool) -> Self {
        if exit {
            commands.push(CoreCommand::RequestExit);
        }
        Self {
            commands,
            keep_running: !exit,
        }
    }
}

/// A trigger while idle starts a run seeded with everything queued so far.
///
/// While a run is active, a task that already takes part in it is recorded
/// in the queue for a later run (queue/cancel semantics). Any other task
/// joins the active run right away, so unrelated pipelines build in
/// parallel.
pub fn handle_task_trigger(
    scheduler: &mut Scheduler,
    queue: &mut TriggerQueue,
    options: &RuntimeOptions,
    task: TaskName,
    reason: TriggerReason,
) -> CoreStep {
    debug!(task = %task, ?reason, "handling trigger");
    let mut commands = Vec::new();

    if scheduler.is_idle() {
        let mut triggers: BTreeSet<TaskName> = queue.drain_pending().into_iter().collect();
        triggers.insert(task);
        commands.extend(start_new_run_from_triggers(scheduler, triggers.into_iter().collect()));
        commands.extend(start_queued_runs(scheduler, queue));
    } else {
        match scheduler.run_state_of(&task) {
            None => warn!(task = %task, "trigger for unknown task; ignoring"),
            Some(TaskRunState::NotInRun) => {
                let step = scheduler.step_trigger(&task);
                push_step(&mut commands, step);
            }
            Some(_) => queue.record_trigger(&task),
        }
    }

    // Unknown tasks and blocked dependents can end a run without any
    // completion, so `--once` is checked after triggers as well.
    let exit = should_exit(scheduler, queue, options);
    CoreStep::from_commands(commands, exit)
}

/// A completion may unblock dependents, end the run, and start a queued one.
pub fn handle_task_completion(
    scheduler: &mut Scheduler,
    queue: &mut TriggerQueue,
    options: &RuntimeOptions,
    task: TaskName,
    outcome: TaskOutcome,
) -> CoreStep {
    let mut commands = Vec::new();

    let step = scheduler.step_completion(&task, outcome);
    push_step(&mut commands, step);

    commands.extend(start_queued_runs(scheduler, queue));

    let exit = should_exit(scheduler, queue, options);
    CoreStep::from_commands(commands, exit)
}

/// Open a run and trigger every task in `triggers`, in order.
pub fn start_new_run_from_triggers(scheduler: &mut Scheduler, triggers: Vec<TaskName>) -> Vec<CoreCommand> {
    if triggers.is_empty() {
        return Vec::new();
    }

    scheduler.start_new_run();

    let mut ready = Vec::new();
    let mut finished = Vec::new();
    for task in triggers {
        let step = scheduler.step_trigger(&task);
        ready.extend(step.newly_scheduled);
        finished.extend(step.finished_run);
    }

    let mut commands = Vec::new();
    if !ready.is_empty() {
        commands.push(CoreCommand::DispatchTasks(ready));
    }
    commands.extend(finished.into_iter().map(CoreCommand::ReportRun));
    commands
}

/// Start the next queued batch once the scheduler is idle. A batch whose
/// tasks are all unknown or blocked ends at once, so keep going until a run
/// stays active or the queue is empty.
fn start_queued_runs(scheduler: &mut Scheduler, queue: &mut TriggerQueue) -> Vec<CoreCommand> {
    let mut commands = Vec::new();
    while scheduler.is_idle() && !queue.is_empty() {
        commands.extend(start_new_run_from_triggers(scheduler, queue.drain_pending()));
    }
    commands
}

fn push_step(commands: &mut Vec<CoreCommand>, step: SchedulerStep) {
    if !step.newly_scheduled.is_empty() {
        commands.push(CoreCommand::DispatchTasks(step.newly_scheduled));
    }
    if let Some(summary) = step.finished_run {
        commands.push(CoreCommand::ReportRun(summary));
    }
}

fn should_exit(scheduler: &Scheduler, queue: &TriggerQueue, options: &RuntimeOptions) -> bool {
    options.exit_when_idle && scheduler.is_idle() && queue.is_empty()
}
