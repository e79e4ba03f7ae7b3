// src/engine/queue.rs

use std::collections::{BTreeSet, VecDeque};

use tracing::debug;

use super::TaskName;
use crate::types::TriggerWhileRunningBehaviour;

/// Follow-up runs requested by triggers that hit a busy task.
///
/// In `Queue` mode each batch becomes one future run. A trigger joins the
/// newest batch unless its task is already there; then it opens a fresh
/// batch, as long as fewer than `queue_length` batches exist. At capacity
/// the task is already covered by the newest batch and nothing changes.
///
/// With the default length of 1, saving three stylesheets in quick
/// succession while `css` compiles costs one extra `css` run, not three.
#[derive(Debug)]
pub struct TriggerQueue {
    behaviour: TriggerWhileRunningBehaviour,
    max_runs: usize,
    runs: VecDeque<BTreeSet<TaskName>>,
}

impl TriggerQueue {
    /// `max_runs` is clamped to at least 1.
    pub fn new(behaviour: TriggerWhileRunningBehaviour, max_runs: usize) -> Self {
        Self {
            behaviour,
            max_runs: max_runs.max(1),
            runs: VecDeque::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Record that `task` was triggered while it takes part in the active run.
    ///
    /// `Cancel` drops every queued batch and keeps only this task.
    pub fn record_trigger(&mut self, task: &str) {
        let name = task.to_string();

        match self.behaviour {
            TriggerWhileRunningBehaviour::Queue => {
                let already_queued = self.runs.back().is_some_and(|batch| batch.contains(&name));
                if !already_queued {
                    if let Some(last_batch) = self.runs.back_mut() {
                        last_batch.insert(name.clone());
                        debug!(task = %name, batches = self.runs.len(), "merged trigger into newest batch");
                    } else {
                        self.runs.push_back(BTreeSet::from([name.clone()]));
                        debug!(task = %name, "queued first follow-up run");
                    }
                } else if self.runs.len() < self.max_runs {
                    self.runs.push_back(BTreeSet::from([name.clone()]));
                    debug!(task = %name, batches = self.runs.len(), "queued another follow-up run");
                } else {
                    debug!(
                        task = %name,
                        max_runs = self.max_runs,
                        "queue_length reached; trigger already covered"
                    );
                }
            }
            TriggerWhileRunningBehaviour::Cancel => {
                debug!(task = %name, "resetting queued batches to this task only (cancel mode)");
                self.runs.clear();
                self.runs.push_back(BTreeSet::from([name]));
            }
        }
    }

    /// Take the oldest batch, sorted, as the triggers for the next run.
    /// Empty when nothing is queued.
    pub fn drain_pending(&mut self) -> Vec<TaskName> {
        let batch = self.runs.pop_front().unwrap_or_default();
        debug!(drained = batch.len(), remaining = self.runs.len(), "took queued batch for new run");
        batch.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(items: &[&str]) -> Vec<TaskName> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn queue_with(length: usize, triggers: &[&str]) -> TriggerQueue {
        let mut q = TriggerQueue::new(TriggerWhileRunningBehaviour::Queue, length);
        for task in triggers {
            q.record_trigger(task);
        }
        q
    }

    #[test]
    fn queue_mode_coalesces_triggers() {
        let mut q = queue_with(1, &["css", "css", "js"]);

        assert_eq!(q.drain_pending(), names(&["css", "js"]));
        assert!(q.is_empty());
    }

    #[test]
    fn queue_length_bounds_follow_up_runs() {
        let mut short = queue_with(1, &["css", "js", "css", "img"]);
        assert_eq!(short.drain_pending(), names(&["css", "img", "js"]));
        assert!(short.is_empty());

        let mut long = queue_with(5, &["css", "js", "css", "img"]);
        assert_eq!(long.drain_pending(), names(&["css", "js"]));
        assert_eq!(long.drain_pending(), names(&["css", "img"]));
        assert!(long.is_empty());
    }

    #[test]
    fn repeated_trigger_at_capacity_is_absorbed() {
        let mut q = queue_with(2, &["css", "css", "css", "css"]);

        assert_eq!(q.drain_pending(), names(&["css"]));
        assert_eq!(q.drain_pending(), names(&["css"]));
        assert!(q.drain_pending().is_empty());
    }

    #[test]
    fn cancel_mode_keeps_latest_trigger_only() {
        let mut q = TriggerQueue::new(TriggerWhileRunningBehaviour::Cancel, 3);
        q.record_trigger("css");
        q.record_trigger("js");

        assert_eq!(q.drain_pending(), names(&["js"]));
        assert!(q.is_empty());
    }

    #[test]
    fn zero_length_is_clamped() {
        let mut q = TriggerQueue::new(TriggerWhileRunningBehaviour::Queue, 0);
        q.record_trigger("css");
        assert!(!q.is_empty());
    }
}
