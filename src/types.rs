// src/types.rs

use std::fmt;

use clap::ValueEnum;
use serde::Deserialize;

/// What a trigger does when its task is already part of the active run.
///
/// The active run always finishes. `Queue` remembers the trigger for a
/// follow-up run; a task triggered again while already queued gets another
/// run, up to `queue_length` waiting runs. `Cancel` keeps only the most
/// recent trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TriggerWhileRunningBehaviour {
    #[default]
    Queue,
    Cancel,
}

impl fmt::Display for TriggerWhileRunningBehaviour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TriggerWhileRunningBehaviour::Queue => "queue",
            TriggerWhileRunningBehaviour::Cancel => "cancel",
        })
    }
}
