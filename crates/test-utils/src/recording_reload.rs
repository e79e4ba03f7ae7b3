use std::sync::{Arc, Mutex};

use assetpipe::reload::{ReloadEvent, ReloadSink};

/// Reload sink that remembers every event it was handed.
///
/// Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingReload {
    events: Arc<Mutex<Vec<ReloadEvent>>>,
}

impl RecordingReload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ReloadEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl ReloadSink for RecordingReload {
    fn notify(&self, event: ReloadEvent) {
        self.events.lock().unwrap().push(event);
    }
}
