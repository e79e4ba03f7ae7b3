// src/watch/debouncer.rs

//! Coalesces bursts of raw `notify` events into one batch of changed paths.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use notify::EventKind;
use notify::event::ModifyKind;
use tracing::trace;

/// Idle wait used when nothing is pending.
const IDLE_WAIT: Duration = Duration::from_secs(3600);

/// Pure debouncer: only timing and deduplication, no knowledge of rules.
#[derive(Debug)]
pub struct Debouncer {
    quiet: Duration,
    changed: BTreeSet<PathBuf>,
    last_event: Option<Instant>,
}

impl Debouncer {
    /// `quiet` is how long no new events must arrive before a flush.
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            changed: BTreeSet::new(),
            last_event: None,
        }
    }

    /// Record a raw event.
    ///
    /// Access and metadata-only events are dropped (mtime/chmod noise from
    /// tools touching files), as are editor temp and backup files.
    pub fn add_event(&mut self, event: &notify::Event) {
        match event.kind {
            EventKind::Create(_) | EventKind::Remove(_) => {}
            EventKind::Modify(ModifyKind::Metadata(_)) => return,
            EventKind::Modify(_) => {}
            _ => return,
        }

        for path in &event.paths {
            if is_temp_file(path) {
                trace!(path = ?path, "ignoring temp file event");
                continue;
            }
            self.changed.insert(path.clone());
            self.last_event = Some(Instant::now());
        }
    }

    pub fn is_ready(&self) -> bool {
        match self.last_event {
            Some(last) => !self.changed.is_empty() && last.elapsed() >= self.quiet,
            None => false,
        }
    }

    /// Take the changed paths (sorted, deduplicated) once the quiet period
    /// has elapsed.
    pub fn take_if_ready(&mut self) -> Option<Vec<PathBuf>> {
        if !self.is_ready() {
            return None;
        }
        self.last_event = None;
        Some(std::mem::take(&mut self.changed).into_iter().collect())
    }

    /// How long to wait before the batch can next become ready.
    pub fn sleep_duration(&self) -> Duration {
        match self.last_event {
            Some(last) => self
                .quiet
                .saturating_sub(last.elapsed())
                .max(Duration::from_millis(1)),
            None => IDLE_WAIT,
        }
    }
}

/// Editor artifacts: swap, backup and hidden files.
fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, DataChange, MetadataKind};

    fn event(paths: &[&str], kind: EventKind) -> notify::Event {
        notify::Event {
            kind,
            paths: paths.iter().map(PathBuf::from).collect(),
            attrs: Default::default(),
        }
    }

    fn modify() -> EventKind {
        EventKind::Modify(ModifyKind::Data(DataChange::Any))
    }

    #[test]
    fn empty_debouncer_is_never_ready() {
        let mut d = Debouncer::new(Duration::ZERO);
        assert!(!d.is_ready());
        assert_eq!(d.take_if_ready(), None);
    }

    #[test]
    fn repeated_paths_are_flushed_once() {
        let mut d = Debouncer::new(Duration::ZERO);
        d.add_event(&event(&["/p/scss/b.scss", "/p/scss/a.scss"], modify()));
        d.add_event(&event(&["/p/scss/a.scss"], EventKind::Create(CreateKind::File)));

        assert_eq!(
            d.take_if_ready(),
            Some(vec![PathBuf::from("/p/scss/a.scss"), PathBuf::from("/p/scss/b.scss")])
        );
        assert_eq!(d.take_if_ready(), None);
    }

    #[test]
    fn metadata_and_temp_files_are_ignored() {
        let mut d = Debouncer::new(Duration::ZERO);
        d.add_event(&event(
            &["/p/index.html"],
            EventKind::Modify(ModifyKind::Metadata(MetadataKind::WriteTime)),
        ));
        d.add_event(&event(&["/p/.index.html.swp", "/p/index.html~", "/p/a.tmp"], modify()));
        d.add_event(&event(&["/p/index.html"], EventKind::Access(notify::event::AccessKind::Any)));

        assert!(!d.is_ready());
    }

    #[test]
    fn batch_waits_for_quiet_period() {
        let mut d = Debouncer::new(Duration::from_secs(60));
        d.add_event(&event(&["/p/a.scss"], modify()));

        assert!(!d.is_ready());
        assert!(d.sleep_duration() > Duration::from_secs(1));
    }
}
