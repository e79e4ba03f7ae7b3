// src/reload/mod.rs

//! Live reload: events, the sink trait stages and tasks push into, and the
//! WebSocket server that forwards them to browsers.

use std::fmt::Debug;

pub mod message;
pub mod server;
pub mod snippet;

pub use message::{ReloadEvent, ReloadMessage};
pub use server::ReloadServer;
pub use snippet::client_snippet;

/// Receiver of reload events.
///
/// Implementations must not block for long: pipelines call this from the
/// blocking pool while other tasks are running.
pub trait ReloadSink: Send + Sync + Debug {
    fn notify(&self, event: ReloadEvent);
}

/// Sink used when live reload is disabled (`--once`, `[reload] enable = false`).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopReload;

impl ReloadSink for NoopReload {
    fn notify(&self, event: ReloadEvent) {
        tracing::trace!(?event, "reload disabled; dropping event");
    }
}
