// src/watch/watcher.rs

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::RuntimeEvent;
use crate::fs::RealFileSystem;
use crate::watch::dag_filter::DepMap;
use crate::watch::debouncer::Debouncer;
use crate::watch::event_handler::{process_file_change, WatchContext};
use crate::watch::patterns::WatchProfile;

/// Handle for the filesystem watcher.
///
/// Keeps the underlying `RecommendedWatcher` alive; dropping the handle
/// stops file watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Spawn a recursive filesystem watcher on `root` that sends
/// `RuntimeEvent::TaskTriggered` for the tasks of every `[[watch]]` rule
/// matching a changed path.
///
/// - `profiles` are the compiled watch rules.
/// - `dep_map` feeds the DAG-aware filter; pass an empty map to keep every
///   matching task.
/// - `debounce` is the quiet period before a batch of changes is flushed.
pub fn spawn_watcher(
    root: impl Into<PathBuf>,
    profiles: Vec<WatchProfile>,
    dep_map: DepMap,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    debounce: Duration,
) -> Result<WatcherHandle> {
    let root = root.into();
    let root = root.canonicalize().unwrap_or(root);

    // Channel from the blocking notify callback into the async world.
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if let Err(err) = event_tx.send(event) {
                    eprintln!("assetpipe: failed to forward notify event: {err}");
                }
            }
            Err(err) => {
                eprintln!("assetpipe: file watch error: {err}");
            }
        },
        Config::default(),
    )?;

    watcher.watch(&root, RecursiveMode::Recursive)?;

    info!(root = ?root, rules = profiles.len(), "file watcher started");

    let ctx = Arc::new(WatchContext::new(
        Arc::new(RealFileSystem),
        root,
        profiles,
        dep_map,
    ));

    tokio::spawn(async move {
        let prime_ctx = Arc::clone(&ctx);
        if let Err(err) = tokio::task::spawn_blocking(move || prime_ctx.prime_hashes()).await {
            warn!(error = %err, "priming watch hashes panicked");
        }

        let mut debouncer = Debouncer::new(debounce);

        loop {
            tokio::select! {
                maybe_event = event_rx.recv() => {
                    match maybe_event {
                        Some(event) => {
                            debug!(kind = ?event.kind, paths = ?event.paths, "raw notify event");
                            debouncer.add_event(&event);
                        }
                        None => break,
                    }
                }
                _ = tokio::time::sleep(debouncer.sleep_duration()) => {}
            }

            if let Some(paths) = debouncer.take_if_ready() {
                debug!(count = paths.len(), "flushing debounced changes");
                if !process_file_change(&ctx, paths, &runtime_tx).await {
                    break;
                }
            }
        }
        debug!(root = ?ctx.root(), "watcher event loop finished");
    });

    Ok(WatcherHandle { _inner: watcher })
}
