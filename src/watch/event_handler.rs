// src/watch/event_handler.rs

//! Turning changed paths into task triggers.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::{RuntimeEvent, TaskName, TriggerReason};
use crate::fs::FileSystem;
use crate::watch::cache::FileCache;
use crate::watch::dag_filter::{root_tasks, DepMap};
use crate::watch::hash::{compute_aggregate_hash, HashStore, MemoryHashStore};
use crate::watch::path_utils::relative_str;
use crate::watch::patterns::{collect_matching_files, WatchProfile};

/// Everything the watcher needs to map a change onto tasks.
#[derive(Debug)]
pub struct WatchContext {
    fs: Arc<dyn FileSystem>,
    root: PathBuf,
    profiles: Vec<WatchProfile>,
    dep_map: DepMap,
    hashes: Mutex<MemoryHashStore>,
    cache: Mutex<FileCache>,
}

impl WatchContext {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        root: PathBuf,
        profiles: Vec<WatchProfile>,
        dep_map: DepMap,
    ) -> Self {
        Self {
            fs,
            root,
            profiles,
            dep_map,
            hashes: Mutex::new(MemoryHashStore::new()),
            cache: Mutex::new(FileCache::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Record the current content hash of every `use_hash` rule, so the
    /// first change after startup is compared against what the initial run
    /// built.
    pub fn prime_hashes(&self) {
        for profile in self.profiles.iter().filter(|p| p.use_hash()) {
            match self.rule_hash(profile) {
                Ok(hash) => self.lock_hashes().save(&profile.key(), &hash),
                Err(err) => warn!(rule = %profile.key(), error = %err, "failed to prime rule hash"),
            }
        }
    }

    /// Tasks to trigger for a batch of changed (absolute) paths, sorted.
    ///
    /// 1. Relativize each path against the root.
    /// 2. Collect the tasks of every rule matching at least one path; a
    ///    `use_hash` rule only counts if its aggregate content changed.
    /// 3. Drop tasks whose ancestor is also being triggered.
    pub fn tasks_for_changes(&self, paths: &[PathBuf]) -> Vec<TaskName> {
        let changes: Vec<(&PathBuf, String)> = paths
            .iter()
            .filter_map(|path| match relative_str(&self.root, path) {
                Some(rel) => Some((path, rel)),
                None => {
                    warn!(?path, root = ?self.root, "could not relativize path");
                    None
                }
            })
            .collect();

        let mut matching: BTreeSet<TaskName> = BTreeSet::new();

        for profile in &self.profiles {
            let hits: Vec<&(&PathBuf, String)> =
                changes.iter().filter(|(_, rel)| profile.matches(rel)).collect();
            if hits.is_empty() {
                continue;
            }

            if profile.use_hash() {
                {
                    let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
                    for (abs, _) in &hits {
                        cache.invalidate(abs);
                    }
                }
                if !self.content_changed(profile, &hits[0].1) {
                    continue;
                }
            }

            debug!(rule = %profile.key(), tasks = ?profile.tasks(), path = %hits[0].1, "watch rule matched");
            matching.extend(profile.tasks().iter().cloned());
        }

        let roots = root_tasks(&matching, &self.dep_map);
        if roots.len() < matching.len() {
            debug!(?matching, ?roots, "DAG-aware filter: triggering only root tasks");
        }
        roots
    }

    /// Compare the rule's aggregate hash with the stored one; on change,
    /// store the new hash.
    fn content_changed(&self, profile: &WatchProfile, rel_path: &str) -> bool {
        let key = profile.key();
        let new_hash = match self.rule_hash(profile) {
            Ok(hash) => hash,
            Err(err) => {
                warn!(rule = %key, error = %err, "failed to hash watched files; triggering anyway");
                return true;
            }
        };

        let mut store = self.lock_hashes();
        if store.load(&key).as_deref() == Some(new_hash.as_str()) {
            println!(
                "[assetpipe] Skipping {:?} (watched content unchanged; last event path '{}')",
                profile.tasks(),
                rel_path
            );
            info!(rule = %key, path = %rel_path, "hash unchanged; skipping trigger");
            return false;
        }
        store.save(&key, &new_hash);
        true
    }

    fn rule_hash(&self, profile: &WatchProfile) -> anyhow::Result<String> {
        let files = collect_matching_files(self.fs.as_ref(), &self.root, profile)?;
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        let hashes = files
            .iter()
            .map(|file| cache.get_or_compute(self.fs.as_ref(), file))
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(compute_aggregate_hash(&hashes))
    }

    fn lock_hashes(&self) -> std::sync::MutexGuard<'_, MemoryHashStore> {
        self.hashes.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Process one debounced batch of changed paths and send a trigger for each
/// resulting task.
///
/// Returns `false` once the runtime channel is closed.
pub async fn process_file_change(
    ctx: &Arc<WatchContext>,
    paths: Vec<PathBuf>,
    runtime_tx: &mpsc::Sender<RuntimeEvent>,
) -> bool {
    let blocking_ctx = Arc::clone(ctx);
    let tasks = match tokio::task::spawn_blocking(move || blocking_ctx.tasks_for_changes(&paths)).await {
        Ok(tasks) => tasks,
        Err(err) => {
            warn!(error = %err, "watch change processing panicked");
            return true;
        }
    };

    for task in tasks {
        info!(task = %task, "file change -> triggering task");
        if let Err(err) = runtime_tx
            .send(RuntimeEvent::TaskTriggered {
                task,
                reason: TriggerReason::FileWatch,
            })
            .await
        {
            warn!("failed to send RuntimeEvent::TaskTriggered: {err}");
            return false;
        }
    }

    true
}
