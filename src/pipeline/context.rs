// src/pipeline/context.rs

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use crate::fs::FileSystem;
use crate::reload::{ReloadEvent, ReloadSink};

use super::banner::BannerContext;

/// Everything pipelines share across tasks and runs.
#[derive(Debug, Clone)]
pub struct PipelineEnv {
    /// Directory `src` patterns and `dest` dirs are relative to.
    pub root: PathBuf,
    pub fs: Arc<dyn FileSystem>,
    pub banner: Arc<BannerContext>,
    pub reload: Arc<dyn ReloadSink>,
}

/// Per-run view handed to every stage of one pipeline.
#[derive(Debug)]
pub struct StageContext<'a> {
    pub task: &'a str,
    env: &'a PipelineEnv,
    written: Mutex<Vec<PathBuf>>,
}

impl<'a> StageContext<'a> {
    pub fn new(task: &'a str, env: &'a PipelineEnv) -> Self {
        Self {
            task,
            env,
            written: Mutex::new(Vec::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.env.root
    }

    pub fn fs(&self) -> &dyn FileSystem {
        self.env.fs.as_ref()
    }

    pub fn banner(&self) -> &BannerContext {
        &self.env.banner
    }

    pub fn reload(&self, event: ReloadEvent) {
        self.env.reload.notify(event);
    }

    pub(crate) fn record_write(&self, path: PathBuf) {
        self.written
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(path);
    }

    pub(crate) fn into_written(self) -> Vec<PathBuf> {
        self.written.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}
