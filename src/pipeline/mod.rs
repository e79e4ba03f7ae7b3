// src/pipeline/mod.rs

//! Asset pipelines: read `src` files, pass them through stages, write them.
//!
//! - [`sources`] expands `src` patterns into [`Asset`]s.
//! - [`stages`] holds the [`Stage`] trait and every built-in stage.
//! - [`banner`] and [`package`] render banner comments.
//! - [`context`] carries the filesystem, banner values and reload sink.
//!
//! Pipelines are synchronous; the executor runs them on Tokio's blocking pool.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::errors::PipelineError;

pub mod asset;
pub mod banner;
pub mod context;
pub mod package;
pub mod sources;
pub mod stages;

pub use asset::Asset;
pub use banner::{BannerContext, DEFAULT_BANNER};
pub use context::{PipelineEnv, StageContext};
pub use package::PackageInfo;
pub use sources::{expand_sources, glob_base};
pub use stages::{build_stages, Stage};

/// What one pipeline run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    pub task: String,
    /// Number of source files read.
    pub sources: usize,
    /// Every file written by `dest` stages, in write order.
    pub written: Vec<PathBuf>,
    pub elapsed: Duration,
}

/// Run one pipeline: expand `src`, then feed stage N-1's output to stage N.
pub fn run_pipeline(
    task: &str,
    src: &[String],
    stages: &[Box<dyn Stage>],
    env: &PipelineEnv,
) -> Result<PipelineReport, PipelineError> {
    let started = Instant::now();
    let ctx = StageContext::new(task, env);

    let mut assets = expand_sources(env.fs.as_ref(), &env.root, src)?;
    let sources = assets.len();
    debug!(task, sources, stages = stages.len(), "pipeline started");

    for stage in stages {
        assets = stage.apply(assets, &ctx)?;
        debug!(task, stage = stage.name(), assets = assets.len(), "stage done");
    }

    let report = PipelineReport {
        task: task.to_string(),
        sources,
        written: ctx.into_written(),
        elapsed: started.elapsed(),
    };
    info!(
        task,
        sources = report.sources,
        written = report.written.len(),
        elapsed_ms = report.elapsed.as_millis() as u64,
        "pipeline finished"
    );
    Ok(report)
}
