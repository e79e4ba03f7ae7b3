// src/pipeline/stages/dest.rs

use std::path::PathBuf;

use tracing::info;

use crate::errors::PipelineError;
use crate::pipeline::asset::Asset;
use crate::pipeline::context::StageContext;

use super::Stage;

/// Write every asset to `<root>/<dir>/<relative>`; the stream continues
/// unchanged, so later stages can write a second variant.
#[derive(Debug, Clone)]
pub struct DestStage {
    dir: PathBuf,
}

impl DestStage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl Stage for DestStage {
    fn name(&self) -> &'static str {
        "dest"
    }

    fn apply(&self, assets: Vec<Asset>, ctx: &StageContext<'_>) -> Result<Vec<Asset>, PipelineError> {
        let out_dir = ctx.root().join(&self.dir);

        for asset in &assets {
            let target = out_dir.join(&asset.relative);
            ctx.fs()
                .write(&target, asset.contents.as_bytes())
                .map_err(|e| PipelineError::stage(self.name(), asset.display_name(), format!("{e:#}")))?;

            info!(
                task = ctx.task,
                file = %target.display(),
                bytes = asset.contents.len(),
                "wrote asset"
            );
            ctx.record_write(target);
        }

        Ok(assets)
    }
}
