// src/pipeline/stages/reload.rs

use crate::errors::PipelineError;
use crate::pipeline::asset::Asset;
use crate::pipeline::context::StageContext;
use crate::reload::ReloadEvent;

use super::Stage;

/// Tell connected browsers about the assets in the stream.
///
/// Stylesheets are injected in place; anything else triggers a full reload.
/// With `once`, the whole stream produces a single full reload.
#[derive(Debug, Clone)]
pub struct ReloadStage {
    once: bool,
}

impl ReloadStage {
    pub fn new(once: bool) -> Self {
        Self { once }
    }
}

impl Stage for ReloadStage {
    fn name(&self) -> &'static str {
        "reload"
    }

    fn apply(&self, assets: Vec<Asset>, ctx: &StageContext<'_>) -> Result<Vec<Asset>, PipelineError> {
        if assets.is_empty() {
            return Ok(assets);
        }

        if self.once {
            ctx.reload(ReloadEvent::Reload);
            return Ok(assets);
        }

        for asset in &assets {
            let event = if asset.has_extension("css") {
                ReloadEvent::Css {
                    path: asset.relative.to_string_lossy().replace('\\', "/"),
                }
            } else {
                ReloadEvent::Reload
            };
            ctx.reload(event);
        }
        Ok(assets)
    }
}
