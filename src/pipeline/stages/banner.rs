// src/pipeline/stages/banner.rs

use crate::errors::PipelineError;
use crate::pipeline::asset::Asset;
use crate::pipeline::context::StageContext;

use super::Stage;

/// Prefix every asset with the rendered banner.
#[derive(Debug, Clone)]
pub struct BannerStage {
    template: Option<String>,
}

impl BannerStage {
    pub fn new(template: Option<String>) -> Self {
        Self { template }
    }
}

impl Stage for BannerStage {
    fn name(&self) -> &'static str {
        "banner"
    }

    fn apply(&self, assets: Vec<Asset>, ctx: &StageContext<'_>) -> Result<Vec<Asset>, PipelineError> {
        let banner = ctx.banner();
        let rendered = banner.render(self.template.as_deref().unwrap_or_else(|| banner.template()));

        Ok(assets
            .into_iter()
            .map(|mut asset| {
                asset.contents.insert_str(0, &rendered);
                asset
            })
            .collect())
    }
}
