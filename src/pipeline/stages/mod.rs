// src/pipeline/stages/mod.rs

//! Pipeline stages: each takes the previous stage's assets and returns its own.

use std::fmt::Debug;

use crate::config::model::StageConfig;
use crate::errors::PipelineError;

use super::asset::Asset;
use super::context::StageContext;

pub mod banner;
pub mod command;
pub mod css;
pub mod dest;
pub mod js;
pub mod reload;
pub mod rename;

pub use banner::BannerStage;
pub use command::CommandStage;
pub use css::{AutoprefixStage, MinifyCssStage};
pub use dest::DestStage;
pub use js::{LintJsStage, MinifyJsStage};
pub use reload::ReloadStage;
pub use rename::RenameStage;

/// One transformation step of a pipeline.
pub trait Stage: Send + Sync + Debug {
    /// The `kind` this stage was configured with.
    fn name(&self) -> &'static str;

    fn apply(&self, assets: Vec<Asset>, ctx: &StageContext<'_>) -> Result<Vec<Asset>, PipelineError>;
}

/// Instantiate configured stages, in order.
///
/// Fails on settings that can only be checked by the transform library
/// itself (e.g. an invalid browserslist query).
pub fn build_stages(configs: &[StageConfig]) -> Result<Vec<Box<dyn Stage>>, PipelineError> {
    configs.iter().map(build_stage).collect()
}

fn build_stage(cfg: &StageConfig) -> Result<Box<dyn Stage>, PipelineError> {
    let stage: Box<dyn Stage> = match cfg {
        StageConfig::Command { cmd, ext } => Box::new(CommandStage::new(cmd.clone(), ext.clone())),
        StageConfig::Autoprefix { browsers } => Box::new(AutoprefixStage::new(browsers)?),
        StageConfig::MinifyCss { browsers } => Box::new(MinifyCssStage::new(browsers)?),
        StageConfig::LintJs { fail_on_error } => Box::new(LintJsStage::new(*fail_on_error)),
        StageConfig::MinifyJs => Box::new(MinifyJsStage),
        StageConfig::Banner { template } => Box::new(BannerStage::new(template.clone())),
        StageConfig::Rename {
            prefix,
            suffix,
            ext,
        } => Box::new(RenameStage::new(prefix.clone(), suffix.clone(), ext.clone())),
        StageConfig::Dest { dir } => Box::new(DestStage::new(dir)),
        StageConfig::Reload { once } => Box::new(ReloadStage::new(*once)),
    };
    Ok(stage)
}

/// Apply `f` to every asset, tagging failures with the stage and file name.
pub(crate) fn map_contents(
    stage: &'static str,
    assets: Vec<Asset>,
    mut f: impl FnMut(&Asset) -> Result<String, String>,
) -> Result<Vec<Asset>, PipelineError> {
    assets
        .into_iter()
        .map(|asset| match f(&asset) {
            Ok(contents) => Ok(asset.with_contents(contents)),
            Err(message) => Err(PipelineError::stage(stage, asset.display_name(), message)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_are_built_in_order() {
        let configs = vec![
            StageConfig::LintJs { fail_on_error: false },
            StageConfig::MinifyJs,
            StageConfig::Rename {
                prefix: None,
                suffix: Some(".min".into()),
                ext: None,
            },
            StageConfig::Dest { dir: "out".into() },
        ];
        let names: Vec<_> = build_stages(&configs).unwrap().iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["lint_js", "minify_js", "rename", "dest"]);
    }

    #[test]
    fn invalid_browserslist_query_is_rejected() {
        let err = build_stages(&[StageConfig::Autoprefix {
            browsers: vec!["not a real browser 99".into()],
        }])
        .unwrap_err();
        assert!(matches!(err, PipelineError::Stage { stage: "autoprefix", .. }));
    }
}
