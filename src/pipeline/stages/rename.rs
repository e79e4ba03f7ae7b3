// src/pipeline/stages/rename.rs

use crate::errors::PipelineError;
use crate::pipeline::asset::Asset;
use crate::pipeline::context::StageContext;

use super::Stage;

/// Rename assets: `prefix` before the stem, `suffix` between stem and
/// extension, `ext` replacing the extension. The directory part of the
/// relative path is kept.
#[derive(Debug, Clone)]
pub struct RenameStage {
    prefix: Option<String>,
    suffix: Option<String>,
    ext: Option<String>,
}

impl RenameStage {
    pub fn new(prefix: Option<String>, suffix: Option<String>, ext: Option<String>) -> Self {
        Self { prefix, suffix, ext }
    }

    fn rename(&self, asset: &mut Asset) {
        let ext = match &self.ext {
            Some(ext) => Some(ext.trim_start_matches('.').to_string()),
            None => asset.extension().map(str::to_string),
        };

        let mut name = format!(
            "{}{}{}",
            self.prefix.as_deref().unwrap_or_default(),
            asset.file_stem(),
            self.suffix.as_deref().unwrap_or_default()
        );
        if let Some(ext) = ext.filter(|e| !e.is_empty()) {
            name.push('.');
            name.push_str(&ext);
        }

        asset.set_file_name(&name);
    }
}

impl Stage for RenameStage {
    fn name(&self) -> &'static str {
        "rename"
    }

    fn apply(&self, mut assets: Vec<Asset>, _ctx: &StageContext<'_>) -> Result<Vec<Asset>, PipelineError> {
        for asset in &mut assets {
            self.rename(asset);
        }
        Ok(assets)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn renamed(stage: RenameStage, relative: &str) -> PathBuf {
        let mut asset = Asset::new("src", relative, "");
        stage.rename(&mut asset);
        asset.relative
    }

    #[test]
    fn suffix_goes_before_the_extension() {
        let stage = RenameStage::new(None, Some(".min".into()), None);
        assert_eq!(renamed(stage, "js/scripts.js"), PathBuf::from("js/scripts.min.js"));
    }

    #[test]
    fn prefix_and_ext_combine() {
        let stage = RenameStage::new(Some("app-".into()), None, Some(".css".into()));
        assert_eq!(renamed(stage, "screen.scss"), PathBuf::from("app-screen.css"));
    }
}
