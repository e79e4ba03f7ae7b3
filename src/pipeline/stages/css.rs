// src/pipeline/stages/css.rs

//! CSS stages backed by lightningcss.

use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};

use crate::errors::PipelineError;
use crate::pipeline::asset::Asset;
use crate::pipeline::context::StageContext;

use super::{map_contents, Stage};

fn browsers_from_queries(stage: &'static str, queries: &[String]) -> Result<Option<Browsers>, PipelineError> {
    if queries.is_empty() {
        return Ok(None);
    }
    Browsers::from_browserslist(queries).map_err(|e| {
        PipelineError::stage(stage, "<config>", format!("invalid browserslist query {queries:?}: {e}"))
    })
}

fn targets(browsers: Option<Browsers>) -> Targets {
    Targets {
        browsers,
        ..Targets::default()
    }
}

/// Parse, prefix for `targets` and print a stylesheet.
fn process_css(source: &str, filename: &str, targets: Targets, minify: bool) -> Result<String, String> {
    let mut sheet = StyleSheet::parse(
        source,
        ParserOptions {
            filename: filename.to_string(),
            ..ParserOptions::default()
        },
    )
    .map_err(|e| e.to_string())?;

    sheet
        .minify(MinifyOptions {
            targets,
            ..MinifyOptions::default()
        })
        .map_err(|e| e.to_string())?;

    let printed = sheet
        .to_css(PrinterOptions {
            minify,
            targets,
            ..PrinterOptions::default()
        })
        .map_err(|e| e.to_string())?;

    Ok(printed.code)
}

/// Add vendor prefixes required by the configured browsers; output stays
/// readable.
#[derive(Debug, Clone)]
pub struct AutoprefixStage {
    browsers: Option<Browsers>,
}

impl AutoprefixStage {
    pub fn new(queries: &[String]) -> Result<Self, PipelineError> {
        Ok(Self {
            browsers: browsers_from_queries("autoprefix", queries)?,
        })
    }
}

impl Stage for AutoprefixStage {
    fn name(&self) -> &'static str {
        "autoprefix"
    }

    fn apply(&self, assets: Vec<Asset>, _ctx: &StageContext<'_>) -> Result<Vec<Asset>, PipelineError> {
        map_contents(self.name(), assets, |asset| {
            process_css(&asset.contents, &asset.display_name(), targets(self.browsers), false)
        })
    }
}

/// Minified print. With `browsers`, prefixes are kept for those targets.
#[derive(Debug, Clone)]
pub struct MinifyCssStage {
    browsers: Option<Browsers>,
}

impl MinifyCssStage {
    pub fn new(queries: &[String]) -> Result<Self, PipelineError> {
        Ok(Self {
            browsers: browsers_from_queries("minify_css", queries)?,
        })
    }
}

impl Stage for MinifyCssStage {
    fn name(&self) -> &'static str {
        "minify_css"
    }

    fn apply(&self, assets: Vec<Asset>, _ctx: &StageContext<'_>) -> Result<Vec<Asset>, PipelineError> {
        map_contents(self.name(), assets, |asset| {
            process_css(&asset.contents, &asset.display_name(), targets(self.browsers), true)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSS: &str = ".nav {\n  user-select: none;\n}\n\n.nav a {\n  color: #ff0000;\n}\n";

    #[test]
    fn autoprefix_adds_webkit_prefix_for_old_safari() {
        let browsers = browsers_from_queries("autoprefix", &["safari 10".to_string()]).unwrap();
        let out = process_css(CSS, "nav.css", targets(browsers), false).unwrap();

        assert!(out.contains("-webkit-user-select: none"), "{out}");
        assert!(out.contains('\n'));
    }

    #[test]
    fn minified_output_is_shorter_and_keeps_rules() {
        let plain = process_css(CSS, "nav.css", Targets::default(), false).unwrap();
        let min = process_css(CSS, "nav.css", Targets::default(), true).unwrap();

        assert!(min.len() < plain.len());
        assert!(min.contains(".nav a{color:red}"), "{min}");
    }


    #[test]
    fn invalid_selector_fails() {
        let err = process_css("!!! { color: red }", "broken.css", Targets::default(), true);
        assert!(err.is_err());
    }
}
