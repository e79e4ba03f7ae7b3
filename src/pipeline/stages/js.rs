// src/pipeline/stages/js.rs

//! JavaScript stages backed by oxc.

use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::semantic::SemanticBuilder;
use oxc::span::SourceType;
use tracing::{debug, warn};

use crate::errors::PipelineError;
use crate::pipeline::asset::Asset;
use crate::pipeline::context::StageContext;

use super::{map_contents, Stage};

/// `.mjs` is a module; everything else is a classic browser script, so
/// top-level names stay global.
fn source_type(asset: &Asset) -> SourceType {
    if asset.has_extension("mjs") {
        SourceType::mjs()
    } else {
        SourceType::cjs()
    }
}

/// A single lint finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub line: usize,
    pub message: String,
}

/// Syntax and semantic diagnostics for `source`.
pub fn lint_source(source: &str, source_type: SourceType) -> Vec<Finding> {
    let allocator = Allocator::default();
    let parsed = Parser::new(&allocator, source, source_type).parse();

    let mut diagnostics = parsed.errors;
    if !parsed.panicked {
        let semantic = SemanticBuilder::new()
            .with_check_syntax_error(true)
            .build(&parsed.program);
        diagnostics.extend(semantic.errors);
    }

    let mut findings: Vec<Finding> = diagnostics
        .iter()
        .map(|diag| {
            let offset = diag
                .labels
                .as_ref()
                .and_then(|labels| labels.first())
                .map(|label| label.offset())
                .unwrap_or(0);
            Finding {
                line: line_of(source, offset),
                message: diag.message.to_string(),
            }
        })
        .collect();
    findings.sort_by_key(|f| f.line);
    findings
}

fn line_of(source: &str, offset: usize) -> usize {
    let end = offset.min(source.len());
    source.as_bytes()[..end].iter().filter(|b| **b == b'\n').count() + 1
}

/// Report diagnostics as warnings. The stream passes through untouched
/// unless `fail_on_error` is set.
#[derive(Debug, Clone)]
pub struct LintJsStage {
    fail_on_error: bool,
}

impl LintJsStage {
    pub fn new(fail_on_error: bool) -> Self {
        Self { fail_on_error }
    }
}

impl Stage for LintJsStage {
    fn name(&self) -> &'static str {
        "lint_js"
    }

    fn apply(&self, assets: Vec<Asset>, ctx: &StageContext<'_>) -> Result<Vec<Asset>, PipelineError> {
        let mut failed = Vec::new();

        for asset in &assets {
            let file = asset.display_name();
            let findings = lint_source(&asset.contents, source_type(asset));

            for finding in &findings {
                warn!(task = ctx.task, file = %file, line = finding.line, "{}", finding.message);
            }
            if findings.is_empty() {
                debug!(task = ctx.task, file = %file, "lint clean");
            } else if self.fail_on_error {
                failed.push((file, findings.len()));
            }
        }

        if let Some((file, count)) = failed.into_iter().next() {
            return Err(PipelineError::stage(
                self.name(),
                file,
                format!("{count} lint finding(s) with fail_on_error = true"),
            ));
        }
        Ok(assets)
    }
}

/// Compress, mangle and print minified.
#[derive(Debug, Clone, Copy)]
pub struct MinifyJsStage;

/// Minify one script. Errors carry the first parse diagnostic.
pub fn minify_js(source: &str, source_type: SourceType) -> Result<String, String> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, source_type).parse();
    if let Some(first) = ret.errors.first() {
        return Err(format!("syntax error: {}", first.message));
    }

    let mut program = ret.program;
    let options = MinifierOptions {
        mangle: Some(MangleOptions::default()),
        compress: Some(CompressOptions::smallest()),
    };
    let ret = Minifier::new(options).minify(&allocator, &mut program);
    let code = Codegen::new()
        .with_options(CodegenOptions {
            minify: true,
            comments: CommentOptions::disabled(),
            ..CodegenOptions::default()
        })
        .with_scoping(ret.scoping)
        .build(&program)
        .code;
    Ok(code)
}

impl Stage for MinifyJsStage {
    fn name(&self) -> &'static str {
        "minify_js"
    }

    fn apply(&self, assets: Vec<Asset>, _ctx: &StageContext<'_>) -> Result<Vec<Asset>, PipelineError> {
        map_contents(self.name(), assets, |asset| minify_js(&asset.contents, source_type(asset)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCRIPT: &str = "/* site scripts */\nfunction greet(name) {\n  var message = 'hello ' + name;\n  return message;\n}\nwindow.greet = greet;\n";

    #[test]
    fn clean_script_has_no_findings() {
        assert!(lint_source(SCRIPT, SourceType::cjs()).is_empty());
    }

    #[test]
    fn findings_carry_line_numbers() {
        let findings = lint_source("var a = 1;\nvar b = ;\n", SourceType::cjs());
        assert!(!findings.is_empty());
        assert_eq!(findings[0].line, 2);
    }

    #[test]
    fn style_only_issues_are_not_findings() {
        let loose = "var a = 1\nif (a == '1') { a = 2 }\n";
        assert!(lint_source(loose, SourceType::cjs()).is_empty());
    }

    #[test]
    fn minified_script_is_smaller_and_drops_comments() {
        let out = minify_js(SCRIPT, SourceType::cjs()).unwrap();
        assert!(out.len() < SCRIPT.len());
        assert!(!out.contains("site scripts"));
        assert!(out.contains("window.greet"));
    }

    #[test]
    fn syntax_error_fails_minification() {
        let err = minify_js("function (", SourceType::cjs()).unwrap_err();
        assert!(err.starts_with("syntax error"));
    }
}
