// src/pipeline/banner.rs

//! Banner templates: `{{ key }}` placeholders filled from package metadata.

use std::sync::OnceLock;

use chrono::Datelike;
use regex::{Captures, Regex};
use tracing::warn;

use super::package::PackageInfo;

/// Banner used when neither the stage nor `[banner]` sets a template.
pub const DEFAULT_BANNER: &str = "/*!
 * {{ package.name }}
 * {{ package.title }}
 * {{ package.url }}
 * @author {{ package.author }}
 * @version {{ package.version }}
 * Copyright {{ year }}. {{ package.license }} licensed.
 */
";

fn placeholder() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{\s*([A-Za-z0-9_.]+)\s*\}\}").expect("static regex"))
}

/// Values a banner template can refer to.
#[derive(Debug, Clone)]
pub struct BannerContext {
    pub package: PackageInfo,
    pub year: i32,
    /// `[banner].template`, if set.
    pub default_template: Option<String>,
}

impl BannerContext {
    /// Context stamped with the current local year.
    pub fn new(package: PackageInfo, default_template: Option<String>) -> Self {
        Self {
            package,
            year: chrono::Local::now().year(),
            default_template,
        }
    }

    /// Template a banner stage should use when it has none of its own.
    pub fn template(&self) -> &str {
        self.default_template.as_deref().unwrap_or(DEFAULT_BANNER)
    }

    /// Render `template`. Unknown keys render empty and are warned about.
    pub fn render(&self, template: &str) -> String {
        placeholder()
            .replace_all(template, |caps: &Captures<'_>| {
                let key = &caps[1];
                match self.lookup(key) {
                    Some(value) => value,
                    None => {
                        warn!(key, "unknown banner placeholder; rendering empty");
                        String::new()
                    }
                }
            })
            .into_owned()
    }

    fn lookup(&self, key: &str) -> Option<String> {
        if key == "year" {
            return Some(self.year.to_string());
        }
        let field = key.strip_prefix("package.")?;
        match field {
            "name" | "title" | "url" | "author" | "version" | "license" => {
                Some(self.package.field(field).unwrap_or_default().to_string())
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> BannerContext {
        BannerContext {
            package: PackageInfo {
                name: Some("botbot".into()),
                license: Some("MIT".into()),
                ..PackageInfo::default()
            },
            year: 2014,
            default_template: None,
        }
    }

    #[test]
    fn renders_package_fields_and_year() {
        let out = ctx().render("/* {{ package.name }} (c) {{year}} {{ package.license }} */");
        assert_eq!(out, "/* botbot (c) 2014 MIT */");
    }

    #[test]
    fn missing_and_unknown_keys_render_empty() {
        let out = ctx().render("[{{ package.title }}][{{ nope }}]");
        assert_eq!(out, "[][]");
    }

    #[test]
    fn default_template_is_a_preserved_comment() {
        let out = ctx().render(ctx().template());
        assert!(out.starts_with("/*!\n * botbot\n"));
        assert!(out.contains("Copyright 2014. MIT licensed."));
        assert!(out.ends_with(" */\n"));
    }
}
