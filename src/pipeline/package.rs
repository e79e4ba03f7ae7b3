// src/pipeline/package.rs

//! Package metadata rendered into banners.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

use crate::config::model::PackageSection;
use crate::fs::FileSystem;

/// Resolved `package.*` banner values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageInfo {
    pub name: Option<String>,
    pub title: Option<String>,
    pub url: Option<String>,
    pub author: Option<String>,
    pub version: Option<String>,
    pub license: Option<String>,
}

/// The subset of a `package.json` we read.
#[derive(Debug, Default, Deserialize)]
struct PackageJson {
    name: Option<String>,
    title: Option<String>,
    #[serde(alias = "homepage")]
    url: Option<String>,
    author: Option<Author>,
    version: Option<String>,
    license: Option<String>,
}

/// npm allows `"author": "Name <mail>"` or `"author": { "name": ... }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Author {
    Plain(String),
    Person { name: String },
}

impl Author {
    fn into_name(self) -> String {
        match self {
            Author::Plain(s) => s,
            Author::Person { name } => name,
        }
    }
}

impl PackageInfo {
    /// Resolve metadata from `[package]`, reading `file` relative to
    /// `config_dir` first. Inline fields override file values.
    pub fn load(fs: &dyn FileSystem, config_dir: &Path, section: &PackageSection) -> Result<Self> {
        let mut info = match &section.file {
            Some(file) => {
                let path = config_dir.join(file);
                let raw = fs
                    .read_to_string(&path)
                    .with_context(|| format!("reading package metadata {}", path.display()))?;
                let info = Self::from_json(&raw)
                    .with_context(|| format!("parsing package metadata {}", path.display()))?;
                debug!(path = %path.display(), name = ?info.name, "loaded package metadata");
                info
            }
            None => Self::default(),
        };

        let overrides = [
            (&mut info.name, &section.name),
            (&mut info.title, &section.title),
            (&mut info.url, &section.url),
            (&mut info.author, &section.author),
            (&mut info.version, &section.version),
            (&mut info.license, &section.license),
        ];
        for (field, inline) in overrides {
            if inline.is_some() {
                field.clone_from(inline);
            }
        }

        Ok(info)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let pkg: PackageJson = serde_json::from_str(raw)?;
        Ok(Self {
            name: pkg.name,
            title: pkg.title,
            url: pkg.url,
            author: pkg.author.map(Author::into_name),
            version: pkg.version,
            license: pkg.license,
        })
    }

    /// Look up a `package.<field>` key.
    pub fn field(&self, field: &str) -> Option<&str> {
        let value = match field {
            "name" => &self.name,
            "title" => &self.title,
            "url" => &self.url,
            "author" => &self.author,
            "version" => &self.version,
            "license" => &self.license,
            _ => return None,
        };
        value.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    #[test]
    fn inline_fields_override_package_json() {
        let fs = MockFileSystem::new();
        fs.add_file(
            "package.json",
            r#"{"name":"botbot","version":"1.2.0","license":"MIT","author":{"name":"Lincoln"}}"#,
        );
        let section = PackageSection {
            file: Some("package.json".into()),
            version: Some("2.0.0".into()),
            ..PackageSection::default()
        };

        let info = PackageInfo::load(&fs, Path::new("."), &section).unwrap();

        assert_eq!(info.field("name"), Some("botbot"));
        assert_eq!(info.field("author"), Some("Lincoln"));
        assert_eq!(info.field("version"), Some("2.0.0"));
        assert_eq!(info.field("title"), None);
    }

    #[test]
    fn plain_author_string_is_kept() {
        let info = PackageInfo::from_json(r#"{"author":"Lincoln <l@example.com>"}"#).unwrap();
        assert_eq!(info.author.as_deref(), Some("Lincoln <l@example.com>"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let section = PackageSection {
            file: Some("package.json".into()),
            ..PackageSection::default()
        };
        let err = PackageInfo::load(&MockFileSystem::new(), Path::new("."), &section).unwrap_err();
        assert!(format!("{err:#}").contains("package.json"));
    }
}
