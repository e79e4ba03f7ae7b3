// src/pipeline/asset.rs

use std::path::PathBuf;

/// One file flowing through a pipeline.
///
/// `relative` is the path below the glob base of the `src` pattern that
/// matched it, and is what `dest` appends to its output directory:
/// `scss/screen.scss` has base `scss` and relative `screen.scss`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub base: PathBuf,
    pub relative: PathBuf,
    pub contents: String,
}

impl Asset {
    pub fn new(base: impl Into<PathBuf>, relative: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            relative: relative.into(),
            contents: contents.into(),
        }
    }

    /// Where the asset was read from (or would live, after renames).
    pub fn path(&self) -> PathBuf {
        self.base.join(&self.relative)
    }

    /// Relative path for logs and error messages.
    pub fn display_name(&self) -> String {
        self.relative.display().to_string()
    }

    pub fn extension(&self) -> Option<&str> {
        self.relative.extension().and_then(|e| e.to_str())
    }

    pub fn has_extension(&self, ext: &str) -> bool {
        self.extension().is_some_and(|e| e.eq_ignore_ascii_case(ext))
    }

    pub fn file_stem(&self) -> &str {
        self.relative
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
    }

    /// Replace the file name, keeping the directory part of `relative`.
    pub fn set_file_name(&mut self, name: &str) {
        self.relative.set_file_name(name);
    }

    pub fn set_extension(&mut self, ext: &str) {
        self.relative.set_extension(ext.trim_start_matches('.'));
    }

    pub fn with_contents(mut self, contents: String) -> Self {
        self.contents = contents;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_and_renames_only_touch_relative() {
        let mut asset = Asset::new("scss", "pages/screen.scss", "");
        assert!(asset.has_extension("SCSS"));

        asset.set_extension(".css");
        assert_eq!(asset.relative, PathBuf::from("pages/screen.css"));

        asset.set_file_name("screen.min.css");
        assert_eq!(asset.path(), PathBuf::from("scss/pages/screen.min.css"));
    }
}
