// src/pipeline/sources.rs

//! Expanding `src` patterns into assets.

use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

use globset::{GlobBuilder, GlobMatcher};
use tracing::{debug, warn};

use crate::errors::PipelineError;
use crate::fs::FileSystem;

use super::asset::Asset;

const GLOB_META: &[char] = &['*', '?', '[', ']', '{', '}'];

fn has_glob_meta(s: &str) -> bool {
    s.contains(GLOB_META)
}

/// Split a source pattern into its glob base and whether it is a glob.
///
/// The base is the run of leading components without glob metacharacters;
/// for a literal path it is the parent directory.
///
/// ```
/// use std::path::PathBuf;
/// use assetpipe::pipeline::sources::glob_base;
///
/// assert_eq!(glob_base("scss/*/*.scss"), (PathBuf::from("scss"), true));
/// assert_eq!(glob_base("src/js/scripts.js"), (PathBuf::from("src/js"), false));
/// assert_eq!(glob_base("**/*.js"), (PathBuf::new(), true));
/// ```
pub fn glob_base(pattern: &str) -> (PathBuf, bool) {
    let components: Vec<&str> = pattern.split('/').filter(|c| !c.is_empty() && *c != ".").collect();

    match components.iter().position(|c| has_glob_meta(c)) {
        Some(first_glob) => (components[..first_glob].iter().collect(), true),
        None => {
            let parent = components.len().saturating_sub(1);
            (components[..parent].iter().collect(), false)
        }
    }
}

/// Expand `patterns` (relative to `root`) into assets, reading each file once.
///
/// - Patterns are applied in order; a file matched by several patterns is
///   read once, in the position of its first match.
/// - Matches of one glob come back sorted by path.
/// - A pattern starting with `!` removes earlier matches.
/// - A literal pattern naming a missing file is an error; a glob with no
///   matches only logs a warning.
pub fn expand_sources(
    fs: &dyn FileSystem,
    root: &Path,
    patterns: &[String],
) -> Result<Vec<Asset>, PipelineError> {
    let mut assets: Vec<Asset> = Vec::new();
    let mut seen: BTreeSet<PathBuf> = BTreeSet::new();

    for pattern in patterns {
        if let Some(negated) = pattern.strip_prefix('!') {
            let matcher = compile(negated)?;
            assets.retain(|asset| {
                let keep = !matcher.is_match(relative_to_root(root, &asset.path()));
                if !keep {
                    debug!(file = %asset.path().display(), pattern = %pattern, "source excluded");
                }
                keep
            });
            continue;
        }

        let (base, is_glob) = glob_base(pattern);
        let base_dir = root.join(&base);

        let files = if is_glob {
            let matcher = compile(pattern)?;
            let mut matched: Vec<PathBuf> = walk_files(fs, &base_dir)
                .into_iter()
                .filter(|path| matcher.is_match(relative_to_root(root, path)))
                .collect();
            matched.sort();

            if matched.is_empty() {
                warn!(pattern = %pattern, "source glob matched no files");
            }
            matched
        } else {
            let path = root.join(pattern);
            if !fs.is_file(&path) {
                return Err(PipelineError::MissingSource(path));
            }
            vec![path]
        };

        for path in files {
            if !seen.insert(path.clone()) {
                continue;
            }
            let contents = fs
                .read_to_string(&path)
                .map_err(|e| PipelineError::stage("src", path.display().to_string(), format!("{e:#}")))?;
            let relative = path.strip_prefix(&base_dir).unwrap_or(&path).to_path_buf();
            assets.push(Asset::new(base_dir.clone(), relative, contents));
        }
    }

    debug!(count = assets.len(), ?patterns, "expanded sources");
    Ok(assets)
}

fn compile(pattern: &str) -> Result<GlobMatcher, PipelineError> {
    let normalized = pattern.trim_start_matches("./");
    GlobBuilder::new(normalized)
        .literal_separator(true)
        .build()
        .map(|glob| glob.compile_matcher())
        .map_err(|e| PipelineError::Glob {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })
}

/// `path` relative to `root`, without `.` components, for glob matching.
fn relative_to_root(root: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

/// Every file below `dir`, recursively. Unreadable directories are skipped.
fn walk_files(fs: &dyn FileSystem, dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let mut stack = vec![dir.to_path_buf()];

    while let Some(current) = stack.pop() {
        let entries = match fs.read_dir(&current) {
            Ok(entries) => entries,
            Err(e) => {
                debug!(dir = %current.display(), error = %e, "skipping unreadable directory");
                continue;
            }
        };
        for entry in entries {
            if fs.is_dir(&entry) {
                stack.push(entry);
            } else if fs.is_file(&entry) {
                files.push(entry);
            }
        }
    }

    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    fn fixture() -> MockFileSystem {
        let fs = MockFileSystem::new();
        fs.add_file("scss/screen.scss", "@import 'partials/nav';");
        fs.add_file("scss/partials/_nav.scss", "nav { color: red; }");
        fs.add_file("scss/pages/home.scss", "body { margin: 0; }");
        fs.add_file("src/js/scripts.js", "var a = 1;");
        fs
    }

    fn relatives(assets: &[Asset]) -> Vec<String> {
        assets.iter().map(|a| a.relative.display().to_string()).collect()
    }

    #[test]
    fn literal_pattern_reads_one_file_below_its_parent() {
        let assets = expand_sources(&fixture(), Path::new("."), &["scss/screen.scss".into()]).unwrap();

        assert_eq!(relatives(&assets), vec!["screen.scss"]);
        assert_eq!(assets[0].contents, "@import 'partials/nav';");
    }

    #[test]
    fn single_star_does_not_cross_directories() {
        let assets = expand_sources(&fixture(), Path::new("."), &["scss/*/*.scss".into()]).unwrap();
        assert_eq!(relatives(&assets), vec!["pages/home.scss", "partials/_nav.scss"]);
    }

    #[test]
    fn changing_the_entry_glob_changes_what_is_read() {
        let fs = fixture();
        let one = expand_sources(&fs, Path::new("."), &["scss/*.scss".into()]).unwrap();
        let all = expand_sources(&fs, Path::new("."), &["scss/**/*.scss".into()]).unwrap();

        assert_eq!(relatives(&one), vec!["screen.scss"]);
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn negated_pattern_removes_matches() {
        let patterns = vec!["scss/**/*.scss".to_string(), "!scss/partials/**".to_string()];
        let assets = expand_sources(&fixture(), Path::new("."), &patterns).unwrap();
        assert_eq!(relatives(&assets), vec!["pages/home.scss", "screen.scss"]);
    }

    #[test]
    fn missing_literal_source_is_an_error() {
        let err = expand_sources(&fixture(), Path::new("."), &["src/js/app.js".into()]).unwrap_err();
        assert!(matches!(err, PipelineError::MissingSource(p) if p.ends_with("src/js/app.js")));
    }

    #[test]
    fn empty_glob_is_not_an_error() {
        let assets = expand_sources(&fixture(), Path::new("."), &["less/*.less".into()]).unwrap();
        assert!(assets.is_empty());
    }
}
