// src/watch/patterns.rs

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use crate::config::model::ConfigFile;
use crate::engine::TaskName;
use crate::fs::FileSystem;

/// A compiled `[[watch]]` rule.
///
/// Patterns are relative to the config directory; the watcher passes
/// relative paths (e.g. `"scss/screen.scss"`) into [`WatchProfile::matches`].
#[derive(Clone)]
pub struct WatchProfile {
    /// Position of the rule in the config, used as its identity.
    index: usize,
    tasks: Vec<TaskName>,
    watch_set: GlobSet,
    exclude_set: Option<GlobSet>,
    use_hash: bool,
}

impl fmt::Debug for WatchProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchProfile")
            .field("index", &self.index)
            .field("tasks", &self.tasks)
            .field("use_hash", &self.use_hash)
            .finish_non_exhaustive()
    }
}

impl WatchProfile {
    /// Compile a rule from raw pattern lists.
    pub fn new(
        index: usize,
        watch: &[String],
        exclude: &[String],
        tasks: Vec<TaskName>,
        use_hash: bool,
    ) -> Result<Self> {
        let watch_set = build_globset(watch)
            .with_context(|| format!("building watch globset for rule #{index}"))?;

        let exclude_set = if exclude.is_empty() {
            None
        } else {
            Some(
                build_globset(exclude)
                    .with_context(|| format!("building exclude globset for rule #{index}"))?,
            )
        };

        Ok(Self {
            index,
            tasks,
            watch_set,
            exclude_set,
            use_hash,
        })
    }

    /// Stable key for this rule, used by the hash store.
    pub fn key(&self) -> String {
        format!("watch#{}", self.index)
    }

    /// Tasks triggered when a matching path changes.
    pub fn tasks(&self) -> &[TaskName] {
        &self.tasks
    }

    /// Whether this rule only triggers on content changes (`use_hash = true`).
    pub fn use_hash(&self) -> bool {
        self.use_hash
    }

    /// Returns true if the given path (relative to the config directory)
    /// matches the watch set and not the exclude set.
    pub fn matches(&self, rel_path: &str) -> bool {
        if !self.watch_set.is_match(rel_path) {
            return false;
        }
        if let Some(exclude) = &self.exclude_set {
            if exclude.is_match(rel_path) {
                return false;
            }
        }
        true
    }
}

/// Compile every enabled `[[watch]]` rule of a validated config.
///
/// `[default].exclude` is appended to each rule's own excludes, and
/// `[default].use_hash` fills in rules that leave `use_hash` unset.
pub fn build_rule_profiles(cfg: &ConfigFile) -> Result<Vec<WatchProfile>> {
    let defaults = cfg.default_section();
    let default_use_hash = defaults.use_hash.unwrap_or(false);

    cfg.watch
        .iter()
        .enumerate()
        .filter(|(_, rule)| rule.enable)
        .map(|(index, rule)| {
            let mut exclude = rule.exclude.clone();
            exclude.extend(defaults.exclude.iter().cloned());

            WatchProfile::new(
                index,
                &rule.paths,
                &exclude,
                rule.tasks.clone(),
                rule.effective_use_hash(default_use_hash),
            )
        })
        .collect()
}

/// `*` stops at `/`, the same as in task `src` globs; `**` spans directories.
fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = GlobBuilder::new(pat)
            .literal_separator(true)
            .build()
            .with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

/// Collect all files under `root` that match the rule's watch/exclude
/// patterns, sorted by path.
///
/// Used when computing aggregated hashes for `use_hash = true` rules.
pub fn collect_matching_files(
    fs: &dyn FileSystem,
    root: &Path,
    profile: &WatchProfile,
) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        for path in fs.read_dir(&dir)? {
            if fs.is_dir(&path) {
                stack.push(path);
            } else if fs.is_file(&path) {
                if let Ok(rel) = path.strip_prefix(root) {
                    let rel_str = rel.to_string_lossy().replace('\\', "/");
                    if profile.matches(&rel_str) {
                        files.push(path);
                    }
                }
            }
        }
    }

    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_and_validate;
    use crate::fs::mock::MockFileSystem;

    const CONFIG: &str = r#"
[default]
exclude = ["**/*.tmp"]

[task.css]
cmd = "true"
[task.reload]
reload = true
[task.js]
cmd = "true"

[[watch]]
paths = ["scss/**/*.scss"]
tasks = ["css"]

[[watch]]
paths = ["**/*.html", "**/*.php"]
exclude = ["vendor/**"]
tasks = ["reload"]
use_hash = true

[[watch]]
paths = ["src/js/*.js"]
tasks = ["js"]
enable = false
"#;

    #[test]
    fn rules_compile_with_default_excludes() {
        let cfg = parse_and_validate(CONFIG).unwrap();
        let profiles = build_rule_profiles(&cfg).unwrap();

        assert_eq!(profiles.len(), 2, "disabled rule is skipped");

        let css = &profiles[0];
        assert!(css.matches("scss/partials/_nav.scss"));
        assert!(!css.matches("templates/index.html"));
        assert!(!css.matches("scss/broken.tmp"));
        assert!(!css.use_hash());

        let reload = &profiles[1];
        assert!(reload.matches("templates/index.html"));
        assert!(reload.matches("page.php"));
        assert!(!reload.matches("vendor/lib/index.html"));
        assert!(reload.use_hash());
        assert_eq!(reload.tasks(), ["reload".to_string()]);
    }

    #[test]
    fn single_star_stays_within_one_directory() {
        let profile = WatchProfile::new(
            0,
            &["scss/*/*.scss".to_string()],
            &["scss/*/_draft*.scss".to_string()],
            vec!["css".to_string()],
            false,
        )
        .unwrap();

        assert!(profile.matches("scss/partials/_nav.scss"));
        assert!(!profile.matches("scss/screen.scss"));
        assert!(!profile.matches("scss/a/b/c.scss"));
        assert!(!profile.matches("scss/partials/_draft_nav.scss"));
    }

    #[test]
    fn collect_matching_files_walks_the_tree_sorted() {
        let fs = MockFileSystem::new();
        fs.add_file("scss/b.scss", "b{}");
        fs.add_file("scss/nested/a.scss", "a{}");
        fs.add_file("scss/readme.md", "");

        let profile = WatchProfile::new(0, &["scss/**/*.scss".to_string()], &[], vec![], true).unwrap();
        let files = collect_matching_files(&fs, Path::new("."), &profile).unwrap();

        let rel: Vec<String> = files
            .iter()
            .map(|p| p.strip_prefix(".").unwrap_or(p).to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(rel, vec!["scss/b.scss", "scss/nested/a.scss"]);
    }
}
