// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::types::TriggerWhileRunningBehaviour;

/// Top-level configuration as read from a TOML file, before validation.
///
/// ```toml
/// [config]
/// queue_length = 1
///
/// [package]
/// file = "package.json"
///
/// [task.css]
/// src = ["scss/screen.scss"]
/// [[task.css.stage]]
/// kind = "command"
/// cmd = "sass --stdin"
/// ext = "css"
/// [[task.css.stage]]
/// kind = "dest"
/// dir = "static/css"
///
/// [task.default]
/// after = ["css"]
///
/// [[watch]]
/// paths = ["scss/**/*.scss"]
/// tasks = ["css"]
/// ```
///
/// All sections are optional and have reasonable defaults; validation
/// (see [`crate::config::validate`]) turns this into a [`ConfigFile`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    #[serde(default)]
    pub default: DefaultSection,

    #[serde(default)]
    pub package: PackageSection,

    #[serde(default)]
    pub banner: BannerSection,

    #[serde(default)]
    pub reload: ReloadSection,

    /// All tasks from `[task.<name>]`, keyed by task name.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,

    /// All `[[watch]]` trigger rules, in declaration order.
    #[serde(default)]
    pub watch: Vec<WatchRuleConfig>,
}

/// A validated configuration.
///
/// Only constructible through `TryFrom<RawConfigFile>`, so holders can rely
/// on: at least one task, known `after` references, an acyclic DAG, one
/// action per task and watch rules that name existing tasks.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub default: DefaultSection,
    pub package: PackageSection,
    pub banner: BannerSection,
    pub reload: ReloadSection,
    pub task: BTreeMap<String, TaskConfig>,
    pub watch: Vec<WatchRuleConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            config: raw.config,
            default: raw.default,
            package: raw.package,
            banner: raw.banner,
            reload: raw.reload,
            task: raw.task,
            watch: raw.watch,
        }
    }

    pub fn tasks(&self) -> &BTreeMap<String, TaskConfig> {
        &self.task
    }

    pub fn default_section(&self) -> &DefaultSection {
        &self.default
    }
}

/// `[config]` section: runtime behaviour.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// `"queue"` (default) or `"cancel"`.
    #[serde(default)]
    pub triggered_while_running_behaviour: TriggerWhileRunningBehaviour,

    /// How many follow-up runs queue mode may line up. A task triggered
    /// again while it is already queued opens a new run until this many
    /// are waiting.
    #[serde(default = "default_queue_length")]
    pub queue_length: usize,

    /// Quiet period the watcher waits for before flushing changed paths.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// If true, triggering a task also re-runs every task downstream of it.
    #[serde(default)]
    pub rerun_dependents: bool,
}

fn default_queue_length() -> usize {
    1
}

fn default_debounce_ms() -> u64 {
    100
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            triggered_while_running_behaviour: TriggerWhileRunningBehaviour::default(),
            queue_length: default_queue_length(),
            debounce_ms: default_debounce_ms(),
            rerun_dependents: false,
        }
    }
}

/// `[default]` section: defaults shared by all watch rules.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct DefaultSection {
    /// Exclude patterns appended to every watch rule.
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Default `use_hash` behaviour; if `None`, the global default is `false`.
    #[serde(default)]
    pub use_hash: Option<bool>,
}

/// `[package]` section: metadata rendered into banners.
///
/// Inline fields win over the ones read from `file`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct PackageSection {
    /// Optional `package.json`-style file, relative to the config directory.
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub license: Option<String>,
}

/// `[banner]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct BannerSection {
    /// Banner template; `None` uses the built-in template.
    #[serde(default)]
    pub template: Option<String>,
}

/// `[reload]` section: live-reload server.
#[derive(Debug, Clone, Deserialize)]
pub struct ReloadSection {
    #[serde(default)]
    pub enable: bool,

    /// First port to try; successive ports are tried if it is taken.
    #[serde(default = "default_reload_port")]
    pub port: u16,
}

fn default_reload_port() -> u16 {
    35729
}

impl Default for ReloadSection {
    fn default() -> Self {
        Self {
            enable: false,
            port: default_reload_port(),
        }
    }
}

/// `[task.<name>]` section.
///
/// A task has at most one action: a pipeline (`src` + `stage`), a shell
/// command (`cmd`) or a reload broadcast (`reload = true`). A task with none
/// of these only groups its `after` prerequisites.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TaskConfig {
    /// Prerequisites: this task waits for all tasks listed here.
    #[serde(default)]
    pub after: Vec<String>,

    /// Source globs, relative to the config directory.
    #[serde(default)]
    pub src: Option<Vec<String>>,

    /// Ordered pipeline stages (`[[task.<name>.stage]]`).
    #[serde(default)]
    pub stage: Vec<StageConfig>,

    /// Shell command to run.
    #[serde(default)]
    pub cmd: Option<String>,

    /// Push a full reload to connected browsers.
    #[serde(default)]
    pub reload: bool,
}

impl TaskConfig {
    /// The action this task performs.
    ///
    /// Conflicting fields are rejected during validation; on an unvalidated
    /// config the first of pipeline, command, reload wins.
    pub fn action(&self) -> TaskAction {
        if let Some(src) = &self.src {
            return TaskAction::Pipeline {
                src: src.clone(),
                stages: self.stage.clone(),
            };
        }
        if let Some(cmd) = &self.cmd {
            return TaskAction::Command { cmd: cmd.clone() };
        }
        if self.reload {
            return TaskAction::Reload;
        }
        TaskAction::Group
    }

    /// Number of action kinds configured on this task.
    pub(crate) fn declared_action_count(&self) -> usize {
        [
            self.src.is_some() || !self.stage.is_empty(),
            self.cmd.is_some(),
            self.reload,
        ]
        .into_iter()
        .filter(|declared| *declared)
        .count()
    }
}

/// What a task does once its prerequisites are satisfied.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskAction {
    Pipeline {
        src: Vec<String>,
        stages: Vec<StageConfig>,
    },
    Command {
        cmd: String,
    },
    Reload,
    Group,
}

impl TaskAction {
    pub fn label(&self) -> &'static str {
        match self {
            TaskAction::Pipeline { .. } => "pipeline",
            TaskAction::Command { .. } => "command",
            TaskAction::Reload => "reload",
            TaskAction::Group => "group",
        }
    }
}

/// One `[[task.<name>.stage]]` entry.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StageConfig {
    /// Pipe contents through `sh -c <cmd>` (stdin to stdout).
    Command {
        cmd: String,
        #[serde(default)]
        ext: Option<String>,
    },
    /// Add vendor prefixes for the given browserslist queries.
    Autoprefix {
        #[serde(default = "default_browsers")]
        browsers: Vec<String>,
    },
    MinifyCss {
        #[serde(default)]
        browsers: Vec<String>,
    },
    /// Report oxc syntax and semantic diagnostics (parse errors, duplicate
    /// declarations and the like). There are no style rules and no
    /// `.jshintrc` is read.
    LintJs {
        #[serde(default)]
        fail_on_error: bool,
    },
    MinifyJs,
    Banner {
        #[serde(default)]
        template: Option<String>,
    },
    Rename {
        #[serde(default)]
        prefix: Option<String>,
        #[serde(default)]
        suffix: Option<String>,
        #[serde(default)]
        ext: Option<String>,
    },
    Dest {
        dir: String,
    },
    Reload {
        #[serde(default)]
        once: bool,
    },
}

fn default_browsers() -> Vec<String> {
    vec!["defaults".to_string()]
}

impl StageConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            StageConfig::Command { .. } => "command",
            StageConfig::Autoprefix { .. } => "autoprefix",
            StageConfig::MinifyCss { .. } => "minify_css",
            StageConfig::LintJs { .. } => "lint_js",
            StageConfig::MinifyJs => "minify_js",
            StageConfig::Banner { .. } => "banner",
            StageConfig::Rename { .. } => "rename",
            StageConfig::Dest { .. } => "dest",
            StageConfig::Reload { .. } => "reload",
        }
    }
}

/// One `[[watch]]` trigger rule.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchRuleConfig {
    /// Globs relative to the config directory.
    pub paths: Vec<String>,

    /// Tasks to trigger when a matching path changes.
    pub tasks: Vec<String>,

    /// Rule-local excludes; `[default].exclude` is always appended.
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Only trigger when the aggregated content of matched files changes.
    #[serde(default)]
    pub use_hash: Option<bool>,

    #[serde(default = "default_enable")]
    pub enable: bool,
}

fn default_enable() -> bool {
    true
}

impl WatchRuleConfig {
    pub fn effective_use_hash(&self, default_use_hash: bool) -> bool {
        self.use_hash.unwrap_or(default_use_hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_tables_deserialize_by_kind() {
        let raw: RawConfigFile = toml::from_str(
            r#"
[task.js]
src = ["src/js/scripts.js"]

[[task.js.stage]]
kind = "lint_js"

[[task.js.stage]]
kind = "minify_js"

[[task.js.stage]]
kind = "rename"
suffix = ".min"
"#,
        )
        .unwrap();

        let task = &raw.task["js"];
        assert_eq!(
            task.stage,
            vec![
                StageConfig::LintJs { fail_on_error: false },
                StageConfig::MinifyJs,
                StageConfig::Rename {
                    prefix: None,
                    suffix: Some(".min".to_string()),
                    ext: None
                },
            ]
        );
        assert_eq!(task.action().label(), "pipeline");
    }

    #[test]
    fn task_without_action_is_a_group() {
        let task = TaskConfig {
            after: vec!["css".to_string()],
            ..TaskConfig::default()
        };
        assert_eq!(task.action(), TaskAction::Group);
        assert_eq!(task.declared_action_count(), 0);
    }

    #[test]
    fn watch_rules_default_to_enabled() {
        let raw: RawConfigFile = toml::from_str(
            r#"
[[watch]]
paths = ["a/*.txt"]
tasks = ["a"]

[[watch]]
paths = ["b/*.txt"]
tasks = ["b"]
enable = false
"#,
        )
        .unwrap();
        assert!(raw.watch[0].enable);
        assert!(!raw.watch[1].enable);
    }
}
