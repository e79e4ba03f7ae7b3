#![allow(dead_code)]

use assetpipe::config::{ConfigFile, RawConfigFile, StageConfig, TaskConfig, WatchRuleConfig};
use assetpipe::types::TriggerWhileRunningBehaviour;

/// Builder for `ConfigFile` to simplify test setup.
#[derive(Default)]
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_task(mut self, name: &str, task: TaskConfig) -> Self {
        self.config.task.insert(name.to_string(), task);
        self
    }

    /// Add a `[[watch]]` rule with a single path pattern.
    pub fn with_watch(self, pattern: &str, tasks: &[&str]) -> Self {
        self.with_watch_rule(WatchRuleBuilder::new(pattern, tasks).build())
    }

    pub fn with_watch_rule(mut self, rule: WatchRuleConfig) -> Self {
        self.config.watch.push(rule);
        self
    }

    pub fn with_global_exclude(mut self, pattern: &str) -> Self {
        self.config.default.exclude.push(pattern.to_string());
        self
    }

    pub fn with_default_use_hash(mut self, val: bool) -> Self {
        self.config.default.use_hash = Some(val);
        self
    }

    pub fn with_rerun_dependents(mut self, val: bool) -> Self {
        self.config.config.rerun_dependents = val;
        self
    }

    pub fn with_behaviour(mut self, behaviour: TriggerWhileRunningBehaviour) -> Self {
        self.config.config.triggered_while_running_behaviour = behaviour;
        self
    }

    pub fn with_queue_length(mut self, len: usize) -> Self {
        self.config.config.queue_length = len;
        self
    }

    /// The raw config, for tests that exercise validation failures.
    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

/// Builder for `TaskConfig`.
pub struct TaskConfigBuilder {
    task: TaskConfig,
}

impl TaskConfigBuilder {
    /// A task that runs `sh -c <cmd>`.
    pub fn command(cmd: &str) -> Self {
        Self {
            task: TaskConfig {
                cmd: Some(cmd.to_string()),
                ..TaskConfig::default()
            },
        }
    }

    /// A pipeline over `src`; add stages with [`TaskConfigBuilder::stage`].
    pub fn pipeline(src: &[&str]) -> Self {
        Self {
            task: TaskConfig {
                src: Some(src.iter().map(|s| s.to_string()).collect()),
                ..TaskConfig::default()
            },
        }
    }

    /// A task that broadcasts a full reload.
    pub fn reload() -> Self {
        Self {
            task: TaskConfig {
                reload: true,
                ..TaskConfig::default()
            },
        }
    }

    /// A task with no action of its own.
    pub fn group() -> Self {
        Self {
            task: TaskConfig::default(),
        }
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.task.after.push(dep.to_string());
        self
    }

    pub fn stage(mut self, stage: StageConfig) -> Self {
        self.task.stage.push(stage);
        self
    }

    pub fn build(self) -> TaskConfig {
        self.task
    }
}

/// Builder for one `[[watch]]` rule.
pub struct WatchRuleBuilder {
    rule: WatchRuleConfig,
}

impl WatchRuleBuilder {
    pub fn new(pattern: &str, tasks: &[&str]) -> Self {
        Self {
            rule: WatchRuleConfig {
                paths: vec![pattern.to_string()],
                tasks: tasks.iter().map(|t| t.to_string()).collect(),
                exclude: vec![],
                use_hash: None,
                enable: true,
            },
        }
    }

    pub fn path(mut self, pattern: &str) -> Self {
        self.rule.paths.push(pattern.to_string());
        self
    }

    pub fn exclude(mut self, pattern: &str) -> Self {
        self.rule.exclude.push(pattern.to_string());
        self
    }

    pub fn use_hash(mut self, val: bool) -> Self {
        self.rule.use_hash = Some(val);
        self
    }

    pub fn enable(mut self, val: bool) -> Self {
        self.rule.enable = val;
        self
    }

    pub fn build(self) -> WatchRuleConfig {
        self.rule
    }
}
