// src/config/validate.rs

use globset::Glob;
use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{ConfigFile, RawConfigFile, StageConfig, TaskConfig};
use crate::errors::{AssetpipeError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::AssetpipeError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_tasks(cfg)?;
    validate_global_config(cfg)?;
    validate_task_actions(cfg)?;
    validate_task_dependencies(cfg)?;
    validate_dag(cfg)?;
    validate_watch_rules(cfg)?;
    Ok(())
}

fn config_error(msg: impl Into<String>) -> AssetpipeError {
    AssetpipeError::ConfigError(msg.into())
}

fn ensure_has_tasks(cfg: &RawConfigFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(config_error(
            "config must contain at least one [task.<name>] section",
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    if cfg.config.queue_length == 0 {
        return Err(config_error(
            "[config].queue_length must be >= 1 (got 0)",
        ));
    }

    validate_globs("[default].exclude", &cfg.default.exclude)?;

    Ok(())
}

fn validate_task_actions(cfg: &RawConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        if task.declared_action_count() > 1 {
            return Err(config_error(format!(
                "task '{name}' declares more than one action; use only one of `src`/`stage`, `cmd` or `reload`"
            )));
        }

        if let Some(cmd) = &task.cmd {
            if cmd.trim().is_empty() {
                return Err(config_error(format!("task '{name}' has an empty `cmd`")));
            }
        }

        validate_pipeline(name, task)?;
    }
    Ok(())
}

fn validate_pipeline(name: &str, task: &TaskConfig) -> Result<()> {
    match (&task.src, task.stage.is_empty()) {
        (None, true) => return Ok(()),
        (None, false) => {
            return Err(config_error(format!(
                "task '{name}' has pipeline stages but no `src`"
            )));
        }
        (Some(_), true) => {
            return Err(config_error(format!(
                "task '{name}' has `src` but no [[task.{name}.stage]] entries"
            )));
        }
        (Some(src), false) => {
            if src.is_empty() {
                return Err(config_error(format!("task '{name}' has an empty `src` list")));
            }
            validate_globs(&format!("task '{name}' src"), src)?;
        }
    }

    for (idx, stage) in task.stage.iter().enumerate() {
        let position = idx + 1;
        match stage {
            StageConfig::Command { cmd, .. } if cmd.trim().is_empty() => {
                return Err(config_error(format!(
                    "task '{name}' stage {position} (command) has an empty `cmd`"
                )));
            }
            StageConfig::Dest { dir } if dir.trim().is_empty() => {
                return Err(config_error(format!(
                    "task '{name}' stage {position} (dest) has an empty `dir`"
                )));
            }
            StageConfig::Rename {
                prefix: None,
                suffix: None,
                ext: None,
            } => {
                return Err(config_error(format!(
                    "task '{name}' stage {position} (rename) needs `prefix`, `suffix` or `ext`"
                )));
            }
            StageConfig::Autoprefix { browsers } if browsers.is_empty() => {
                return Err(config_error(format!(
                    "task '{name}' stage {position} (autoprefix) has an empty `browsers` list"
                )));
            }
            _ => {}
        }
    }

    Ok(())
}

fn validate_task_dependencies(cfg: &RawConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        for dep in task.after.iter() {
            if !cfg.task.contains_key(dep) {
                return Err(config_error(format!(
                    "task '{}' has unknown dependency '{}' in `after`",
                    name, dep
                )));
            }
            if dep == name {
                return Err(config_error(format!(
                    "task '{}' cannot depend on itself in `after`",
                    name
                )));
            }
        }
    }
    Ok(())
}

fn validate_dag(cfg: &RawConfigFile) -> Result<()> {
    // Edge direction: dep -> task. For `[task.B] after = ["A"]` we add A -> B.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in cfg.task.keys() {
        graph.add_node(name.as_str());
    }

    for (name, task) in cfg.task.iter() {
        for dep in task.after.iter() {
            graph.add_edge(dep.as_str(), name.as_str(), ());
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => {
            let node = cycle.node_id();
            Err(AssetpipeError::DagCycle(format!(
                "cycle detected in task DAG involving task '{}'",
                node
            )))
        }
    }
}

fn validate_watch_rules(cfg: &RawConfigFile) -> Result<()> {
    validate_globs("[default] exclude", &cfg.default.exclude)?;
    for (idx, rule) in cfg.watch.iter().enumerate() {
        let position = idx + 1;
        if rule.paths.is_empty() {
            return Err(config_error(format!(
                "[[watch]] rule {position} has no `paths`"
            )));
        }
        if rule.tasks.is_empty() {
            return Err(config_error(format!(
                "[[watch]] rule {position} has no `tasks`"
            )));
        }
        for task in rule.tasks.iter() {
            if !cfg.task.contains_key(task) {
                return Err(AssetpipeError::TaskNotFound(format!(
                    "[[watch]] rule {position} names unknown task '{task}'"
                )));
            }
        }
        validate_globs(&format!("[[watch]] rule {position} paths"), &rule.paths)?;
        validate_globs(&format!("[[watch]] rule {position} exclude"), &rule.exclude)?;
    }
    Ok(())
}

fn validate_globs(context: &str, patterns: &[String]) -> Result<()> {
    for pattern in patterns {
        Glob::new(pattern).map_err(|err| {
            config_error(format!("{context}: invalid glob pattern {pattern:?}: {err}"))
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::config::loader::parse_and_validate;
    use crate::errors::AssetpipeError;

    #[test]
    fn rejects_mixed_actions() {
        let err = parse_and_validate(
            r#"
[task.css]
cmd = "sass"
reload = true
"#,
        )
        .unwrap_err();
        assert!(matches!(err, AssetpipeError::ConfigError(msg) if msg.contains("more than one action")));
    }

    #[test]
    fn rejects_stages_without_src() {
        let err = parse_and_validate(
            r#"
[task.css]
[[task.css.stage]]
kind = "minify_css"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, AssetpipeError::ConfigError(msg) if msg.contains("no `src`")));
    }

    #[test]
    fn rejects_watch_rule_for_unknown_task() {
        let err = parse_and_validate(
            r#"
[task.css]
cmd = "true"

[[watch]]
paths = ["scss/*.scss"]
tasks = ["js"]
"#,
        )
        .unwrap_err();
        assert!(matches!(err, AssetpipeError::TaskNotFound(msg) if msg.contains("'js'")));
    }

    #[test]
    fn rejects_invalid_src_glob() {
        let err = parse_and_validate(
            r#"
[task.css]
src = ["scss/[.scss"]
[[task.css.stage]]
kind = "minify_css"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, AssetpipeError::ConfigError(msg) if msg.contains("invalid glob")));
    }

    #[test]
    fn rejects_zero_queue_length() {
        let err = parse_and_validate(
            r#"
[config]
queue_length = 0

[task.a]
cmd = "true"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, AssetpipeError::ConfigError(msg) if msg.contains("queue_length")));
    }

    #[test]
    fn accepts_group_and_reload_tasks() {
        let cfg = parse_and_validate(
            r#"
[task.bs-reload]
reload = true

[task.css]
cmd = "true"

[task.default]
after = ["css", "bs-reload"]
"#,
        )
        .unwrap();
        assert_eq!(cfg.tasks().len(), 3);
    }
}
