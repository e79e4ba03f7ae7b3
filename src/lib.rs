// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod pipeline;
pub mod reload;
pub mod types;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::loader::{default_config_path, find_config, load_and_validate};
use crate::config::model::{ConfigFile, StageConfig, TaskAction};
use crate::dag::{DagGraph, Scheduler};
use crate::engine::{CoreRuntime, Runtime, RuntimeEvent, RuntimeOptions, TriggerReason};
use crate::errors::AssetpipeError;
use crate::exec::RealExecutorBackend;
use crate::fs::{FileSystem, RealFileSystem};
use crate::pipeline::{build_stages, BannerContext, PackageInfo, PipelineEnv};
use crate::reload::{client_snippet, NoopReload, ReloadServer, ReloadSink};
use crate::watch::{build_rule_profiles, dep_map_from_graph, spawn_watcher, DepMap};

/// Load the config, start the reload server and watcher unless `--once`,
/// trigger the selected tasks and drive the runtime until it stops.
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = match &args.config {
        Some(path) => PathBuf::from(path),
        None => {
            let cwd = std::env::current_dir().context("reading the current directory")?;
            find_config(&cwd).unwrap_or_else(default_config_path)
        }
    };
    debug!(config = ?config_path, "using config file");
    let cfg = load_and_validate(&config_path)?;

    if args.print_snippet {
        println!("{}", client_snippet(cfg.reload.port));
        return Ok(());
    }

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let targets = select_targets(&cfg, &args.tasks)?;
    prebuild_stages(&cfg)?;

    let root = config_root_dir(&config_path);
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);

    let package = PackageInfo::load(fs.as_ref(), &root, &cfg.package)?;
    let banner = BannerContext::new(package, cfg.banner.template.clone());

    let reload: Arc<dyn ReloadSink> = if cfg.reload.enable && !args.once {
        let server = ReloadServer::start(cfg.reload.port)?;
        info!(port = server.port(), "add the reload client with --print-snippet");
        Arc::new(server)
    } else {
        Arc::new(NoopReload)
    };

    let env = Arc::new(PipelineEnv {
        root: root.clone(),
        fs,
        banner: Arc::new(banner),
        reload,
    });

    let scheduler = Scheduler::from_config(&cfg);
    let behaviour = args
        .on_busy
        .unwrap_or(cfg.config.triggered_while_running_behaviour);
    let queue_length = cfg.config.queue_length;

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);

    let executor = RealExecutorBackend::new(rt_tx.clone(), env);

    // Optional file watcher (disabled in --once mode).
    let _watcher_handle = if !args.once {
        let profiles = build_rule_profiles(&cfg)?;
        // Without `rerun_dependents` a dependent is only rebuilt when it is
        // triggered itself, so the ancestor filter must not drop it.
        let dep_map = if cfg.config.rerun_dependents {
            dep_map_from_graph(&DagGraph::from_config(&cfg))
        } else {
            DepMap::new()
        };
        Some(spawn_watcher(
            root,
            profiles,
            dep_map,
            rt_tx.clone(),
            Duration::from_millis(cfg.config.debounce_ms),
        )?)
    } else {
        None
    };

    // Ctrl-C → graceful shutdown.
    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        });
    }

    info!(?targets, "initial tasks to trigger at startup");
    for task in targets {
        rt_tx
            .send(RuntimeEvent::TaskTriggered {
                task,
                reason: TriggerReason::Manual,
            })
            .await
            .context("runtime channel closed before startup")?;
    }

    let options = RuntimeOptions {
        exit_when_idle: args.once,
    };

    let core = CoreRuntime::new(scheduler, behaviour, queue_length, options);
    let runtime = Runtime::new(core, rt_rx, executor);
    runtime.run().await?;
    Ok(())
}

/// Tasks to trigger at startup.
///
/// Named tasks must exist; with none named, `default` runs if defined,
/// otherwise every task without prerequisites.
pub fn select_targets(cfg: &ConfigFile, requested: &[String]) -> Result<Vec<String>, AssetpipeError> {
    if !requested.is_empty() {
        if let Some(unknown) = requested.iter().find(|t| !cfg.task.contains_key(*t)) {
            return Err(AssetpipeError::TaskNotFound(unknown.clone()));
        }
        return Ok(requested.to_vec());
    }

    if cfg.task.contains_key("default") {
        return Ok(vec!["default".to_string()]);
    }

    Ok(DagGraph::from_config(cfg).roots())
}

/// Build every pipeline's stages once so bad stage options fail at startup
/// instead of on the first run.
fn prebuild_stages(cfg: &ConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        if let TaskAction::Pipeline { stages, .. } = task.action() {
            build_stages(&stages).with_context(|| format!("building stages of task '{name}'"))?;
        }
    }
    Ok(())
}

/// Figure out the project root: the directory holding the config file.
///
/// A bare filename like "Assetpipe.toml" (parent = "") falls back to the
/// current working directory.
fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

/// Dry-run output: tasks with their actions and stages, then watch rules.
fn print_dry_run(cfg: &ConfigFile) {
    println!("assetpipe dry-run");
    println!(
        "  config.triggered_while_running_behaviour = {}",
        cfg.config.triggered_while_running_behaviour
    );
    println!("  config.queue_length = {}", cfg.config.queue_length);
    println!("  config.rerun_dependents = {}", cfg.config.rerun_dependents);
    println!();

    println!("tasks ({}):", cfg.task.len());
    for (name, task) in cfg.task.iter() {
        let action = task.action();
        println!("  - {name} ({})", action.label());
        if !task.after.is_empty() {
            println!("      after: {:?}", task.after);
        }
        match action {
            TaskAction::Pipeline { src, stages } => {
                println!("      src: {src:?}");
                for stage in &stages {
                    println!("      | {}", describe_stage(stage));
                }
            }
            TaskAction::Command { cmd } => println!("      cmd: {cmd}"),
            TaskAction::Reload | TaskAction::Group => {}
        }
    }
    println!();

    println!("watch ({}):", cfg.watch.len());
    for rule in cfg.watch.iter() {
        let state = if rule.enable { "" } else { " (disabled)" };
        println!("  - {:?} -> {:?}{state}", rule.paths, rule.tasks);
        if !rule.exclude.is_empty() {
            println!("      exclude: {:?}", rule.exclude);
        }
        if let Some(use_hash) = rule.use_hash {
            println!("      use_hash: {use_hash}");
        }
    }

    debug!("dry-run complete (no execution)");
}

fn describe_stage(stage: &StageConfig) -> String {
    match stage {
        StageConfig::Command { cmd, ext: Some(ext) } => format!("command `{cmd}` -> .{ext}"),
        StageConfig::Command { cmd, ext: None } => format!("command `{cmd}`"),
        StageConfig::Autoprefix { browsers } => format!("autoprefix {browsers:?}"),
        StageConfig::MinifyCss { browsers } if !browsers.is_empty() => {
            format!("minify_css {browsers:?}")
        }
        StageConfig::Dest { dir } => format!("dest {dir}"),
        StageConfig::Rename { prefix, suffix, ext } => format!(
            "rename prefix={} suffix={} ext={}",
            prefix.as_deref().unwrap_or("-"),
            suffix.as_deref().unwrap_or("-"),
            ext.as_deref().unwrap_or("-"),
        ),
        StageConfig::LintJs { fail_on_error: true } => "lint_js (fail on error)".to_string(),
        StageConfig::Reload { once: true } => "reload (once)".to_string(),
        other => other.kind().to_string(),
    }
}
