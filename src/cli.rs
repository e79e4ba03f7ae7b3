// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

use crate::types::TriggerWhileRunningBehaviour;

/// Command-line arguments for `assetpipe`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "assetpipe",
    version,
    about = "Run asset pipelines by name and re-run them when watched files change.",
    long_about = None
)]
pub struct CliArgs {
    /// Tasks to run.
    ///
    /// When omitted, the task named `default` runs if it exists; otherwise
    /// every task without prerequisites runs.
    #[arg(value_name = "TASK")]
    pub tasks: Vec<String>,

    /// Path to the config file (TOML).
    ///
    /// Defaults to the nearest `Assetpipe.toml` in the current directory or
    /// one of its parents.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Run the requested tasks once and exit; no watching, no reload server.
    #[arg(long)]
    pub once: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `ASSETPIPE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// What a trigger does while its task is already running; overrides
    /// `[config] triggered_while_running_behaviour`.
    #[arg(long, value_enum, value_name = "MODE")]
    pub on_busy: Option<TriggerWhileRunningBehaviour>,

    /// Parse + validate, print tasks and watch rules, but don't execute anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Print the `<script>` tag browsers need to connect to the reload server.
    #[arg(long)]
    pub print_snippet: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
