// src/errors.rs

//! Crate-wide error aliases and helpers.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssetpipeError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Cycle detected in DAG: {0}")]
    DagCycle(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Failures raised while a pipeline task reads, transforms or writes assets.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("source file not found: {0}")]
    MissingSource(PathBuf),

    #[error("invalid source glob {pattern:?}: {message}")]
    Glob { pattern: String, message: String },

    #[error("stage '{stage}' failed on {file}: {message}")]
    Stage {
        stage: &'static str,
        file: String,
        message: String,
    },
}

impl PipelineError {
    pub fn stage(stage: &'static str, file: impl Into<String>, message: impl ToString) -> Self {
        PipelineError::Stage {
            stage,
            file: file.into(),
            message: message.to_string(),
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, AssetpipeError>;
