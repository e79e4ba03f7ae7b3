// src/exec/command.rs

//! Shell command tasks (`cmd = "..."`).

use std::path::Path;
use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info};

use crate::engine::TaskOutcome;

/// Run `cmd` through the platform shell in `cwd`.
///
/// Stdout lines are echoed as `[task] line`; stderr goes to the debug log.
/// Spawn and wait failures are errors; a non-zero exit is a failed outcome.
pub async fn run_command(task: &str, cmd: &str, cwd: &Path) -> Result<TaskOutcome> {
    info!(task, cmd, "starting command");

    let mut command = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(cmd);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(cmd);
        c
    };

    command
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = command
        .spawn()
        .with_context(|| format!("spawning command for task '{task}'"))?;

    let stdout_echo = child.stdout.take().map(|stdout| {
        let task = task.to_string();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                println!("[{task}] {line}");
            }
        })
    });

    let stderr_log = child.stderr.take().map(|stderr| {
        let task = task.to_string();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!(task = %task, "stderr: {}", line);
            }
        })
    });

    let status = child
        .wait()
        .await
        .with_context(|| format!("waiting for command of task '{task}'"))?;

    // Drain the pipes so every line is echoed before completion is reported.
    for reader in [stdout_echo, stderr_log].into_iter().flatten() {
        let _ = reader.await;
    }

    let code = status.code().unwrap_or(-1);
    info!(task, exit_code = code, success = status.success(), "command exited");

    Ok(if status.success() {
        TaskOutcome::Success
    } else {
        TaskOutcome::Failed(code)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn exit_status_maps_to_outcome() {
        let cwd = Path::new(".");
        assert_eq!(run_command("ok", "true", cwd).await.unwrap(), TaskOutcome::Success);
        assert_eq!(run_command("bad", "exit 3", cwd).await.unwrap(), TaskOutcome::Failed(3));
    }

    #[tokio::test]
    async fn runs_in_the_given_directory() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = run_command("touch", "touch marker", dir.path()).await.unwrap();

        assert_eq!(outcome, TaskOutcome::Success);
        assert!(dir.path().join("marker").exists());
    }
}
