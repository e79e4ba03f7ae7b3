// src/pipeline/stages/command.rs

use std::io::Write;
use std::process::{Command, Stdio};
use std::thread;

use tracing::debug;

use crate::errors::PipelineError;
use crate::pipeline::asset::Asset;
use crate::pipeline::context::StageContext;

use super::{map_contents, Stage};

/// Pipe each asset through `sh -c <cmd>`: contents on stdin, new contents
/// from stdout. Runs in the pipeline root.
///
/// This is how preprocessors without a Rust implementation (`sass --stdin`,
/// `coffee -sc`) plug into a pipeline.
#[derive(Debug, Clone)]
pub struct CommandStage {
    cmd: String,
    ext: Option<String>,
}

impl CommandStage {
    pub fn new(cmd: String, ext: Option<String>) -> Self {
        Self { cmd, ext }
    }
}

impl Stage for CommandStage {
    fn name(&self) -> &'static str {
        "command"
    }

    fn apply(&self, assets: Vec<Asset>, ctx: &StageContext<'_>) -> Result<Vec<Asset>, PipelineError> {
        let mut out = map_contents(self.name(), assets, |asset| {
            debug!(task = ctx.task, file = %asset.display_name(), cmd = %self.cmd, "piping asset through command");
            pipe_through(&self.cmd, ctx, asset)
        })?;

        if let Some(ext) = &self.ext {
            for asset in &mut out {
                asset.set_extension(ext);
            }
        }
        Ok(out)
    }
}

fn pipe_through(cmd: &str, ctx: &StageContext<'_>, asset: &Asset) -> Result<String, String> {
    let mut child = Command::new("sh")
        .arg("-c")
        .arg(cmd)
        .current_dir(ctx.root())
        .env("ASSETPIPE_FILE", asset.path())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| format!("failed to spawn `{cmd}`: {e}"))?;

    // Feed stdin from a separate thread so a command that writes before it
    // has read everything cannot deadlock against us.
    let writer = child.stdin.take().map(|mut stdin| {
        let input = asset.contents.clone().into_bytes();
        thread::spawn(move || stdin.write_all(&input))
    });

    let output = child
        .wait_with_output()
        .map_err(|e| format!("failed to wait for `{cmd}`: {e}"))?;

    if let Some(writer) = writer {
        match writer.join() {
            Ok(Ok(())) => {}
            // A command that exits without reading stdin closes the pipe.
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
            Ok(Err(e)) => return Err(format!("failed to write stdin of `{cmd}`: {e}")),
            Err(_) => return Err(format!("stdin writer for `{cmd}` panicked")),
        }
    }

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!(
            "`{cmd}` exited with {}: {}",
            output.status,
            stderr.trim()
        ));
    }

    String::from_utf8(output.stdout).map_err(|e| format!("`{cmd}` wrote invalid UTF-8: {e}"))
}
