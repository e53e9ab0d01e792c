// src/backend/bash.rs

//! Local-process backend: spawns `task.command` with `task.args` directly
//! (no intermediate shell), with `kill_on_drop` and a `tokio::select!`-style
//! deadline race against the task's timeout. Output is captured rather than
//! inherited so assertions can inspect it afterward.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::time::timeout;

use crate::assertions::run_assertions;
use crate::backend::Backend;
use crate::errors::{Result, WorkflowError};
use crate::model::Task;
use crate::types::BackendStatus;

/// Always-available local-process backend.
#[derive(Debug, Default)]
pub struct BashBackend;

impl BashBackend {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Backend for BashBackend {
    async fn run(&self, task: &mut Task) -> Result<()> {
        let command = task.command.clone();
        let args = task.args.clone();
        run_process(task, &command, &args, task.timeout).await
    }

    fn validate(&self, _task: &Task) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "bash"
    }

    fn status(&self) -> BackendStatus {
        BackendStatus::Available
    }
}

/// Shared process execution: spawn `program args…`, race it against
/// `deadline`, capture combined stdout+stderr, compute `exit_code`, and run
/// assertions. Used directly by [`BashBackend`] and, with a `docker`/
/// `kubectl` wrapper command built around the task, by the container and
/// cluster backends.
pub(crate) async fn run_process(
    task: &mut Task,
    program: &str,
    args: &[String],
    deadline: Duration,
) -> Result<()> {
    let mut cmd = Command::new(program);
    cmd.args(args);
    cmd.envs(task.env_map.iter().map(|(k, v)| (k.clone(), v.clone())));
    if let Some(dir) = task.working_dir.as_deref() {
        if !dir.is_empty() {
            cmd.current_dir(dir);
        }
    }
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());
    cmd.kill_on_drop(true);

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => {
            task.exit_code = -1;
            task.error = format!("failed to spawn '{program}': {e}");
            return Err(WorkflowError::Other(anyhow::anyhow!(task.error.clone())));
        }
    };

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let stdout_handle = tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Some(mut s) = stdout {
            let _ = s.read_to_end(&mut buf).await;
        }
        buf
    });
    let stderr_handle = tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Some(mut s) = stderr {
            let _ = s.read_to_end(&mut buf).await;
        }
        buf
    });

    let wait_result = timeout(deadline, child.wait()).await;

    // On expiry, kill the child *before* draining stdout/stderr: a process
    // that holds its pipes open past the deadline (`sleep infinity`, a
    // daemon, a grandchild that inherited the fds) would otherwise make
    // `read_to_end` block forever, so the readers never finish and the
    // child is never dropped to let `kill_on_drop` fire.
    if wait_result.is_err() {
        let _ = child.kill().await;
    }

    let out_bytes = stdout_handle.await.unwrap_or_default();
    let err_bytes = stderr_handle.await.unwrap_or_default();
    let mut combined = String::from_utf8_lossy(&out_bytes).into_owned();
    combined.push_str(&String::from_utf8_lossy(&err_bytes));
    task.output = combined;

    match wait_result {
        Ok(Ok(status)) => {
            task.exit_code = status.code().unwrap_or(-1);
            if !status.success() {
                task.error = format!("command exited with status {}", task.exit_code);
                return Err(WorkflowError::Other(anyhow::anyhow!(task.error.clone())));
            }
        }
        Ok(Err(e)) => {
            task.exit_code = -1;
            task.error = format!("error waiting for process: {e}");
            return Err(WorkflowError::Other(anyhow::anyhow!(task.error.clone())));
        }
        Err(_elapsed) => {
            task.exit_code = -1;
            task.error = format!("timed out after {}", humantime::format_duration(deadline));
            return Err(WorkflowError::Other(anyhow::anyhow!(task.error.clone())));
        }
    }

    if let Some(msg) = run_assertions(task) {
        task.error = msg.clone();
        return Err(WorkflowError::Other(anyhow::anyhow!(msg)));
    }

    Ok(())
}
