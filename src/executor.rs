// src/executor.rs

//! Task executor: defaulting, backend resolution, validation, and the
//! retry loop around a single task's attempts.
//!
//! Each task gets up to `retries + 1` attempts, sleeping `retry_delay`
//! between them, before the executor gives up and returns a `Result`.

use std::time::Duration;

use once_cell::sync::Lazy;
use tracing::{debug, warn};

use crate::backend::registry::BackendRegistry;
use crate::errors::{Result, WorkflowError};
use crate::model::Task;

/// Default per-task timeout, 30s unless overridden by `IAPETUS_TASK_TIMEOUT`
/// at process start.
pub static DEFAULT_TASK_TIMEOUT: Lazy<Duration> = Lazy::new(|| {
    std::env::var("IAPETUS_TASK_TIMEOUT")
        .ok()
        .and_then(|s| humantime::parse_duration(&s).ok())
        .unwrap_or(Duration::from_secs(30))
});

const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);
const DEFAULT_BACKEND: &str = "bash";

/// Apply idempotent defaults to a task's execution-relevant fields,
/// rejecting an empty command.
fn apply_defaults(task: &mut Task) -> Result<()> {
    if task.command.is_empty() {
        return Err(WorkflowError::Config(format!(
            "task '{}' has an empty command",
            task.name
        )));
    }
    if task.timeout == Duration::ZERO {
        task.timeout = *DEFAULT_TASK_TIMEOUT;
    }
    if task.retries == 0 {
        task.retries = 1;
    }
    if task.retry_delay == Duration::ZERO {
        task.retry_delay = DEFAULT_RETRY_DELAY;
    }
    if task.backend.is_empty() {
        task.backend = DEFAULT_BACKEND.to_string();
    }
    Ok(())
}

/// Run `task` to completion against the process-wide backend registry,
/// applying defaults, resolving and validating the backend, then retrying
/// up to `task.retries` attempts.
pub async fn run(registry: &BackendRegistry, task: &mut Task) -> Result<()> {
    apply_defaults(task)?;

    let backend = registry
        .lookup(&task.backend)
        .ok_or_else(|| WorkflowError::BackendNotFound(task.backend.clone()))?;

    backend.validate(task)?;

    let attempts = task.retries;
    let mut last_err: Option<WorkflowError> = None;

    for attempt in 1..=attempts {
        debug!(task = %task.name, attempt, attempts, "running task attempt");
        match backend.run(task).await {
            Ok(()) => return Ok(()),
            Err(e) => {
                warn!(task = %task.name, attempt, attempts, error = %e, "task attempt failed");
                last_err = Some(e);
                if attempt < attempts {
                    tokio::time::sleep(task.retry_delay).await;
                }
            }
        }
    }

    let inner = last_err
        .map(|e| e.to_string())
        .unwrap_or_else(|| "unknown error".to_string());
    Err(WorkflowError::Execution {
        task: task.name.clone(),
        attempts,
        inner,
    })
}
