// src/backend/container.rs

//! Container backend: runs a task inside `docker run --rm <image> …`.
//!
//! Availability is probed with `which`, the same PATH-binary-probing crate
//! several tools in this corpus reach for instead of hand-rolling a PATH
//! walk. Process launching itself reuses [`bash::run_process`], which is the
//! same deadline/capture/assertion plumbing [`crate::backend::bash`] uses
//! for the local backend.

use async_trait::async_trait;

use crate::backend::bash::run_process;
use crate::backend::Backend;
use crate::errors::{Result, WorkflowError};
use crate::model::Task;
use crate::types::BackendStatus;

/// Backend that shells out to `docker run --rm <image> <command> <args…>`.
pub struct ContainerBackend {
    available: bool,
}

impl ContainerBackend {
    pub fn new() -> Self {
        Self {
            available: which::which("docker").is_ok(),
        }
    }
}

impl Default for ContainerBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backend for ContainerBackend {
    async fn run(&self, task: &mut Task) -> Result<()> {
        self.validate(task)?;

        let image = task.image.clone().unwrap_or_default();
        let mut args = vec!["run".to_string(), "--rm".to_string()];
        for (key, value) in task.env_map.iter() {
            args.push("-e".to_string());
            args.push(format!("{key}={value}"));
        }
        if let Some(dir) = task.working_dir.as_deref() {
            if !dir.is_empty() {
                args.push("-w".to_string());
                args.push(dir.to_string());
            }
        }
        args.push(image);
        args.push(task.command.clone());
        args.extend(task.args.iter().cloned());

        run_process(task, "docker", &args, task.timeout).await
    }

    fn validate(&self, task: &Task) -> Result<()> {
        if !self.available {
            return Err(WorkflowError::Validation(
                "container backend unavailable: 'docker' not found on PATH".to_string(),
            ));
        }
        if task.image.as_deref().unwrap_or_default().is_empty() {
            return Err(WorkflowError::Validation(format!(
                "task '{}' uses the container backend but has no image set",
                task.name
            )));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "container"
    }

    fn status(&self) -> BackendStatus {
        if self.available {
            BackendStatus::Available
        } else {
            BackendStatus::Unavailable {
                reason: "'docker' not found on PATH".to_string(),
            }
        }
    }
}
