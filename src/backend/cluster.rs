// src/backend/cluster.rs

//! Cluster backend: runs a task as a one-shot pod via
//! `kubectl run --rm -i --restart=Never --image=<image> … -- <command> <args…>`.
//!
//! Structurally identical to [`crate::backend::container`] — only the CLI
//! and argv shape differ — so it shares the same `which`-probed
//! availability check and [`crate::backend::bash::run_process`] execution
//! path.

use async_trait::async_trait;
use uuid::Uuid;

use crate::backend::bash::run_process;
use crate::backend::Backend;
use crate::errors::{Result, WorkflowError};
use crate::model::Task;
use crate::types::BackendStatus;

/// Backend that shells out to `kubectl run` for a disposable pod per task.
pub struct ClusterBackend {
    available: bool,
}

impl ClusterBackend {
    pub fn new() -> Self {
        Self {
            available: which::which("kubectl").is_ok(),
        }
    }
}

impl Default for ClusterBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backend for ClusterBackend {
    async fn run(&self, task: &mut Task) -> Result<()> {
        self.validate(task)?;

        let image = task.image.clone().unwrap_or_default();
        let pod_name = format!("iapetus-{}-{}", task.name, Uuid::new_v4());

        let mut args = vec![
            "run".to_string(),
            pod_name,
            "--rm".to_string(),
            "-i".to_string(),
            "--restart=Never".to_string(),
            format!("--image={image}"),
        ];
        for (key, value) in task.env_map.iter() {
            args.push(format!("--env={key}={value}"));
        }
        args.push("--".to_string());
        args.push(task.command.clone());
        args.extend(task.args.iter().cloned());

        run_process(task, "kubectl", &args, task.timeout).await
    }

    fn validate(&self, task: &Task) -> Result<()> {
        if !self.available {
            return Err(WorkflowError::Validation(
                "cluster backend unavailable: 'kubectl' not found on PATH".to_string(),
            ));
        }
        if task.image.as_deref().unwrap_or_default().is_empty() {
            return Err(WorkflowError::Validation(format!(
                "task '{}' uses the cluster backend but has no image set",
                task.name
            )));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "cluster"
    }

    fn status(&self) -> BackendStatus {
        if self.available {
            BackendStatus::Available
        } else {
            BackendStatus::Unavailable {
                reason: "'kubectl' not found on PATH".to_string(),
            }
        }
    }
}
