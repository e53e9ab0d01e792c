// src/errors.rs

//! Crate-wide error types.
//!
//! [`WorkflowError`] distinguishes the error kinds a workflow run needs to
//! tell apart (configuration vs. DAG vs. execution, …); [`Result`] is the
//! crate-wide alias built on it. Backend/internal failures that don't need
//! their own variant flow through the `Other(#[from] anyhow::Error)` catch-all.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("cycle detected in DAG: {0}")]
    DagCycle(String),

    #[error("missing dependency: {0}")]
    DagMissingDependency(String),

    #[error("duplicate task: {0}")]
    DagDuplicateTask(String),

    #[error("backend {0} not found")]
    BackendNotFound(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("task {task} failed after {attempts} attempts: {inner}")]
    Execution {
        task: String,
        attempts: u32,
        inner: String,
    },

    #[error("step \"{step}\" of workflow \"{workflow}\": {inner}")]
    Step {
        step: String,
        workflow: String,
        inner: Box<WorkflowError>,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl WorkflowError {
    /// Wrap this error as the first failure of `workflow`, attributing it to
    /// `step` (a task name, or `"DAG"` for errors surfaced before any task
    /// runs).
    pub fn into_step(self, step: impl Into<String>, workflow: impl Into<String>) -> Self {
        WorkflowError::Step {
            step: step.into(),
            workflow: workflow.into(),
            inner: Box::new(self),
        }
    }
}

pub type Result<T> = std::result::Result<T, WorkflowError>;
