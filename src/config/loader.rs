// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::RawWorkflowFile;
use crate::errors::{Result, WorkflowError};
use crate::workflow::Workflow;

/// Load a workflow file from a given path and return the raw
/// `RawWorkflowFile`.
///
/// This only performs YAML deserialization; it does **not** perform
/// semantic validation (DAG correctness, etc.). Use [`load_and_validate`]
/// for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawWorkflowFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(WorkflowError::Io)?;

    let raw: RawWorkflowFile = serde_yaml::from_str(&contents)?;

    Ok(raw)
}

/// Load a workflow file from path and run structural validation.
///
/// - Reads YAML.
/// - Applies defaults (`#[serde(default)]`).
/// - Converts durations, checks for empty commands and duplicate task
///   names (`RawTaskSpec` -> `Task` / `Workflow` via `TryFrom`).
///
/// DAG-level validation (missing dependencies, cycles) is *not* performed
/// here; that happens when [`Workflow::run`] builds its [`crate::dag::DagGraph`].
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<Workflow> {
    let raw = load_from_path(&path)?;
    Workflow::try_from(raw)
}

/// Helper to resolve a default config path.
///
/// Currently this just returns `iapetus.yaml` in the current working
/// directory, but this function exists so callers can later respect an
/// env var or search multiple default locations.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("iapetus.yaml")
}
