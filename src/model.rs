// src/model.rs

//! Core data model: [`Task`] and the [`Assertion`] function type.
//!
//! `Task` carries both the input fields a user/config author sets (command,
//! args, timeout, …) and the output fields the executor fills in after a run
//! (`exit_code`, `output`, `error`). A `Task` is cheap to clone: the worker
//! that runs it clones a snapshot out of the scheduler's shared map, mutates
//! its own copy, then writes the result back.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// A pure predicate over a completed task's captured output.
///
/// Returns `Some(message)` on failure, `None` on success. Assertions never
/// see a task before it has run, so `task.output`/`task.exit_code` are
/// always populated when an assertion is invoked.
pub type Assertion = Arc<dyn Fn(&Task) -> Option<String> + Send + Sync>;

/// A single task: an external command invocation plus its dependency,
/// retry, and assertion configuration.
#[derive(Clone)]
pub struct Task {
    pub name: String,
    pub command: String,
    pub args: Vec<String>,
    pub depends: Vec<String>,
    pub timeout: Duration,
    pub retries: u32,
    pub retry_delay: Duration,
    pub env_map: HashMap<String, String>,
    pub working_dir: Option<String>,
    pub image: Option<String>,
    pub backend: String,
    pub asserts: Vec<Assertion>,

    // Output fields, populated by the executor.
    pub exit_code: i32,
    pub output: String,
    pub error: String,
}

impl Task {
    /// Construct a new task with the given name and command, all other
    /// fields at their zero/empty defaults. Callers typically go through
    /// [`crate::config`] instead of building tasks directly.
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            args: Vec::new(),
            depends: Vec::new(),
            timeout: Duration::ZERO,
            retries: 0,
            retry_delay: Duration::ZERO,
            env_map: HashMap::new(),
            working_dir: None,
            image: None,
            backend: String::new(),
            asserts: Vec::new(),
            exit_code: 0,
            output: String::new(),
            error: String::new(),
        }
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("command", &self.command)
            .field("args", &self.args)
            .field("depends", &self.depends)
            .field("timeout", &self.timeout)
            .field("retries", &self.retries)
            .field("retry_delay", &self.retry_delay)
            .field("env_map", &self.env_map)
            .field("working_dir", &self.working_dir)
            .field("image", &self.image)
            .field("backend", &self.backend)
            .field("asserts", &self.asserts.len())
            .field("exit_code", &self.exit_code)
            .field("output", &self.output)
            .field("error", &self.error)
            .finish()
    }
}
