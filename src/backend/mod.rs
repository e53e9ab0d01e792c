// src/backend/mod.rs

//! Pluggable execution backends.
//!
//! A [`Backend`] is the capability set the scheduler dispatches a task
//! through: `run`, `validate`, `name`, `status`. The scheduler never sees the
//! concrete backend; it only ever talks to `Arc<dyn Backend>` looked up by
//! name from the process-wide [`BackendRegistry`].
//!
//! Three concrete backends ship by default, registered through an explicit
//! [`register_default_backends`] call rather than a static initializer,
//! since Rust has no implicit `init()`.

pub mod bash;
pub mod cluster;
pub mod container;
pub mod registry;

use async_trait::async_trait;

use crate::errors::Result;
use crate::model::Task;
use crate::types::BackendStatus;

/// An executor for tasks, selected by name from the [`BackendRegistry`].
///
/// Implementations must be safe to call concurrently from multiple tasks,
/// provided each call operates on a distinct [`Task`].
#[async_trait]
pub trait Backend: Send + Sync {
    /// Run `task` to completion, filling in its output fields. Returns an
    /// error if the attempt should be considered failed; the task executor
    /// decides whether to retry.
    async fn run(&self, task: &mut Task) -> Result<()>;

    /// Fail fast if `task` is unusable for this backend (e.g. a container
    /// backend without an image). Called once per attempt, before `run`.
    fn validate(&self, task: &Task) -> Result<()>;

    /// The name this backend is registered under.
    fn name(&self) -> &str;

    /// Current availability, for diagnostics.
    fn status(&self) -> BackendStatus;
}

pub use registry::{register_default_backends, BackendRegistry};
