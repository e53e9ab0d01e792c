// src/workflow.rs

//! The `Workflow` aggregate: a named set of tasks plus lifecycle hooks,
//! built into a DAG and handed to the [`Scheduler`] on [`Workflow::run`].
//!
//! Hook lists are append-only fan-out callback registries, invoked in
//! registration order.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::backend::{global as global_registry, BackendRegistry};
use crate::dag::DagGraph;
use crate::errors::Result;
use crate::model::Task;
use crate::scheduler::Scheduler;

pub type StartHook = Arc<dyn Fn(&Task) + Send + Sync>;
pub type SuccessHook = Arc<dyn Fn(&Task) + Send + Sync>;
pub type FailureHook = Arc<dyn Fn(&Task, &str) + Send + Sync>;
pub type CompleteHook = Arc<dyn Fn(&Task) + Send + Sync>;

/// Four append-only callback lists, invoked in registration order. Expected
/// to be frozen (no further registration) once [`Workflow::run`] starts.
#[derive(Default, Clone)]
pub struct Hooks {
    on_start: Vec<StartHook>,
    on_success: Vec<SuccessHook>,
    on_failure: Vec<FailureHook>,
    on_complete: Vec<CompleteHook>,
}

impl Hooks {
    pub(crate) fn fire_start(&self, task: &Task) {
        for hook in &self.on_start {
            hook(task);
        }
    }

    pub(crate) fn fire_success(&self, task: &Task) {
        for hook in &self.on_success {
            hook(task);
        }
    }

    pub(crate) fn fire_failure(&self, task: &Task, err: &str) {
        for hook in &self.on_failure {
            hook(task, err);
        }
    }

    pub(crate) fn fire_complete(&self, task: &Task) {
        for hook in &self.on_complete {
            hook(task);
        }
    }
}

/// A named collection of tasks plus the dependency graph implied by their
/// `depends` fields, run once via [`Workflow::run`].
pub struct Workflow {
    pub name: String,
    pub steps: Vec<Task>,
    pub backend: String,
    pub env_map: HashMap<String, String>,
    hooks: Hooks,
}

impl Workflow {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
            backend: "bash".to_string(),
            env_map: HashMap::new(),
            hooks: Hooks::default(),
        }
    }

    pub fn add_task(&mut self, task: Task) -> &mut Self {
        self.steps.push(task);
        self
    }

    pub fn on_task_start(&mut self, hook: StartHook) -> &mut Self {
        self.hooks.on_start.push(hook);
        self
    }

    pub fn on_task_success(&mut self, hook: SuccessHook) -> &mut Self {
        self.hooks.on_success.push(hook);
        self
    }

    pub fn on_task_failure(&mut self, hook: FailureHook) -> &mut Self {
        self.hooks.on_failure.push(hook);
        self
    }

    pub fn on_task_complete(&mut self, hook: CompleteHook) -> &mut Self {
        self.hooks.on_complete.push(hook);
        self
    }

    /// Run this workflow against the process-wide backend registry.
    /// [`crate::backend::register_default_backends`] must have been called
    /// beforehand (`main` does this once at startup).
    pub async fn run(self) -> Result<()> {
        self.run_with_registry(global_registry()).await
    }

    /// Run this workflow against a specific backend registry (used by tests
    /// that want an isolated registry instead of the process-wide one).
    pub async fn run_with_registry(mut self, registry: Arc<BackendRegistry>) -> Result<()> {
        if self.name.is_empty() {
            self.name = Uuid::new_v4().to_string();
        }

        let workflow_name = self.name.clone();
        info!(workflow = %workflow_name, tasks = self.steps.len(), "starting workflow run");

        let graph = DagGraph::new();
        for mut task in self.steps.into_iter() {
            if task.backend.is_empty() {
                task.backend = self.backend.clone();
            }
            if task.env_map.is_empty() && !self.env_map.is_empty() {
                task.env_map = self.env_map.clone();
            }
            let step_name = task.name.clone();
            graph
                .add(task)
                .map_err(|e| e.into_step(step_name, workflow_name.clone()))?;
        }

        graph
            .validate()
            .map_err(|e| e.into_step("DAG".to_string(), workflow_name.clone()))?;
        // Exercised for its invariant (every task appears exactly once) even
        // though the scheduler re-derives in-degree/dependents itself.
        let _order = graph
            .topological_order()
            .map_err(|e| e.into_step("DAG".to_string(), workflow_name.clone()))?;

        let hooks = Arc::new(self.hooks);
        let scheduler = Scheduler::from_graph(graph, registry, hooks);

        match scheduler.run().await? {
            None => {
                info!(workflow = %workflow_name, "workflow run completed successfully");
                Ok(())
            }
            Some((failing_step, err)) => Err(err.into_step(failing_step, workflow_name)),
        }
    }
}
