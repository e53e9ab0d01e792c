// src/scheduler.rs

//! The parallel DAG scheduler.
//!
//! Shared state lives behind a mutex; a driver loop reacts to an event
//! channel plus a periodic watchdog tick as a lost-wakeup safety net. It is
//! a one-shot run-to-completion scheduler: panic isolation per task and
//! first-error/cancel-on-failure semantics, no rerun or long-lived
//! bookkeeping.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::debug;

use crate::backend::BackendRegistry;
use crate::dag::DagGraph;
use crate::errors::{Result, WorkflowError};
use crate::executor;
use crate::model::Task;
use crate::workflow::Hooks;

const WATCHDOG_INTERVAL: Duration = Duration::from_millis(10);

/// Events driving the scheduler's main loop.
enum Event {
    Ready(String),
    Done,
    Cancel,
}

/// Bookkeeping shared between the driver loop and every dispatched worker.
struct SharedState {
    in_degree: HashMap<String, usize>,
    dependents: HashMap<String, Vec<String>>,
    started: HashSet<String>,
    completed: HashSet<String>,
    first_error: Option<(String, WorkflowError)>,
}

/// One-shot executor of a validated [`DagGraph`]: construct, [`run`](Scheduler::run), dispose.
pub struct Scheduler {
    tasks: HashMap<String, Arc<tokio::sync::Mutex<Task>>>,
    state: Arc<Mutex<SharedState>>,
    cancelled: Arc<AtomicBool>,
    registry: Arc<BackendRegistry>,
    hooks: Arc<Hooks>,
}

impl Scheduler {
    /// Build a scheduler from an already-[`validate`](DagGraph::validate)d
    /// graph. Consumes the graph; its tasks become the scheduler's own
    /// per-task state.
    pub fn from_graph(graph: DagGraph, registry: Arc<BackendRegistry>, hooks: Arc<Hooks>) -> Self {
        let names = graph.task_names();

        let mut in_degree = HashMap::with_capacity(names.len());
        let mut dependents = HashMap::with_capacity(names.len());
        for name in &names {
            in_degree.insert(name.clone(), graph.dependencies(name).len());
            dependents.insert(name.clone(), graph.dependents(name));
        }

        let tasks = graph
            .into_tasks()
            .into_iter()
            .map(|(name, task)| (name, Arc::new(tokio::sync::Mutex::new(task))))
            .collect();

        Self {
            tasks,
            state: Arc::new(Mutex::new(SharedState {
                in_degree,
                dependents,
                started: HashSet::new(),
                completed: HashSet::new(),
                first_error: None,
            })),
            cancelled: Arc::new(AtomicBool::new(false)),
            registry,
            hooks,
        }
    }

    /// Run every task to completion, respecting dependencies, returning the
    /// name of the first failing task and its error, if any.
    pub async fn run(self) -> Result<Option<(String, WorkflowError)>> {
        if self.tasks.is_empty() {
            return Ok(None);
        }

        let (tx, mut rx) = mpsc::unbounded_channel::<Event>();

        // Seed phase: every zero-indegree task is immediately ready.
        {
            let state = self.state.lock().unwrap();
            for (name, degree) in state.in_degree.iter() {
                if *degree == 0 {
                    let _ = tx.send(Event::Ready(name.clone()));
                }
            }
        }

        let total = self.tasks.len();
        let mut watchdog = tokio::time::interval(WATCHDOG_INTERVAL);
        watchdog.tick().await; // first tick fires immediately; discard it.

        loop {
            tokio::select! {
                event = rx.recv() => {
                    match event {
                        Some(Event::Ready(name)) => self.dispatch(name, tx.clone()),
                        Some(Event::Done) | None => break,
                        Some(Event::Cancel) => {
                            self.cancelled.store(true, Ordering::SeqCst);
                            break;
                        }
                    }
                }
                _ = watchdog.tick() => {
                    let completed = self.state.lock().unwrap().completed.len();
                    if completed >= total {
                        let _ = tx.send(Event::Done);
                    }
                }
            }
        }

        let first_error = self.state.lock().unwrap().first_error.take();
        Ok(first_error)
    }

    /// Mark `name` started and dispatch its worker, unless it is unknown or
    /// already started.
    fn dispatch(&self, name: String, tx: mpsc::UnboundedSender<Event>) {
        let Some(task_handle) = self.tasks.get(&name).cloned() else {
            debug!(task = %name, "ready event for unknown task, dropping");
            return;
        };

        {
            let mut state = self.state.lock().unwrap();
            if !state.started.insert(name.clone()) {
                return;
            }
        }

        let registry = self.registry.clone();
        let hooks = self.hooks.clone();
        let state = self.state.clone();
        let cancelled = self.cancelled.clone();
        let total = self.tasks.len();

        tokio::spawn(async move {
            run_worker(name, task_handle, registry, hooks, state, cancelled, tx, total).await;
        });
    }
}

/// Body of a single dispatched task: start hook, panic-isolated execution,
/// success/failure/complete hooks, then dependent fan-out.
async fn run_worker(
    name: String,
    task_handle: Arc<tokio::sync::Mutex<Task>>,
    registry: Arc<BackendRegistry>,
    hooks: Arc<Hooks>,
    state: Arc<Mutex<SharedState>>,
    cancelled: Arc<AtomicBool>,
    tx: mpsc::UnboundedSender<Event>,
    total: usize,
) {
    {
        let snapshot = task_handle.lock().await.clone();
        hooks.fire_start(&snapshot);
    }

    // Panic boundary: the task body runs in its own spawned task so a panic
    // surfaces as a `JoinError` here rather than taking down the scheduler.
    let inner_registry = registry.clone();
    let inner_handle = task_handle.clone();
    let join = tokio::spawn(async move {
        let mut guard = inner_handle.lock().await;
        executor::run(&inner_registry, &mut guard).await
    });

    let outcome: std::result::Result<(), String> = match join.await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(e.to_string()),
        Err(join_err) => {
            if join_err.is_panic() {
                Err(format!("task '{name}' panicked: {join_err}"))
            } else {
                Err(format!("task '{name}' was cancelled: {join_err}"))
            }
        }
    };

    let snapshot = task_handle.lock().await.clone();

    let mut newly_ready = Vec::new();
    {
        let mut state = state.lock().unwrap();

        match &outcome {
            Ok(()) => hooks.fire_success(&snapshot),
            Err(err) => {
                hooks.fire_failure(&snapshot, err);
                if state.first_error.is_none() {
                    state.first_error =
                        Some((name.clone(), WorkflowError::Other(anyhow::anyhow!(err.clone()))));
                    cancelled.store(true, Ordering::SeqCst);
                    let _ = tx.send(Event::Cancel);
                }
            }
        }

        state.completed.insert(name.clone());
        let done = state.completed.len() >= total;

        if let Some(dependents) = state.dependents.get(&name).cloned() {
            for dependent in dependents {
                if let Some(degree) = state.in_degree.get_mut(&dependent) {
                    *degree = degree.saturating_sub(1);
                    if *degree == 0 && !state.started.contains(&dependent) {
                        newly_ready.push(dependent);
                    }
                }
            }
        }

        if done {
            let _ = tx.send(Event::Done);
        }
    }

    hooks.fire_complete(&snapshot);

    // `Cancel` (sent above, inside the lock, on first failure) is enqueued
    // strictly before these `Ready` events in program order, so once the
    // driver observes `Cancel` it stops draining the queue and these never
    // get dispatched — dependents of a failed task are simply never started.
    for dependent in newly_ready {
        let _ = tx.send(Event::Ready(dependent));
    }
}
