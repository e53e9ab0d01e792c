use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use iapetus::backend::Backend;
use iapetus::errors::{Result, WorkflowError};
use iapetus::model::Task;
use iapetus::types::BackendStatus;

/// One scripted outcome for a single attempt of a [`FakeBackend::run`] call.
#[derive(Clone)]
pub enum FakeOutcome {
    /// Attempt succeeds immediately.
    Success,
    /// Attempt fails with the given message.
    Failure(String),
    /// Attempt sleeps for `Duration`, racing against `task.timeout` the same
    /// way a real backend races its child process against the deadline.
    Sleep(Duration),
    /// Attempt panics, to exercise the scheduler's panic-isolation path.
    Panic,
}

/// A backend whose per-attempt outcome is scripted ahead of time, used by
/// scheduler and executor tests in place of a real process launch.
///
/// Each task gets its own queue of outcomes, consumed one per attempt; once
/// a task's queue is drained, further attempts default to [`FakeOutcome::Success`].
#[derive(Default)]
pub struct FakeBackend {
    name: String,
    outcomes: Arc<Mutex<HashMap<String, VecDeque<FakeOutcome>>>>,
    started: Arc<Mutex<Vec<String>>>,
    attempts: Arc<Mutex<HashMap<String, u32>>>,
}

impl FakeBackend {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            outcomes: Arc::new(Mutex::new(HashMap::new())),
            started: Arc::new(Mutex::new(Vec::new())),
            attempts: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Script the sequence of outcomes for `task`'s successive attempts.
    pub fn set_outcomes(&self, task: &str, outcomes: Vec<FakeOutcome>) {
        self.outcomes
            .lock()
            .unwrap()
            .insert(task.to_string(), outcomes.into_iter().collect());
    }

    /// Names of tasks this backend has been asked to run, in call order
    /// (including repeated entries for retried attempts).
    pub fn started(&self) -> Vec<String> {
        self.started.lock().unwrap().clone()
    }

    /// Number of attempts made for `task` so far.
    pub fn attempt_count(&self, task: &str) -> u32 {
        *self.attempts.lock().unwrap().get(task).unwrap_or(&0)
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn run(&self, task: &mut Task) -> Result<()> {
        self.started.lock().unwrap().push(task.name.clone());
        *self.attempts.lock().unwrap().entry(task.name.clone()).or_insert(0) += 1;

        let outcome = self
            .outcomes
            .lock()
            .unwrap()
            .get_mut(&task.name)
            .and_then(|q| q.pop_front())
            .unwrap_or(FakeOutcome::Success);

        match outcome {
            FakeOutcome::Success => {
                task.exit_code = 0;
                task.output = "ok".to_string();
                Ok(())
            }
            FakeOutcome::Failure(msg) => {
                task.exit_code = 1;
                task.error = msg.clone();
                Err(WorkflowError::Other(anyhow::anyhow!(msg)))
            }
            FakeOutcome::Sleep(sleep_for) => {
                match tokio::time::timeout(task.timeout, tokio::time::sleep(sleep_for)).await {
                    Ok(()) => {
                        task.exit_code = 0;
                        task.output = "ok".to_string();
                        Ok(())
                    }
                    Err(_elapsed) => {
                        task.exit_code = -1;
                        task.error = format!("timed out after {:?}", task.timeout);
                        Err(WorkflowError::Other(anyhow::anyhow!(task.error.clone())))
                    }
                }
            }
            FakeOutcome::Panic => {
                panic!("fake backend panic for task '{}'", task.name);
            }
        }
    }

    fn validate(&self, _task: &Task) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn status(&self) -> BackendStatus {
        BackendStatus::Available
    }
}
