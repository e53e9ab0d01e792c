use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use iapetus::backend::BackendRegistry;
use iapetus::model::Task;
use iapetus::workflow::Workflow;
use iapetus_test_utils::fake_executor::{FakeBackend, FakeOutcome};

/// Shared event log hooks append to, one line per lifecycle callback.
#[derive(Default, Clone)]
struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    fn push(&self, line: impl Into<String>) {
        self.0.lock().unwrap().push(line.into());
    }

    fn lines(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    fn position_of(&self, needle: &str) -> usize {
        self.lines()
            .iter()
            .position(|l| l == needle)
            .unwrap_or_else(|| panic!("event {needle:?} never recorded; log: {:?}", self.lines()))
    }
}

fn attach_hooks(workflow: &mut Workflow, log: EventLog) {
    let l = log.clone();
    workflow.on_task_start(Arc::new(move |t: &Task| l.push(format!("start:{}", t.name))));
    let l = log.clone();
    workflow.on_task_success(Arc::new(move |t: &Task| l.push(format!("success:{}", t.name))));
    let l = log.clone();
    workflow.on_task_failure(Arc::new(move |t: &Task, _err: &str| {
        l.push(format!("failure:{}", t.name))
    }));
    let l = log.clone();
    workflow.on_task_complete(Arc::new(move |t: &Task| l.push(format!("complete:{}", t.name))));
}

fn task(name: &str, deps: &[&str]) -> Task {
    let mut t = Task::new(name, "true");
    t.depends = deps.iter().map(|s| s.to_string()).collect();
    t
}

#[tokio::test]
async fn linear_chain_all_succeed_runs_in_dependency_order() {
    let backend = FakeBackend::new("fake");
    let registry = Arc::new(BackendRegistry::new());
    registry.register(Arc::new(backend));

    let mut workflow = Workflow::new("linear");
    workflow.backend = "fake".to_string();
    let log = EventLog::default();
    attach_hooks(&mut workflow, log.clone());

    workflow.add_task(task("a", &[]));
    workflow.add_task(task("b", &["a"]));
    workflow.add_task(task("c", &["b"]));

    workflow.run_with_registry(registry).await.unwrap();

    let lines = log.lines();
    let starts: Vec<&str> = lines
        .iter()
        .filter_map(|l| l.strip_prefix("start:"))
        .collect();
    assert_eq!(starts, vec!["a", "b", "c"]);

    for name in ["a", "b", "c"] {
        assert!(lines.contains(&format!("success:{name}")));
        assert!(lines.contains(&format!("complete:{name}")));
        assert!(!lines.contains(&format!("failure:{name}")));
    }
}

#[tokio::test]
async fn diamond_dependency_completes_before_join_starts() {
    let backend = FakeBackend::new("fake");
    let registry = Arc::new(BackendRegistry::new());
    registry.register(Arc::new(backend));

    let mut workflow = Workflow::new("diamond");
    workflow.backend = "fake".to_string();
    let log = EventLog::default();
    attach_hooks(&mut workflow, log.clone());

    workflow.add_task(task("a", &[]));
    workflow.add_task(task("b", &["a"]));
    workflow.add_task(task("c", &["a"]));
    workflow.add_task(task("d", &["b", "c"]));

    workflow.run_with_registry(registry).await.unwrap();

    assert!(log.position_of("complete:a") < log.position_of("start:b"));
    assert!(log.position_of("complete:a") < log.position_of("start:c"));
    assert!(log.position_of("complete:b") < log.position_of("start:d"));
    assert!(log.position_of("complete:c") < log.position_of("start:d"));
}

#[tokio::test]
async fn first_failure_cancels_and_is_surfaced() {
    let backend = FakeBackend::new("fake");
    backend.set_outcomes("a", vec![FakeOutcome::Failure("boom".to_string())]);
    let registry = Arc::new(BackendRegistry::new());
    registry.register(Arc::new(backend));

    let mut workflow = Workflow::new("wf");
    workflow.backend = "fake".to_string();
    let log = EventLog::default();
    attach_hooks(&mut workflow, log.clone());

    let mut b = task("b", &[]);
    b.retries = 1;
    workflow.add_task(task("a", &[]));
    workflow.add_task(b);

    let err = workflow.run_with_registry(registry).await.unwrap_err();
    assert!(err.to_string().contains("'a'") || err.to_string().contains("\"a\""));

    let lines = log.lines();
    // Every started task gets exactly one on_complete, and exactly one of
    // on_success/on_failure.
    for name in ["a", "b"] {
        if lines.iter().any(|l| l.starts_with(&format!("start:{name}"))) {
            let completes = lines.iter().filter(|l| **l == format!("complete:{name}")).count();
            assert_eq!(completes, 1, "{name} should complete exactly once");
            let successes = lines.iter().filter(|l| **l == format!("success:{name}")).count();
            let failures = lines.iter().filter(|l| **l == format!("failure:{name}")).count();
            assert_eq!(successes + failures, 1, "{name} must be exactly one of success/failure");
        }
    }
    assert!(lines.contains(&"failure:a".to_string()));
}

#[tokio::test]
async fn timeout_yields_error_containing_timed_out() {
    let backend = FakeBackend::new("fake");
    backend.set_outcomes("slow", vec![FakeOutcome::Sleep(Duration::from_secs(2))]);
    let registry = Arc::new(BackendRegistry::new());
    registry.register(Arc::new(backend));

    let mut workflow = Workflow::new("wf");
    workflow.backend = "fake".to_string();

    let mut slow = task("slow", &[]);
    slow.timeout = Duration::from_millis(500);
    slow.retries = 1;
    workflow.add_task(slow);

    let err = tokio::time::timeout(Duration::from_secs(5), workflow.run_with_registry(registry))
        .await
        .expect("workflow itself should not hang")
        .unwrap_err();

    assert!(err.to_string().contains("timed out"));
}

#[tokio::test]
async fn retries_exhausted_reports_attempt_count() {
    let backend = FakeBackend::new("fake");
    backend.set_outcomes(
        "flaky",
        vec![
            FakeOutcome::Failure("nope".to_string()),
            FakeOutcome::Failure("nope".to_string()),
            FakeOutcome::Failure("nope".to_string()),
        ],
    );
    let registry = Arc::new(BackendRegistry::new());
    registry.register(Arc::new(backend));

    let mut workflow = Workflow::new("wf");
    workflow.backend = "fake".to_string();

    let mut flaky = task("flaky", &[]);
    flaky.retries = 3;
    flaky.retry_delay = Duration::from_millis(1);
    workflow.add_task(flaky);

    let err = workflow.run_with_registry(registry).await.unwrap_err();
    assert!(err.to_string().contains("failed after 3 attempts"));
}

#[tokio::test]
async fn successful_task_is_attempted_exactly_once() {
    let backend = Arc::new(FakeBackend::new("fake"));
    let registry = Arc::new(BackendRegistry::new());
    registry.register(backend.clone());

    let mut workflow = Workflow::new("wf");
    workflow.backend = "fake".to_string();
    let mut t = task("solo", &[]);
    t.retries = 5;
    workflow.add_task(t);

    workflow.run_with_registry(registry).await.unwrap();
    assert_eq!(backend.attempt_count("solo"), 1);
}

#[tokio::test]
async fn cycle_is_rejected_before_any_task_is_dispatched() {
    let backend = FakeBackend::new("fake");
    let registry = Arc::new(BackendRegistry::new());
    registry.register(Arc::new(backend));

    let mut workflow = Workflow::new("wf");
    workflow.backend = "fake".to_string();
    workflow.add_task(task("a", &["c"]));
    workflow.add_task(task("b", &["a"]));
    workflow.add_task(task("c", &["b"]));

    let err = workflow.run_with_registry(registry).await.unwrap_err();
    assert!(err.to_string().to_lowercase().contains("cycle"));
}

#[tokio::test]
async fn empty_workflow_returns_ok_and_fires_no_hooks() {
    let registry = Arc::new(BackendRegistry::new());
    registry.register(Arc::new(FakeBackend::new("fake")));

    let mut workflow = Workflow::new("empty");
    let log = EventLog::default();
    attach_hooks(&mut workflow, log.clone());

    workflow.run_with_registry(registry).await.unwrap();
    assert!(log.lines().is_empty());
}

#[tokio::test]
async fn dependents_of_a_failed_task_are_never_dispatched() {
    let backend = FakeBackend::new("fake");
    backend.set_outcomes("a", vec![FakeOutcome::Failure("boom".to_string())]);
    let registry = Arc::new(BackendRegistry::new());
    registry.register(Arc::new(backend));

    let mut workflow = Workflow::new("wf");
    workflow.backend = "fake".to_string();
    let log = EventLog::default();
    attach_hooks(&mut workflow, log.clone());

    workflow.add_task(task("a", &[]));
    workflow.add_task(task("b", &["a"]));

    let _ = workflow.run_with_registry(registry).await;

    let lines: HashSet<String> = log.lines().into_iter().collect();
    assert!(!lines.contains("start:b"));
    assert!(!lines.contains("complete:b"));
}

#[tokio::test]
async fn panicking_task_is_isolated_and_cancels_dependents() {
    let backend = FakeBackend::new("fake");
    backend.set_outcomes("a", vec![FakeOutcome::Panic]);
    let registry = Arc::new(BackendRegistry::new());
    registry.register(Arc::new(backend));

    let mut workflow = Workflow::new("wf");
    workflow.backend = "fake".to_string();
    let log = EventLog::default();
    attach_hooks(&mut workflow, log.clone());

    workflow.add_task(task("a", &[]));
    workflow.add_task(task("b", &["a"]));

    let err = workflow.run_with_registry(registry).await.unwrap_err();
    assert!(err.to_string().contains("'a'") || err.to_string().contains("\"a\""));

    let lines = log.lines();
    assert!(log.position_of("start:a") < log.position_of("complete:a"));
    assert!(lines.contains(&"failure:a".to_string()));
    assert!(!lines.contains(&"success:a".to_string()));
    assert_eq!(
        lines.iter().filter(|l| **l == "complete:a").count(),
        1,
        "a should complete exactly once despite panicking"
    );

    // The panic must trigger cancellation: b depends on a and must never
    // be dispatched.
    let lines: HashSet<String> = lines.into_iter().collect();
    assert!(!lines.contains("start:b"));
    assert!(!lines.contains("complete:b"));
}
