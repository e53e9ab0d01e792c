use std::time::Duration;

use iapetus::backend::register_default_backends;
use iapetus::model::Task;
use iapetus::workflow::Workflow;

fn echo_task(name: &str, deps: &[&str], word: &str) -> Task {
    let mut t = Task::new(name, "echo");
    t.args = vec![word.to_string()];
    t.depends = deps.iter().map(|s| s.to_string()).collect();
    t
}

#[tokio::test]
async fn linear_chain_of_real_commands_succeeds() {
    register_default_backends();

    let mut workflow = Workflow::new("linear-real");
    workflow.add_task(echo_task("a", &[], "1"));
    workflow.add_task(echo_task("b", &["a"], "2"));
    workflow.add_task(echo_task("c", &["b"], "3"));

    workflow.run().await.unwrap();
}

#[tokio::test]
async fn real_process_timeout_reports_deadline() {
    register_default_backends();

    let mut sleep_task = Task::new("slow", "sleep");
    sleep_task.args = vec!["2".to_string()];
    sleep_task.timeout = Duration::from_millis(500);
    sleep_task.retries = 1;

    let mut workflow = Workflow::new("timeout-real");
    workflow.add_task(sleep_task);

    let err = tokio::time::timeout(Duration::from_secs(5), workflow.run())
        .await
        .expect("workflow should return promptly once the deadline fires")
        .unwrap_err();

    assert!(err.to_string().contains("timed out after 500ms"));
}

#[tokio::test]
async fn real_process_retries_exhausted_reports_attempts() {
    register_default_backends();

    let mut failing = Task::new("always-fails", "false");
    failing.retries = 2;
    failing.retry_delay = Duration::from_millis(10);

    let mut workflow = Workflow::new("retries-real");
    workflow.add_task(failing);

    let err = workflow.run().await.unwrap_err();
    assert!(err.to_string().contains("failed after 2 attempts"));
}

#[tokio::test]
async fn env_map_wins_over_process_environment() {
    register_default_backends();

    // SAFETY: no other thread in this test binary reads or writes this
    // particular variable concurrently.
    unsafe {
        std::env::set_var("IAPETUS_TEST_ENV_PRECEDENCE", "process-value");
    }

    let mut task = Task::new("env-check", "sh");
    task.args = vec!["-c".to_string(), "echo $IAPETUS_TEST_ENV_PRECEDENCE".to_string()];
    task.env_map.insert(
        "IAPETUS_TEST_ENV_PRECEDENCE".to_string(),
        "task-value".to_string(),
    );
    task.asserts = vec![iapetus::assertions::output_contains("task-value")];

    let mut workflow = Workflow::new("env-real");
    workflow.add_task(task);

    workflow.run().await.unwrap();
}
