use iapetus::assertions::{
    exit_code_equals, output_contains, output_equals, output_json_equals, output_matches_regex,
    run_assertions,
};
use iapetus::model::Task;

fn task_with(exit_code: i32, output: &str) -> Task {
    let mut t = Task::new("t", "echo");
    t.exit_code = exit_code;
    t.output = output.to_string();
    t
}

#[test]
fn exit_code_equals_passes_and_fails() {
    let t = task_with(0, "");
    assert!(exit_code_equals(0)(&t).is_none());
    assert!(exit_code_equals(1)(&t).is_some());
}

#[test]
fn output_contains_is_raw_and_not_normalized() {
    let t = task_with(0, "  hello world\r\n");
    assert!(output_contains("hello world")(&t).is_none());
    // Contains does not trim, so the exact padded substring must be present.
    assert!(output_contains("  hello world\r\n")(&t).is_none());
    assert!(output_contains("goodbye")(&t).is_some());
}

#[test]
fn output_equals_normalizes_crlf_and_trims() {
    let t = task_with(0, "  line one\r\nline two  \n");
    assert!(output_equals("line one\nline two")(&t).is_none());
    assert!(output_equals("line one\r\nline two")(&t).is_none());
    assert!(output_equals("line one\nline three")(&t).is_some());
}

#[test]
fn output_matches_regex_normalizes_before_search() {
    let t = task_with(0, "  build: 42 warnings\r\n");
    assert!(output_matches_regex(r"\d+ warnings")(&t).is_none());
    assert!(output_matches_regex(r"^build:")(&t).is_none());
    assert!(output_matches_regex(r"errors")(&t).is_some());
}

#[test]
fn output_matches_regex_invalid_pattern_is_an_assertion_failure() {
    let t = task_with(0, "anything");
    let msg = output_matches_regex("(unterminated")(&t);
    assert!(msg.is_some());
    assert!(msg.unwrap().contains("invalid regex"));
}

#[test]
fn output_json_equals_detects_mismatch() {
    let t = task_with(0, r#"{"a": 1, "b": {"c": 2}}"#);
    assert!(output_json_equals(r#"{"a": 1, "b": {"c": 2}}"#.to_string(), vec![])(&t).is_none());

    let msg = output_json_equals(r#"{"a": 1, "b": {"c": 3}}"#.to_string(), vec![])(&t);
    assert!(msg.is_some());
    assert!(msg.unwrap().contains("b.c"));
}

#[test]
fn output_json_equals_ignores_skipped_paths() {
    let t = task_with(0, r#"{"a": 1, "timestamp": "2026-07-28T00:00:00Z"}"#);
    let assertion = output_json_equals(
        r#"{"a": 1, "timestamp": "whatever"}"#.to_string(),
        vec!["timestamp".to_string()],
    );
    assert!(assertion(&t).is_none());
}

#[test]
fn output_json_equals_rejects_invalid_json() {
    let t = task_with(0, "not json");
    let msg = output_json_equals("{}".to_string(), vec![])(&t);
    assert!(msg.unwrap().contains("not valid JSON"));
}

#[test]
fn run_assertions_aggregates_failures_joined_by_semicolon() {
    let mut t = task_with(1, "hello");
    t.asserts = vec![
        exit_code_equals(0),
        output_contains("goodbye"),
        output_contains("hello"),
    ];

    let msg = run_assertions(&t).expect("two assertions should fail");
    assert!(msg.contains("; "));
    assert!(msg.contains("expected exit code"));
    assert!(msg.contains("goodbye"));
}

#[test]
fn run_assertions_passes_when_all_assertions_pass() {
    let mut t = task_with(0, "hello");
    t.asserts = vec![exit_code_equals(0), output_contains("hello")];
    assert!(run_assertions(&t).is_none());
}

#[test]
fn run_assertions_passes_with_no_assertions() {
    let t = task_with(0, "");
    assert!(run_assertions(&t).is_none());
}
