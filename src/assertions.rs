// src/assertions.rs

//! Built-in assertion constructors and the aggregation pipeline that runs
//! them against a completed task.
//!
//! An assertion is `Arc<dyn Fn(&Task) -> Option<String> + Send + Sync>`
//! ([`crate::model::Assertion`]); [`run_assertions`] invokes every assertion
//! attached to a task in insertion order and joins any failures with `"; "`.

use std::sync::Arc;

use regex::Regex;
use serde_json::Value;

use crate::model::{Assertion, Task};

/// Normalize CRLF to LF and trim leading/trailing whitespace. Used by the
/// equals and regex assertions; the contains assertion deliberately does
/// not normalize.
fn normalize(s: &str) -> String {
    s.replace("\r\n", "\n").trim().to_string()
}

/// Run every assertion attached to `task` in order, aggregating failures.
/// Returns `None` only if every assertion passed.
pub fn run_assertions(task: &Task) -> Option<String> {
    let failures: Vec<String> = task
        .asserts
        .iter()
        .filter_map(|assertion| assertion(task))
        .collect();

    if failures.is_empty() {
        None
    } else {
        Some(failures.join("; "))
    }
}

/// Fails if `task.exit_code != code`.
pub fn exit_code_equals(code: i32) -> Assertion {
    Arc::new(move |task: &Task| {
        if task.exit_code != code {
            Some(format!(
                "expected exit code {code}, got {}",
                task.exit_code
            ))
        } else {
            None
        }
    })
}

/// Substring test over raw (non-normalized) output.
pub fn output_contains(needle: impl Into<String>) -> Assertion {
    let needle = needle.into();
    Arc::new(move |task: &Task| {
        if task.output.contains(&needle) {
            None
        } else {
            Some(format!("output does not contain {needle:?}"))
        }
    })
}

/// Equality after CRLF→LF normalization and trimming on both sides.
pub fn output_equals(expected: impl Into<String>) -> Assertion {
    let expected = expected.into();
    Arc::new(move |task: &Task| {
        let got = normalize(&task.output);
        let want = normalize(&expected);
        if got == want {
            None
        } else {
            Some(format!("output does not equal expected: got {got:?}, want {want:?}"))
        }
    })
}

/// Regex search against normalized output. An invalid pattern is itself an
/// assertion failure rather than a panic.
pub fn output_matches_regex(pattern: impl Into<String>) -> Assertion {
    let pattern = pattern.into();
    Arc::new(move |task: &Task| {
        let re = match Regex::new(&pattern) {
            Ok(re) => re,
            Err(e) => return Some(format!("invalid regex {pattern:?}: {e}")),
        };
        let got = normalize(&task.output);
        if re.is_match(&got) {
            None
        } else {
            Some(format!("output does not match regex {pattern:?}"))
        }
    })
}

/// Parse both sides as JSON and structurally diff them, ignoring any
/// difference whose dotted path exactly matches an entry in `skip_paths`.
pub fn output_json_equals(expected: impl Into<String>, skip_paths: Vec<String>) -> Assertion {
    let expected = expected.into();
    Arc::new(move |task: &Task| {
        let actual: Value = match serde_json::from_str(&task.output) {
            Ok(v) => v,
            Err(e) => return Some(format!("output is not valid JSON: {e}")),
        };
        let want: Value = match serde_json::from_str(&expected) {
            Ok(v) => v,
            Err(e) => return Some(format!("expected JSON is not valid: {e}")),
        };

        let mut diffs = Vec::new();
        diff_json("", &actual, &want, &skip_paths, &mut diffs);

        if diffs.is_empty() {
            None
        } else {
            Some(format!("JSON output mismatch: {}", diffs.join("; ")))
        }
    })
}

/// Structural JSON diff, recording a message per differing leaf/shape unless
/// its dotted path is in `skip_paths`.
fn diff_json(path: &str, actual: &Value, expected: &Value, skip_paths: &[String], diffs: &mut Vec<String>) {
    if skip_paths.iter().any(|p| p == path) {
        return;
    }

    match (actual, expected) {
        (Value::Object(a), Value::Object(b)) => {
            for (key, expected_val) in b.iter() {
                let child_path = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{path}.{key}")
                };
                match a.get(key) {
                    Some(actual_val) => diff_json(&child_path, actual_val, expected_val, skip_paths, diffs),
                    None => {
                        if !skip_paths.iter().any(|p| p == &child_path) {
                            diffs.push(format!("missing field at {child_path}"));
                        }
                    }
                }
            }
            for key in a.keys() {
                if !b.contains_key(key) {
                    let child_path = if path.is_empty() {
                        key.clone()
                    } else {
                        format!("{path}.{key}")
                    };
                    if !skip_paths.iter().any(|p| p == &child_path) {
                        diffs.push(format!("unexpected field at {child_path}"));
                    }
                }
            }
        }
        (Value::Array(a), Value::Array(b)) => {
            if a.len() != b.len() {
                diffs.push(format!(
                    "array length mismatch at {}: got {}, want {}",
                    if path.is_empty() { "$" } else { path },
                    a.len(),
                    b.len()
                ));
                return;
            }
            for (i, (av, bv)) in a.iter().zip(b.iter()).enumerate() {
                let child_path = format!("{path}[{i}]");
                diff_json(&child_path, av, bv, skip_paths, diffs);
            }
        }
        (a, b) if a == b => {}
        (a, b) => diffs.push(format!(
            "value mismatch at {}: got {a}, want {b}",
            if path.is_empty() { "$" } else { path }
        )),
    }
}
