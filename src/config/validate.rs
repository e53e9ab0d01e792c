// src/config/validate.rs

use std::collections::HashSet;
use std::time::Duration;

use crate::assertions;
use crate::config::model::{RawAssertSpec, RawTaskSpec, RawWorkflowFile};
use crate::errors::{Result, WorkflowError};
use crate::model::{Assertion, Task};
use crate::workflow::Workflow;

impl TryFrom<RawWorkflowFile> for Workflow {
    type Error = WorkflowError;

    fn try_from(raw: RawWorkflowFile) -> Result<Self> {
        ensure_has_steps(&raw)?;
        ensure_unique_names(&raw)?;

        let mut workflow = Workflow::new(raw.name);
        if !raw.backend.is_empty() {
            workflow.backend = raw.backend;
        }
        workflow.env_map = raw.env_map;

        for raw_task in raw.steps {
            let task = Task::try_from(raw_task)?;
            workflow.add_task(task);
        }

        Ok(workflow)
    }
}

fn ensure_has_steps(raw: &RawWorkflowFile) -> Result<()> {
    if raw.steps.is_empty() {
        return Err(WorkflowError::Config(
            "workflow must contain at least one step".to_string(),
        ));
    }
    Ok(())
}

fn ensure_unique_names(raw: &RawWorkflowFile) -> Result<()> {
    let mut seen = HashSet::with_capacity(raw.steps.len());
    for task in &raw.steps {
        if task.name.is_empty() {
            return Err(WorkflowError::Config(
                "every step must have a non-empty name".to_string(),
            ));
        }
        if !seen.insert(task.name.as_str()) {
            return Err(WorkflowError::Config(format!(
                "duplicate task name '{}'",
                task.name
            )));
        }
    }
    Ok(())
}

impl TryFrom<RawTaskSpec> for Task {
    type Error = WorkflowError;

    fn try_from(raw: RawTaskSpec) -> Result<Self> {
        if raw.command.is_empty() {
            return Err(WorkflowError::Config(format!(
                "task '{}' has an empty command",
                raw.name
            )));
        }

        let timeout = parse_duration_opt(&raw.name, "timeout", raw.timeout)?.unwrap_or(Duration::ZERO);
        let retry_delay =
            parse_duration_opt(&raw.name, "retry_delay", raw.retry_delay)?.unwrap_or(Duration::ZERO);

        let mut asserts = Vec::with_capacity(raw.raw_asserts.len());
        for spec in raw.raw_asserts {
            asserts.push(build_assertion(&raw.name, spec)?);
        }

        Ok(Task {
            name: raw.name,
            command: raw.command,
            args: raw.args,
            depends: raw.depends,
            timeout,
            retries: raw.retries,
            retry_delay,
            env_map: raw.env_map,
            working_dir: raw.working_dir,
            image: raw.image,
            backend: raw.backend,
            asserts,
            exit_code: 0,
            output: String::new(),
            error: String::new(),
        })
    }
}

fn parse_duration_opt(task: &str, field: &str, raw: Option<String>) -> Result<Option<Duration>> {
    match raw {
        None => Ok(None),
        Some(s) if s.is_empty() => Ok(None),
        Some(s) => humantime::parse_duration(&s).map(Some).map_err(|e| {
            WorkflowError::Config(format!(
                "task '{task}': invalid {field} duration {s:?}: {e}"
            ))
        }),
    }
}

/// Build one [`Assertion`] from a `raw_asserts[]` entry. Exactly one "kind"
/// field is expected to be set; an entry with none set is a configuration
/// error.
fn build_assertion(task: &str, spec: RawAssertSpec) -> Result<Assertion> {
    if let Some(code) = spec.exit_code {
        return Ok(assertions::exit_code_equals(code));
    }
    if let Some(s) = spec.output_equals {
        return Ok(assertions::output_equals(s));
    }
    if let Some(s) = spec.output_contains {
        return Ok(assertions::output_contains(s));
    }
    if let Some(expected) = spec.output_json_equals {
        return Ok(assertions::output_json_equals(expected, spec.skip_json_nodes));
    }
    if let Some(pattern) = spec.output_matches_regexp {
        return Ok(assertions::output_matches_regex(pattern));
    }

    Err(WorkflowError::Config(format!(
        "task '{task}': raw_asserts entry has no recognized assertion kind"
    )))
}
