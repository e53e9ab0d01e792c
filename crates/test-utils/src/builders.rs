#![allow(dead_code)]

use std::collections::HashMap;
use std::time::Duration;

use iapetus::model::{Assertion, Task};
use iapetus::workflow::Workflow;

/// Builder for [`Task`] to simplify test setup.
pub struct TaskBuilder {
    task: Task,
}

impl TaskBuilder {
    pub fn new(name: &str, command: &str) -> Self {
        Self {
            task: Task::new(name, command),
        }
    }

    pub fn args(mut self, args: &[&str]) -> Self {
        self.task.args = args.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn depends(mut self, dep: &str) -> Self {
        self.task.depends.push(dep.to_string());
        self
    }

    pub fn timeout(mut self, d: Duration) -> Self {
        self.task.timeout = d;
        self
    }

    pub fn retries(mut self, n: u32) -> Self {
        self.task.retries = n;
        self
    }

    pub fn retry_delay(mut self, d: Duration) -> Self {
        self.task.retry_delay = d;
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.task.env_map.insert(key.to_string(), value.to_string());
        self
    }

    pub fn working_dir(mut self, dir: &str) -> Self {
        self.task.working_dir = Some(dir.to_string());
        self
    }

    pub fn image(mut self, image: &str) -> Self {
        self.task.image = Some(image.to_string());
        self
    }

    pub fn backend(mut self, name: &str) -> Self {
        self.task.backend = name.to_string();
        self
    }

    pub fn assert(mut self, assertion: Assertion) -> Self {
        self.task.asserts.push(assertion);
        self
    }

    pub fn build(self) -> Task {
        self.task
    }
}

/// Builder for [`Workflow`] to simplify test setup.
pub struct WorkflowBuilder {
    workflow: Workflow,
}

impl WorkflowBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            workflow: Workflow::new(name),
        }
    }

    pub fn backend(mut self, name: &str) -> Self {
        self.workflow.backend = name.to_string();
        self
    }

    pub fn env(mut self, env_map: HashMap<String, String>) -> Self {
        self.workflow.env_map = env_map;
        self
    }

    pub fn task(mut self, task: Task) -> Self {
        self.workflow.add_task(task);
        self
    }

    pub fn build(self) -> Workflow {
        self.workflow
    }
}
