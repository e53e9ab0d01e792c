// src/dag/graph.rs

//! In-memory DAG of tasks keyed by name.
//!
//! Cycle/missing-dependency detection in [`DagGraph::validate`] is built on
//! `petgraph`'s toposort. [`DagGraph::topological_order`] is a hand-rolled
//! Kahn's algorithm over a copy of the in-degree map, mirroring the
//! dependency bookkeeping the scheduler itself performs per-run.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::RwLock;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::errors::{Result, WorkflowError};
use crate::model::Task;

struct Node {
    task: Task,
    deps: Vec<String>,
}

#[derive(Default)]
struct Inner {
    nodes: HashMap<String, Node>,
    /// name -> ordered list of names that depend on it.
    forward_edges: HashMap<String, Vec<String>>,
}

/// Directed acyclic graph of tasks.
///
/// Reads and writes are guarded by a single `RwLock` so that validation and
/// dependency/dependent lookups can run concurrently with each other (but
/// never concurrently with a mutating `add`).
pub struct DagGraph {
    inner: RwLock<Inner>,
}

impl Default for DagGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl DagGraph {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Insert a task as a node. Does not validate that its dependencies
    /// exist; call [`DagGraph::validate`] once all tasks have been added.
    pub fn add(&self, task: Task) -> Result<()> {
        if task.name.is_empty() {
            return Err(WorkflowError::Config(
                "task name must not be empty".to_string(),
            ));
        }

        let mut inner = self.inner.write().unwrap();
        if inner.nodes.contains_key(&task.name) {
            return Err(WorkflowError::DagDuplicateTask(task.name.clone()));
        }

        let name = task.name.clone();
        let deps = task.depends.clone();

        inner.forward_edges.entry(name.clone()).or_default();
        for dep in &deps {
            inner.forward_edges.entry(dep.clone()).or_default().push(name.clone());
        }
        inner.nodes.insert(name, Node { task, deps });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap().nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All task names currently in the graph.
    pub fn task_names(&self) -> Vec<String> {
        self.inner.read().unwrap().nodes.keys().cloned().collect()
    }

    /// Clone of a single task's current data.
    pub fn task(&self, name: &str) -> Option<Task> {
        self.inner.read().unwrap().nodes.get(name).map(|n| n.task.clone())
    }

    /// Consume the graph, returning every task keyed by name.
    pub fn into_tasks(self) -> HashMap<String, Task> {
        self.inner
            .into_inner()
            .unwrap()
            .nodes
            .into_iter()
            .map(|(name, node)| (name, node.task))
            .collect()
    }

    /// Direct dependencies of `name` (the tasks it must wait for).
    pub fn dependencies(&self, name: &str) -> Vec<String> {
        self.inner
            .read()
            .unwrap()
            .nodes
            .get(name)
            .map(|n| n.deps.clone())
            .unwrap_or_default()
    }

    /// Direct dependents of `name` (tasks that list it in their `depends`).
    pub fn dependents(&self, name: &str) -> Vec<String> {
        self.inner
            .read()
            .unwrap()
            .forward_edges
            .get(name)
            .cloned()
            .unwrap_or_default()
    }

    /// Verify every referenced dependency exists and that the graph is
    /// acyclic. A task depending on itself is a cycle of length one.
    pub fn validate(&self) -> Result<()> {
        let inner = self.inner.read().unwrap();

        for (name, node) in inner.nodes.iter() {
            for dep in &node.deps {
                if !inner.nodes.contains_key(dep) {
                    return Err(WorkflowError::DagMissingDependency(format!(
                        "task '{name}' depends on unknown task '{dep}'"
                    )));
                }
            }
        }

        // Edge direction dep -> dependent, matching `forward_edges`.
        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
        for name in inner.nodes.keys() {
            graph.add_node(name.as_str());
        }
        for (name, node) in inner.nodes.iter() {
            for dep in &node.deps {
                graph.add_edge(dep.as_str(), name.as_str(), ());
            }
        }

        if let Err(cycle) = toposort(&graph, None) {
            return Err(WorkflowError::DagCycle(format!(
                "cycle detected involving task '{}'",
                cycle.node_id()
            )));
        }

        Ok(())
    }

    /// Kahn's algorithm: repeatedly peel off zero-in-degree nodes. Assumes
    /// [`DagGraph::validate`] has already been called; if it hasn't and a
    /// cycle is present, fewer nodes than were registered will come out and
    /// this returns [`WorkflowError::DagCycle`].
    pub fn topological_order(&self) -> Result<Vec<String>> {
        let inner = self.inner.read().unwrap();

        let mut in_degree: HashMap<&str, usize> = HashMap::with_capacity(inner.nodes.len());
        for (name, node) in inner.nodes.iter() {
            in_degree.insert(name.as_str(), node.deps.len());
        }

        let mut queue: VecDeque<&str> = in_degree
            .iter()
            .filter(|(_, °)| *deg == 0)
            .map(|(name, _)| *name)
            .collect();

        let mut order = Vec::with_capacity(inner.nodes.len());
        let mut seen: HashSet<&str> = HashSet::new();

        while let Some(name) = queue.pop_front() {
            if !seen.insert(name) {
                continue;
            }
            order.push(name.to_string());

            if let Some(dependents) = inner.forward_edges.get(name) {
                for dependent in dependents {
                    if let Some(deg) = in_degree.get_mut(dependent.as_str()) {
                        *deg -= 1;
                        if *deg == 0 {
                            queue.push_back(dependent.as_str());
                        }
                    }
                }
            }
        }

        if order.len() != inner.nodes.len() {
            return Err(WorkflowError::DagCycle(
                "cycle detected in task dependency graph".to_string(),
            ));
        }

        Ok(order)
    }
}
