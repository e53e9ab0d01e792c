// src/backend/registry.rs

//! Process-wide backend registry.
//!
//! A global, explicitly-populated map from backend name to `Arc<dyn
//! Backend>`. There is no static initializer, so [`register_default_backends`]
//! must be called once, early, by `main` and by test setup.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use once_cell::sync::Lazy;

use crate::backend::Backend;

/// Lookup table from backend name to handle. Entries live for the process
/// lifetime; there is no teardown phase.
pub struct BackendRegistry {
    backends: RwLock<HashMap<String, Arc<dyn Backend>>>,
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self {
            backends: RwLock::new(HashMap::new()),
        }
    }

    /// Insert or overwrite the backend registered under `backend.name()`.
    pub fn register(&self, backend: Arc<dyn Backend>) {
        let name = backend.name().to_string();
        self.backends.write().unwrap().insert(name, backend);
    }

    /// O(1) lookup; `None` for unknown names.
    pub fn lookup(&self, name: &str) -> Option<Arc<dyn Backend>> {
        self.backends.read().unwrap().get(name).cloned()
    }
}

/// The process-wide registry instance.
static GLOBAL_REGISTRY: Lazy<Arc<BackendRegistry>> = Lazy::new(|| Arc::new(BackendRegistry::new()));

/// An owning handle to the process-wide registry; cheap to clone (one
/// `Arc` bump), which is what lets [`crate::workflow::Workflow::run`] hand
/// the scheduler an `Arc<BackendRegistry>` without standing up its own.
pub fn global() -> Arc<BackendRegistry> {
    GLOBAL_REGISTRY.clone()
}

/// Register the three built-in backends (`bash`, `container`, `cluster`)
/// into the process-wide registry. Idempotent; safe to call more than once
/// (e.g. once from `main`, once from each test's setup).
pub fn register_default_backends() {
    let registry = global();
    registry.register(Arc::new(crate::backend::bash::BashBackend::new()));
    registry.register(Arc::new(crate::backend::container::ContainerBackend::new()));
    registry.register(Arc::new(crate::backend::cluster::ClusterBackend::new()));
}
