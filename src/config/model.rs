// src/config/model.rs

//! Raw, `serde`-derived shape of a workflow YAML file: a top-level file
//! struct plus a per-task struct, both with `#[serde(default)]` so every
//! field is optional at the YAML layer and gets defaulted or rejected
//! during validation instead.

use std::collections::HashMap;

use serde::Deserialize;

/// Top-level shape of a workflow YAML file.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawWorkflowFile {
    pub name: String,
    pub backend: String,
    pub env_map: HashMap<String, String>,
    pub steps: Vec<RawTaskSpec>,
}

/// Raw shape of a single `steps[]` entry.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawTaskSpec {
    pub name: String,
    pub command: String,
    pub args: Vec<String>,
    /// Duration string, e.g. `"5s"`; parsed via `humantime` during
    /// validation.
    pub timeout: Option<String>,
    pub retries: u32,
    /// Duration string; parsed via `humantime` during validation.
    pub retry_delay: Option<String>,
    pub depends: Vec<String>,
    pub env_map: HashMap<String, String>,
    pub working_dir: Option<String>,
    pub image: Option<String>,
    pub backend: String,
    pub raw_asserts: Vec<RawAssertSpec>,
}

/// One entry of `raw_asserts[]`. Exactly one of the "kind" fields must be
/// set; `skip_json_nodes` is only meaningful alongside `output_json_equals`.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawAssertSpec {
    pub exit_code: Option<i32>,
    pub output_equals: Option<String>,
    pub output_contains: Option<String>,
    pub output_json_equals: Option<String>,
    pub skip_json_nodes: Vec<String>,
    pub output_matches_regexp: Option<String>,
}
