// src/config/mod.rs

//! YAML configuration loading: parse into a raw, `serde`-derived shape,
//! then validate/convert it into the in-memory [`crate::workflow::Workflow`]
//! model.
//!
//! Split into `config::loader` (file IO + raw deserialization) and
//! `config::validate` (the `TryFrom` that runs structural validation and
//! produces the checked type).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path};
pub use model::{RawAssertSpec, RawTaskSpec, RawWorkflowFile};
