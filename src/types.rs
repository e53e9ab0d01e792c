// src/types.rs

//! Small shared value types used across the backend and executor layers.

use std::fmt;

/// Availability of a backend, as reported by [`crate::backend::Backend::status`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendStatus {
    Available,
    Unavailable { reason: String },
}

impl fmt::Display for BackendStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendStatus::Available => write!(f, "available"),
            BackendStatus::Unavailable { reason } => write!(f, "unavailable: {reason}"),
        }
    }
}
