//! Error types for the costing engine
//!
//! Data-shape problems in profiles or resources never surface here: they
//! degrade to zero-cost or default-allocation line items. These errors are
//! reserved for caller contract violations.

use crate::models::ProfileStatus;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Requested status change is not part of the review workflow
    #[error("cannot move profile '{profile}' from {from} to {to}")]
    InvalidTransition {
        profile: String,
        from: ProfileStatus,
        to: ProfileStatus,
    },

    /// Profile failed validation; every problem is listed
    #[error("profile '{profile}' is invalid: {}", .problems.join("; "))]
    InvalidProfile {
        profile: String,
        problems: Vec<String>,
    },

    #[error("csv export failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("export I/O failed: {0}")]
    Io(#[from] std::io::Error),
}
