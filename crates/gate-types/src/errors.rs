//! Error types for the gate engine
//!
//! Per-requirement problems never surface here: unknown kinds, unknown
//! relations, and unregistered custom checks all become failed
//! `CheckOutcome`s so sibling requirements still evaluate. These errors
//! cover what genuinely aborts a call.

use crate::SubjectId;

/// Errors that can abort a gate engine operation
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    /// A decision without a recorded audit is invalid, so a failed
    /// audit write propagates out of evaluate()
    #[error("Failed to write gate evaluation audit record: {0}")]
    AuditWrite(String),

    #[error("Subject {0} has no current stage")]
    SubjectStageNotSet(SubjectId),

    #[error("Custom check strategy not registered: {strategy}")]
    UnknownCustomCheck { strategy: String },

    #[error("Custom check '{strategy}' does not support capability '{capability}'")]
    UnknownCapability { strategy: String, capability: String },

    #[error("Invalid gate configuration: {0}")]
    InvalidConfiguration(String),
}

/// Result type alias for gate operations
pub type GateResult<T> = Result<T, GateError>;
