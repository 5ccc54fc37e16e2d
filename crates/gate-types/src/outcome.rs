//! Evaluation outcomes: single-requirement and gate-level results
//!
//! Both are immutable value objects. `CheckOutcome` is transient;
//! `GateOutcome` wraps the persisted audit record along with derived
//! counts and progress.

use crate::{Gate, GateEvaluation, RemediationAction, RequirementId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Result of checking a single requirement
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CheckOutcome {
    pub passed: bool,
    pub message: String,
    /// Open diagnostic payload (field values, counts, error text)
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub details: Map<String, Value>,
}

impl CheckOutcome {
    pub fn pass(message: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: message.into(),
            details: Map::new(),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: message.into(),
            details: Map::new(),
        }
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}

/// Why a requirement failed, combining configured metadata with the
/// live check message
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FailureReason {
    pub requirement_id: RequirementId,
    pub error_message: String,
    #[serde(default)]
    pub help_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<RemediationAction>,
    /// What the strategy reported at evaluation time
    pub check_message: String,
}

/// Aggregate verdict for one gate evaluation, including the persisted
/// audit record
#[derive(Clone, Debug)]
pub struct GateOutcome {
    pub passed: bool,
    pub gate: Gate,
    pub evaluation: GateEvaluation,
    pub requirement_results: BTreeMap<RequirementId, CheckOutcome>,
    pub failure_reasons: Vec<FailureReason>,
}

impl GateOutcome {
    pub fn total_count(&self) -> usize {
        self.requirement_results.len()
    }

    pub fn passed_count(&self) -> usize {
        self.requirement_results.values().filter(|r| r.passed).count()
    }

    pub fn failed_count(&self) -> usize {
        self.requirement_results.values().filter(|r| !r.passed).count()
    }

    /// Percentage of requirements passing, rounded to one decimal.
    /// A gate with zero requirements is 100.0 by definition.
    pub fn progress_percent(&self) -> f64 {
        let total = self.total_count();
        if total == 0 {
            return 100.0;
        }
        let raw = self.passed_count() as f64 / total as f64 * 100.0;
        (raw * 10.0).round() / 10.0
    }

    /// Flattened human-readable blocker list. Falls back from the
    /// configured error message to the live check message to a generic
    /// placeholder.
    pub fn blocker_messages(&self) -> Vec<String> {
        self.failure_reasons
            .iter()
            .map(|reason| {
                if !reason.error_message.is_empty() {
                    reason.error_message.clone()
                } else if !reason.check_message.is_empty() {
                    reason.check_message.clone()
                } else {
                    "Requirement not met".to_string()
                }
            })
            .collect()
    }
}
