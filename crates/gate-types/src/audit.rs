//! Evaluation audit records: the permanent artifact of one evaluate() call
//!
//! Every evaluation call produces exactly one record, even when the gate
//! has zero requirements. Records are append-only; the engine never
//! mutates or deletes them. The `context` snapshot captures subject field
//! values at evaluation time so a decision can be replayed later without
//! depending on the subject's current state.

use crate::{ActorId, CheckOutcome, EvaluationId, FailureReason, GateId, RequirementId, SubjectId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Why an evaluation occurred
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationType {
    /// A user asked for it from the UI
    Manual,
    /// Triggered by the engine's own advance-eligibility checks
    Automatic,
    /// Triggered by a scheduled re-evaluation job
    Scheduled,
}

impl std::fmt::Display for EvaluationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Manual => "manual",
            Self::Automatic => "automatic",
            Self::Scheduled => "scheduled",
        };
        write!(f, "{name}")
    }
}

/// The persisted outcome of one gate evaluation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GateEvaluation {
    pub id: EvaluationId,
    pub gate_id: GateId,
    pub subject_id: SubjectId,
    pub passed: bool,
    pub evaluated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluated_by: Option<ActorId>,
    pub evaluation_type: EvaluationType,
    /// One entry per active requirement of the gate at evaluation time
    pub requirement_results: BTreeMap<RequirementId, CheckOutcome>,
    /// Exactly the failing subset of `requirement_results`, in
    /// requirement sequence order
    pub failure_reasons: Vec<FailureReason>,
    /// Flat snapshot of subject field values, not a live reference
    pub context: Map<String, Value>,
}

impl GateEvaluation {
    pub fn new(
        gate_id: GateId,
        subject_id: SubjectId,
        passed: bool,
        evaluation_type: EvaluationType,
    ) -> Self {
        Self {
            id: EvaluationId::generate(),
            gate_id,
            subject_id,
            passed,
            evaluated_at: Utc::now(),
            evaluated_by: None,
            evaluation_type,
            requirement_results: BTreeMap::new(),
            failure_reasons: Vec::new(),
            context: Map::new(),
        }
    }

    pub fn with_evaluated_by(mut self, actor: Option<ActorId>) -> Self {
        self.evaluated_by = actor;
        self
    }

    pub fn with_requirement_results(
        mut self,
        results: BTreeMap<RequirementId, CheckOutcome>,
    ) -> Self {
        self.requirement_results = results;
        self
    }

    pub fn with_failure_reasons(mut self, reasons: Vec<FailureReason>) -> Self {
        self.failure_reasons = reasons;
        self
    }

    pub fn with_context(mut self, context: Map<String, Value>) -> Self {
        self.context = context;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluation_type_serde_names() {
        let json = serde_json::to_string(&EvaluationType::Automatic).unwrap();
        assert_eq!(json, "\"automatic\"");
        let back: EvaluationType = serde_json::from_str("\"scheduled\"").unwrap();
        assert_eq!(back, EvaluationType::Scheduled);
    }

    #[test]
    fn test_record_round_trip() {
        let record = GateEvaluation::new(
            GateId::new("g1"),
            SubjectId::new("p1"),
            true,
            EvaluationType::Manual,
        )
        .with_evaluated_by(Some(ActorId::new("admin")));

        let json = serde_json::to_string(&record).unwrap();
        let back: GateEvaluation = serde_json::from_str(&json).unwrap();
        assert_eq!(back.gate_id, record.gate_id);
        assert!(back.passed);
        assert_eq!(back.evaluated_by, Some(ActorId::new("admin")));
    }
}
