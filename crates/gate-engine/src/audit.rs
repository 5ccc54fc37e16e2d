//! Audit sink: append-only storage for evaluation records
//!
//! The audit trail is the engine's only write. A failed append is fatal
//! to the evaluation call: a verdict that was never recorded does not
//! count as a decision.

use gate_types::{GateEvaluation, GateId, GateResult, SubjectId};
use std::sync::Mutex;

/// Append-only sink for gate evaluation records
pub trait AuditSink: Send + Sync {
    /// Persist one evaluation record. Returns the stored record.
    fn record(&self, evaluation: GateEvaluation) -> GateResult<GateEvaluation>;
}

/// In-memory audit sink with read access for history and tests
#[derive(Debug, Default)]
pub struct InMemoryAuditSink {
    records: Mutex<Vec<GateEvaluation>>,
}

impl InMemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.records.lock().unwrap_or_else(std::sync::PoisonError::into_inner).len()
    }

    /// All records, oldest first
    pub fn history(&self) -> Vec<GateEvaluation> {
        self.records.lock().unwrap_or_else(std::sync::PoisonError::into_inner).clone()
    }

    /// Records for one subject, oldest first
    pub fn history_for_subject(&self, subject_id: &SubjectId) -> Vec<GateEvaluation> {
        self.records
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .iter()
            .filter(|record| &record.subject_id == subject_id)
            .cloned()
            .collect()
    }

    /// Records for one gate, oldest first
    pub fn history_for_gate(&self, gate_id: &GateId) -> Vec<GateEvaluation> {
        self.records
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .iter()
            .filter(|record| &record.gate_id == gate_id)
            .cloned()
            .collect()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&self, evaluation: GateEvaluation) -> GateResult<GateEvaluation> {
        tracing::info!(
            evaluation_id = %evaluation.id,
            gate_id = %evaluation.gate_id,
            subject_id = %evaluation.subject_id,
            passed = evaluation.passed,
            "Gate evaluation recorded"
        );
        self.records
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(evaluation.clone());
        Ok(evaluation)
    }
}
