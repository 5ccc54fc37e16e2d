//! Stage-level queries: advance eligibility, blockers, per-gate status
//!
//! Everything here is repeated calls into the evaluator. The audited
//! methods persist one record per gate examined, exactly like single
//! gate evaluation: every inspection is audited. The `*_check`
//! counterparts are pure and write nothing; callers pick per call site.

use crate::{GateCheck, GateEvaluator, Subject};
use gate_types::{
    ActorId, EvaluationType, FailureReason, Gate, GateError, GateOutcome, GateResult,
};
use std::collections::BTreeMap;

/// A failing blocking gate with the reasons it fails
#[derive(Clone, Debug, serde::Serialize)]
pub struct GateBlockers {
    pub gate: Gate,
    pub failure_reasons: Vec<FailureReason>,
}

/// Per-gate summary for status displays
#[derive(Clone, Debug, serde::Serialize)]
pub struct GateStatusSummary {
    pub gate_key: String,
    pub name: String,
    pub passed: bool,
    pub is_blocking: bool,
    pub requirements_total: usize,
    pub requirements_passed: usize,
    pub blockers: Vec<String>,
}

impl GateEvaluator {
    fn current_stage_gates(&self, subject: &dyn Subject) -> GateResult<Vec<Gate>> {
        let stage = subject
            .stage()
            .ok_or_else(|| GateError::SubjectStageNotSet(subject.id()))?;
        Ok(self.store().gates_for_stage(&stage))
    }

    /// Evaluate every gate of the subject's current stage, keyed by
    /// gate key. One audit record per gate.
    pub fn evaluate_current_stage_gates(
        &self,
        subject: &dyn Subject,
        evaluated_by: Option<ActorId>,
    ) -> GateResult<BTreeMap<String, GateOutcome>> {
        let mut results = BTreeMap::new();
        for gate in self.current_stage_gates(subject)? {
            let outcome =
                self.evaluate(subject, &gate, evaluated_by.clone(), EvaluationType::Manual)?;
            results.insert(gate.gate_key.clone(), outcome);
        }
        Ok(results)
    }

    /// Whether the subject may advance past its current stage.
    ///
    /// Only blocking gates count; advisory gates are ignored. Evaluation
    /// is recorded as `Automatic` and short-circuits on the first
    /// failing gate, so later blocking gates are not evaluated or
    /// audited in that call.
    pub fn can_advance(&self, subject: &dyn Subject) -> GateResult<bool> {
        for gate in self.current_stage_gates(subject)? {
            if !gate.is_blocking {
                continue;
            }
            let outcome = self.evaluate(subject, &gate, None, EvaluationType::Automatic)?;
            if !outcome.passed {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Every failing blocking gate of the current stage, keyed by gate
    /// key. All blocking gates are evaluated and audited.
    pub fn blockers(&self, subject: &dyn Subject) -> GateResult<BTreeMap<String, GateBlockers>> {
        let mut blockers = BTreeMap::new();
        for gate in self.current_stage_gates(subject)? {
            if !gate.is_blocking {
                continue;
            }
            let outcome = self.evaluate(subject, &gate, None, EvaluationType::Automatic)?;
            if !outcome.passed {
                blockers.insert(
                    gate.gate_key.clone(),
                    GateBlockers {
                        gate,
                        failure_reasons: outcome.failure_reasons,
                    },
                );
            }
        }
        Ok(blockers)
    }

    /// Per-gate status for every current-stage gate, blocking or not,
    /// in stage sequence order. One audit record per gate.
    pub fn gate_status(
        &self,
        subject: &dyn Subject,
        evaluated_by: Option<ActorId>,
    ) -> GateResult<Vec<GateStatusSummary>> {
        let mut summaries = Vec::new();
        for gate in self.current_stage_gates(subject)? {
            let outcome =
                self.evaluate(subject, &gate, evaluated_by.clone(), EvaluationType::Manual)?;
            summaries.push(GateStatusSummary {
                gate_key: gate.gate_key.clone(),
                name: gate.name.clone(),
                passed: outcome.passed,
                is_blocking: gate.is_blocking,
                requirements_total: outcome.total_count(),
                requirements_passed: outcome.passed_count(),
                blockers: outcome.blocker_messages(),
            });
        }
        Ok(summaries)
    }

    /// Pure variant of [`Self::evaluate_current_stage_gates`]: no audit
    /// records
    pub fn check_current_stage_gates(
        &self,
        subject: &dyn Subject,
    ) -> GateResult<BTreeMap<String, GateCheck>> {
        let mut results = BTreeMap::new();
        for gate in self.current_stage_gates(subject)? {
            let check = self.check(subject, &gate);
            results.insert(gate.gate_key.clone(), check);
        }
        Ok(results)
    }

    /// Pure variant of [`Self::can_advance`]: checks every blocking
    /// gate, writes nothing
    pub fn can_advance_check(&self, subject: &dyn Subject) -> GateResult<bool> {
        let gates = self.current_stage_gates(subject)?;
        Ok(gates
            .iter()
            .filter(|gate| gate.is_blocking)
            .all(|gate| self.check(subject, gate).passed))
    }

    /// Pure variant of [`Self::gate_status`]: no audit records
    pub fn gate_status_check(&self, subject: &dyn Subject) -> GateResult<Vec<GateStatusSummary>> {
        let mut summaries = Vec::new();
        for gate in self.current_stage_gates(subject)? {
            let check = self.check(subject, &gate);
            let blockers = check
                .failure_reasons
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
                .collect();
            summaries.push(GateStatusSummary {
                gate_key: gate.gate_key.clone(),
                name: gate.name.clone(),
                passed: check.passed,
                is_blocking: gate.is_blocking,
                requirements_total: check.total_count(),
                requirements_passed: check.passed_count(),
                blockers,
            });
        }
        Ok(summaries)
    }
}
