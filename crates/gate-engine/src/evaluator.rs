//! Gate evaluator: the orchestrator behind every gate decision
//!
//! `evaluate()` checks each active requirement of a gate, ANDs the
//! results, snapshots the subject's context, and persists exactly one
//! audit record, even for a gate with zero requirements. `check()` is
//! the pure counterpart for callers who want to inspect without leaving
//! an audit trail.
//!
//! The evaluator holds no per-subject state and takes no locks. Callers
//! who advance a stage after a passing check own the mutual exclusion
//! around that sequence.

use crate::{AuditSink, GateStore, RequirementChecker, Subject};
use chrono::Utc;
use gate_types::{
    ActorId, CheckOutcome, EvaluationType, FailureReason, Gate, GateEvaluation, GateOutcome,
    GateRequirement, GateResult, RequirementId,
};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Subject fields copied into every audit context snapshot
const CONTEXT_FIELDS: &[&str] = &["project_number", "name", "partner_id", "design_approved_at"];

/// Evaluates gates against subjects and records the audit trail
pub struct GateEvaluator {
    checker: RequirementChecker,
    store: Arc<dyn GateStore>,
    audit: Arc<dyn AuditSink>,
}

impl GateEvaluator {
    pub fn new(
        checker: RequirementChecker,
        store: Arc<dyn GateStore>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            checker,
            store,
            audit,
        }
    }

    pub fn store(&self) -> &Arc<dyn GateStore> {
        &self.store
    }

    pub fn checker(&self) -> &RequirementChecker {
        &self.checker
    }

    /// Evaluate a gate and persist the audit record.
    ///
    /// Requirement failures never abort the call; only a failed audit
    /// write does.
    pub fn evaluate(
        &self,
        subject: &dyn Subject,
        gate: &Gate,
        evaluated_by: Option<ActorId>,
        evaluation_type: EvaluationType,
    ) -> GateResult<GateOutcome> {
        let requirements = self.store.active_requirements(&gate.id);
        let (passed, results, failures) = self.run_requirements(subject, &requirements);

        let evaluation = GateEvaluation::new(
            gate.id.clone(),
            subject.id(),
            passed,
            evaluation_type,
        )
        .with_evaluated_by(evaluated_by)
        .with_requirement_results(results.clone())
        .with_failure_reasons(failures.clone())
        .with_context(context_snapshot(subject));

        let evaluation = self.audit.record(evaluation)?;

        tracing::debug!(
            gate_key = %gate.gate_key,
            subject_id = %subject.id(),
            passed,
            evaluation_type = %evaluation_type,
            "Gate evaluated"
        );

        Ok(GateOutcome {
            passed,
            gate: gate.clone(),
            evaluation,
            requirement_results: results,
            failure_reasons: failures,
        })
    }

    /// Check a gate without writing an audit record.
    ///
    /// Same verdict logic as [`Self::evaluate`]; no side effects.
    pub fn check(&self, subject: &dyn Subject, gate: &Gate) -> GateCheck {
        let requirements = self.store.active_requirements(&gate.id);
        let (passed, results, failures) = self.run_requirements(subject, &requirements);
        GateCheck {
            passed,
            gate: gate.clone(),
            requirement_results: results,
            failure_reasons: failures,
        }
    }

    fn run_requirements(
        &self,
        subject: &dyn Subject,
        requirements: &[GateRequirement],
    ) -> (
        bool,
        BTreeMap<RequirementId, CheckOutcome>,
        Vec<FailureReason>,
    ) {
        let mut results = BTreeMap::new();
        let mut failures = Vec::new();
        let mut passed = true;

        for requirement in requirements {
            let outcome = self.checker.check(subject, requirement);
            if !outcome.passed {
                passed = false;
                failures.push(FailureReason {
                    requirement_id: requirement.id.clone(),
                    error_message: requirement.error_message.clone(),
                    help_text: requirement.help_text.clone(),
                    action: requirement.action.clone(),
                    check_message: outcome.message.clone(),
                });
            }
            results.insert(requirement.id.clone(), outcome);
        }

        (passed, results, failures)
    }
}

/// Pure gate check result: the verdict without a persisted record
#[derive(Clone, Debug, serde::Serialize)]
pub struct GateCheck {
    pub passed: bool,
    pub gate: Gate,
    pub requirement_results: BTreeMap<RequirementId, CheckOutcome>,
    pub failure_reasons: Vec<FailureReason>,
}

impl GateCheck {
    pub fn total_count(&self) -> usize {
        self.requirement_results.len()
    }

    pub fn passed_count(&self) -> usize {
        self.requirement_results.values().filter(|r| r.passed).count()
    }
}

/// Copy the audit context from the subject: a fixed field list plus
/// stage, room count, and the snapshot timestamp. Values are cloned,
/// never referenced.
fn context_snapshot(subject: &dyn Subject) -> Map<String, Value> {
    let mut context = Map::new();
    context.insert("subject_id".into(), Value::String(subject.id().to_string()));
    context.insert(
        "stage_id".into(),
        subject
            .stage()
            .map(|stage| Value::String(stage.to_string()))
            .unwrap_or(Value::Null),
    );
    for field in CONTEXT_FIELDS {
        context.insert(
            (*field).to_string(),
            subject.field(field).unwrap_or(Value::Null),
        );
    }
    context.insert(
        "room_count".into(),
        subject
            .relation_count("rooms")
            .map(Value::from)
            .unwrap_or(Value::Null),
    );
    context.insert(
        "snapshot_at".into(),
        Value::String(Utc::now().to_rfc3339()),
    );
    context
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CustomCheckRegistry, InMemoryAuditSink, InMemoryGateStore, StaticSubject};
    use gate_types::{ComparisonOp, GateRequirement, RequirementKind, StageId, TargetEntity};

    fn field_not_null(gate: &Gate, field: &str, error: &str, sequence: u32) -> GateRequirement {
        GateRequirement::new(
            gate.id.clone(),
            RequirementKind::FieldNotNull {
                target: TargetEntity::Subject,
                field: field.into(),
            },
            error,
        )
        .with_sequence(sequence)
    }

    struct Harness {
        evaluator: GateEvaluator,
        audit: Arc<InMemoryAuditSink>,
    }

    fn harness(store: InMemoryGateStore) -> Harness {
        let audit = Arc::new(InMemoryAuditSink::new());
        let evaluator = GateEvaluator::new(
            RequirementChecker::new(CustomCheckRegistry::with_builtin_checks()),
            Arc::new(store),
            audit.clone(),
        );
        Harness { evaluator, audit }
    }

    fn design_stage() -> StageId {
        StageId::new("design")
    }

    #[test]
    fn test_evaluate_passes_when_all_requirements_pass() {
        let gate = Gate::new("design_lock", design_stage(), "Design Lock");
        let store = InMemoryGateStore::new()
            .with_gate(gate.clone())
            .with_requirement(field_not_null(&gate, "name", "Name required", 1))
            .with_requirement(field_not_null(&gate, "description", "Description required", 2));
        let h = harness(store);

        let subject = StaticSubject::new("p1")
            .with_stage(design_stage())
            .with_field("name", "Test Project")
            .with_field("description", "Has description");

        let outcome = h
            .evaluator
            .evaluate(&subject, &gate, None, EvaluationType::Manual)
            .unwrap();

        assert!(outcome.passed);
        assert!(outcome.failure_reasons.is_empty());
        assert_eq!(outcome.total_count(), 2);
    }

    #[test]
    fn test_evaluate_fails_when_any_requirement_fails() {
        let gate = Gate::new("design_lock", design_stage(), "Design Lock");
        let store = InMemoryGateStore::new()
            .with_gate(gate.clone())
            .with_requirement(field_not_null(&gate, "name", "Name required", 1))
            .with_requirement(field_not_null(&gate, "description", "Description required", 2));
        let h = harness(store);

        let subject = StaticSubject::new("p1")
            .with_stage(design_stage())
            .with_field("name", "Test Project")
            .with_field("description", Value::Null);

        let outcome = h
            .evaluator
            .evaluate(&subject, &gate, None, EvaluationType::Manual)
            .unwrap();

        assert!(!outcome.passed);
        assert_eq!(outcome.failure_reasons.len(), 1);
        assert_eq!(outcome.failure_reasons[0].error_message, "Description required");
        assert_eq!(outcome.passed_count() + outcome.failed_count(), outcome.total_count());
    }

    #[test]
    fn test_every_failing_requirement_carries_its_own_message() {
        let gate = Gate::new("design_lock", design_stage(), "Design Lock");
        let rooms = GateRequirement::new(
            gate.id.clone(),
            RequirementKind::RelationCount {
                relation: "rooms".into(),
                operator: ComparisonOp::Ge,
                expected: 1,
            },
            "At least one room required",
        )
        .with_sequence(2);
        let store = InMemoryGateStore::new()
            .with_gate(gate.clone())
            .with_requirement(field_not_null(&gate, "name", "Name required", 1))
            .with_requirement(rooms);
        let h = harness(store);

        let subject = StaticSubject::new("p1")
            .with_stage(design_stage())
            .with_field("name", "")
            .with_empty_relation("rooms");

        let outcome = h
            .evaluator
            .evaluate(&subject, &gate, None, EvaluationType::Manual)
            .unwrap();

        assert!(!outcome.passed);
        assert_eq!(outcome.failure_reasons.len(), 2);
        let messages: Vec<_> = outcome
            .failure_reasons
            .iter()
            .map(|reason| reason.error_message.as_str())
            .collect();
        assert_eq!(messages, vec!["Name required", "At least one room required"]);
    }

    #[test]
    fn test_evaluate_writes_one_audit_record() {
        let gate = Gate::new("empty", design_stage(), "Empty Gate");
        let h = harness(InMemoryGateStore::new().with_gate(gate.clone()));
        let subject = StaticSubject::new("p1").with_stage(design_stage());

        h.evaluator
            .evaluate(&subject, &gate, None, EvaluationType::Manual)
            .unwrap();

        // Zero requirements still produce a record
        assert_eq!(h.audit.count(), 1);
        let record = &h.audit.history()[0];
        assert!(record.passed);
        assert!(record.requirement_results.is_empty());
    }

    #[test]
    fn test_evaluate_zero_requirements_is_vacuous_pass() {
        let gate = Gate::new("empty", design_stage(), "Empty Gate");
        let h = harness(InMemoryGateStore::new().with_gate(gate.clone()));
        let subject = StaticSubject::new("p1").with_stage(design_stage());

        let outcome = h
            .evaluator
            .evaluate(&subject, &gate, None, EvaluationType::Manual)
            .unwrap();

        assert!(outcome.passed);
        assert_eq!(outcome.progress_percent(), 100.0);
        assert!(outcome.failure_reasons.is_empty());
    }

    #[test]
    fn test_evaluate_skips_inactive_requirements() {
        let gate = Gate::new("design_lock", design_stage(), "Design Lock");
        let store = InMemoryGateStore::new()
            .with_gate(gate.clone())
            .with_requirement(
                field_not_null(&gate, "description", "Description required", 1).active(false),
            );
        let h = harness(store);

        let subject = StaticSubject::new("p1")
            .with_stage(design_stage())
            .with_field("description", Value::Null);

        let outcome = h
            .evaluator
            .evaluate(&subject, &gate, None, EvaluationType::Manual)
            .unwrap();

        assert!(outcome.passed);
        assert_eq!(outcome.total_count(), 0);
    }

    #[test]
    fn test_evaluate_records_evaluation_type_and_actor() {
        let gate = Gate::new("g", design_stage(), "Gate");
        let h = harness(InMemoryGateStore::new().with_gate(gate.clone()));
        let subject = StaticSubject::new("p1").with_stage(design_stage());

        h.evaluator
            .evaluate(
                &subject,
                &gate,
                Some(ActorId::new("admin")),
                EvaluationType::Scheduled,
            )
            .unwrap();

        let record = &h.audit.history()[0];
        assert_eq!(record.evaluation_type, EvaluationType::Scheduled);
        assert_eq!(record.evaluated_by, Some(ActorId::new("admin")));
    }

    #[test]
    fn test_requirement_results_cover_active_set_exactly() {
        let gate = Gate::new("design_lock", design_stage(), "Design Lock");
        let req_name = field_not_null(&gate, "name", "Name required", 1);
        let req_rooms = GateRequirement::new(
            gate.id.clone(),
            RequirementKind::RelationCount {
                relation: "rooms".into(),
                operator: ComparisonOp::Ge,
                expected: 1,
            },
            "At least one room required",
        )
        .with_sequence(2);

        let store = InMemoryGateStore::new()
            .with_gate(gate.clone())
            .with_requirement(req_name.clone())
            .with_requirement(req_rooms.clone());
        let h = harness(store);

        let subject = StaticSubject::new("p1")
            .with_stage(design_stage())
            .with_field("name", "Kitchen Remodel")
            .with_relation_size("rooms", 2);

        let outcome = h
            .evaluator
            .evaluate(&subject, &gate, None, EvaluationType::Manual)
            .unwrap();

        assert!(outcome.passed);
        assert!(outcome.requirement_results.contains_key(&req_name.id));
        assert!(outcome.requirement_results.contains_key(&req_rooms.id));
        assert_eq!(outcome.requirement_results.len(), 2);
    }

    #[test]
    fn test_failing_requirements_carry_configured_metadata() {
        let gate = Gate::new("design_lock", design_stage(), "Design Lock");
        let requirement = field_not_null(&gate, "description", "Description is required", 1)
            .with_help_text("Add a project description")
            .with_action("Edit Project", "projects.edit");
        let store = InMemoryGateStore::new()
            .with_gate(gate.clone())
            .with_requirement(requirement.clone());
        let h = harness(store);

        let subject = StaticSubject::new("p1")
            .with_stage(design_stage())
            .with_field("description", Value::Null);

        let outcome = h
            .evaluator
            .evaluate(&subject, &gate, None, EvaluationType::Manual)
            .unwrap();

        let failure = &outcome.failure_reasons[0];
        assert_eq!(failure.requirement_id, requirement.id);
        assert_eq!(failure.error_message, "Description is required");
        assert_eq!(failure.help_text, "Add a project description");
        assert_eq!(failure.action.as_ref().unwrap().label, "Edit Project");
        assert!(failure.check_message.contains("is empty"));
    }

    #[test]
    fn test_context_snapshot_contents() {
        let gate = Gate::new("g", design_stage(), "Gate");
        let h = harness(InMemoryGateStore::new().with_gate(gate.clone()));

        let subject = StaticSubject::new("p1")
            .with_stage(design_stage())
            .with_field("project_number", "P001")
            .with_field("partner_id", "partner-9")
            .with_relation_size("rooms", 2);

        let outcome = h
            .evaluator
            .evaluate(&subject, &gate, None, EvaluationType::Manual)
            .unwrap();

        let context = &outcome.evaluation.context;
        assert_eq!(context["subject_id"], "p1");
        assert_eq!(context["project_number"], "P001");
        assert_eq!(context["stage_id"], "design");
        assert_eq!(context["partner_id"], "partner-9");
        assert_eq!(context["room_count"], 2);
        assert!(context.contains_key("snapshot_at"));
    }

    #[test]
    fn test_check_matches_evaluate_and_writes_nothing() {
        let gate = Gate::new("design_lock", design_stage(), "Design Lock");
        let store = InMemoryGateStore::new()
            .with_gate(gate.clone())
            .with_requirement(field_not_null(&gate, "name", "Name required", 1));
        let h = harness(store);

        let subject = StaticSubject::new("p1")
            .with_stage(design_stage())
            .with_field("name", Value::Null);

        let check = h.evaluator.check(&subject, &gate);
        assert!(!check.passed);
        assert_eq!(check.total_count(), 1);
        assert_eq!(check.passed_count(), 0);
        assert_eq!(h.audit.count(), 0);

        let outcome = h
            .evaluator
            .evaluate(&subject, &gate, None, EvaluationType::Manual)
            .unwrap();
        assert_eq!(outcome.passed, check.passed);
        assert_eq!(h.audit.count(), 1);
    }

    #[test]
    fn test_audit_write_failure_is_fatal() {
        struct FailingSink;
        impl AuditSink for FailingSink {
            fn record(&self, _evaluation: GateEvaluation) -> GateResult<GateEvaluation> {
                Err(gate_types::GateError::AuditWrite("disk full".into()))
            }
        }

        let gate = Gate::new("g", design_stage(), "Gate");
        let evaluator = GateEvaluator::new(
            RequirementChecker::new(CustomCheckRegistry::new()),
            Arc::new(InMemoryGateStore::new().with_gate(gate.clone())),
            Arc::new(FailingSink),
        );
        let subject = StaticSubject::new("p1").with_stage(design_stage());

        let result = evaluator.evaluate(&subject, &gate, None, EvaluationType::Manual);
        assert!(matches!(result, Err(gate_types::GateError::AuditWrite(_))));
    }
}
