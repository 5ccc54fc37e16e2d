//! Requirement checker: routes each requirement kind to its check logic
//!
//! Every check is a pure read of the subject plus the requirement's
//! stored parameters. The dispatcher is the isolation boundary: unknown
//! kinds, unknown relations, and unregistered custom checks become
//! failed outcomes, and a panic inside one check is caught, logged, and
//! converted so sibling requirements still evaluate.

use crate::value::{as_f64, display, loose_eq, normalize};
use crate::{CustomCheckRegistry, Subject, TargetField};
use gate_types::{
    CheckOutcome, ComparisonOp, GateRequirement, PaymentMilestone, RequirementKind, TargetEntity,
};
use serde_json::Value;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Evaluates individual gate requirements by kind
#[derive(Debug, Default)]
pub struct RequirementChecker {
    registry: CustomCheckRegistry,
}

impl RequirementChecker {
    pub fn new(registry: CustomCheckRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &CustomCheckRegistry {
        &self.registry
    }

    /// Check a single requirement against a subject.
    ///
    /// Never panics past this boundary: a panic inside the check is
    /// converted into a failed outcome carrying the error text.
    pub fn check(&self, subject: &dyn Subject, requirement: &GateRequirement) -> CheckOutcome {
        let result = catch_unwind(AssertUnwindSafe(|| self.dispatch(subject, requirement)));

        match result {
            Ok(outcome) => outcome,
            Err(panic) => {
                let error = panic_text(&panic);
                tracing::error!(
                    requirement_id = %requirement.id,
                    subject_id = %subject.id(),
                    error = %error,
                    "Gate requirement check failed"
                );
                CheckOutcome::fail(format!("Error checking requirement: {error}"))
                    .with_detail("error", error)
            }
        }
    }

    fn dispatch(&self, subject: &dyn Subject, requirement: &GateRequirement) -> CheckOutcome {
        match &requirement.kind {
            RequirementKind::FieldNotNull { target, field } => {
                self.check_field_not_null(subject, *target, field)
            }
            RequirementKind::FieldEquals {
                target,
                field,
                expected,
            } => self.check_field_equals(subject, *target, field, expected),
            RequirementKind::FieldGreaterThan {
                target,
                field,
                threshold,
            } => self.check_field_greater_than(subject, *target, field, threshold),
            RequirementKind::RelationExists { relation } => {
                self.check_relation_exists(subject, relation)
            }
            RequirementKind::RelationCount {
                relation,
                operator,
                expected,
            } => self.check_relation_count(subject, relation, *operator, *expected),
            RequirementKind::AllChildrenPass {
                relation,
                field,
                expected,
            } => self.check_all_children_pass(subject, relation, field, expected),
            RequirementKind::DocumentUploaded { category } => {
                self.check_document_uploaded(subject, category)
            }
            RequirementKind::PaymentReceived { milestone } => {
                self.check_payment_received(subject, *milestone)
            }
            RequirementKind::TaskCompleted { task_type } => {
                self.check_task_completed(subject, task_type)
            }
            RequirementKind::CustomCheck {
                strategy,
                capability,
            } => self.check_custom(subject, requirement, strategy, capability),
            RequirementKind::Unsupported { tag } => {
                tracing::warn!(
                    requirement_id = %requirement.id,
                    tag = %tag,
                    "Unknown requirement type"
                );
                CheckOutcome::fail(format!("Unknown requirement type: {tag}"))
            }
        }
    }

    fn check_field_not_null(
        &self,
        subject: &dyn Subject,
        target: TargetEntity,
        field: &str,
    ) -> CheckOutcome {
        let value = match subject.target_field(target, field) {
            TargetField::Missing => {
                return CheckOutcome::fail(format!("Target entity '{target}' not found"))
            }
            TargetField::Value(value) => value,
        };

        let passed = match &value {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.is_empty(),
            Some(_) => true,
        };

        let message = if passed {
            format!("Field '{field}' has value")
        } else {
            format!("Field '{field}' is empty")
        };
        CheckOutcome {
            passed,
            message,
            details: Default::default(),
        }
        .with_detail("field", field)
        .with_detail("value", value.unwrap_or(Value::Null))
    }

    fn check_field_equals(
        &self,
        subject: &dyn Subject,
        target: TargetEntity,
        field: &str,
        expected: &Value,
    ) -> CheckOutcome {
        let actual = match subject.target_field(target, field) {
            TargetField::Missing => {
                return CheckOutcome::fail(format!("Target entity '{target}' not found"))
            }
            TargetField::Value(value) => value.unwrap_or(Value::Null),
        };

        let passed = loose_eq(&actual, expected);
        let message = if passed {
            format!("Field '{field}' equals expected value")
        } else {
            format!("Field '{field}' does not equal expected value")
        };
        CheckOutcome {
            passed,
            message,
            details: Default::default(),
        }
        .with_detail("field", field)
        .with_detail("expected", expected.clone())
        .with_detail("actual", actual)
    }

    fn check_field_greater_than(
        &self,
        subject: &dyn Subject,
        target: TargetEntity,
        field: &str,
        threshold: &Value,
    ) -> CheckOutcome {
        let value = match subject.target_field(target, field) {
            TargetField::Missing => {
                return CheckOutcome::fail(format!("Target entity '{target}' not found"))
            }
            TargetField::Value(value) => value.unwrap_or(Value::Null),
        };

        // Match the original behavior: both sides coerce to float,
        // non-numeric coerces to zero
        let actual = as_f64(&value).unwrap_or(0.0);
        let expected = as_f64(threshold).unwrap_or(0.0);
        let passed = actual > expected;

        let message = if passed {
            format!("Field '{field}' is greater than {expected}")
        } else {
            format!("Field '{field}' ({actual}) is not greater than {expected}")
        };
        CheckOutcome {
            passed,
            message,
            details: Default::default(),
        }
        .with_detail("field", field)
        .with_detail("expected", expected)
        .with_detail("actual", actual)
    }

    fn check_relation_exists(&self, subject: &dyn Subject, relation: &str) -> CheckOutcome {
        let Some(count) = subject.relation_count(relation) else {
            return CheckOutcome::fail(format!(
                "Relation '{relation}' does not exist on subject"
            ));
        };

        let exists = count > 0;
        let message = if exists {
            format!("Relation '{relation}' has records")
        } else {
            format!("Relation '{relation}' is empty")
        };
        CheckOutcome {
            passed: exists,
            message,
            details: Default::default(),
        }
        .with_detail("relation", relation)
        .with_detail("exists", exists)
    }

    fn check_relation_count(
        &self,
        subject: &dyn Subject,
        relation: &str,
        operator: ComparisonOp,
        expected: i64,
    ) -> CheckOutcome {
        let Some(count) = subject.relation_count(relation) else {
            return CheckOutcome::fail(format!(
                "Relation '{relation}' does not exist on subject"
            ));
        };

        let actual = count as i64;
        let passed = operator.apply(actual, expected);
        let message = if passed {
            format!("Relation '{relation}' count ({actual}) {operator} {expected}")
        } else {
            format!("Relation '{relation}' count ({actual}) does not satisfy {operator} {expected}")
        };
        CheckOutcome {
            passed,
            message,
            details: Default::default(),
        }
        .with_detail("relation", relation)
        .with_detail("count", actual)
        .with_detail("expected", expected)
        .with_detail("operator", operator.to_string())
    }

    fn check_all_children_pass(
        &self,
        subject: &dyn Subject,
        relation: &str,
        field: &str,
        expected: &Value,
    ) -> CheckOutcome {
        let Some(total) = subject.relation_count(relation) else {
            return CheckOutcome::fail(format!(
                "Relation '{relation}' does not exist on subject"
            ));
        };

        // Zero children is a fail, not a vacuous pass
        if total == 0 {
            return CheckOutcome::fail(format!("No {relation} found to check"));
        }

        let filter = normalize(expected);
        let Some(passing) = subject.relation_count_where(relation, field, &filter) else {
            return CheckOutcome::fail(format!(
                "Relation '{relation}' does not exist on subject"
            ));
        };

        let passed = passing == total;
        let rendered = display(expected);
        let message = if passed {
            format!("All {total} {relation} have {field} = {rendered}")
        } else {
            format!("{passing}/{total} {relation} have {field} = {rendered}")
        };
        CheckOutcome {
            passed,
            message,
            details: Default::default(),
        }
        .with_detail("relation", relation)
        .with_detail("field", field)
        .with_detail("passing", passing)
        .with_detail("total", total)
    }

    fn check_document_uploaded(&self, subject: &dyn Subject, category: &str) -> CheckOutcome {
        let found = subject.document_count(category) > 0;
        let message = if found {
            format!("Document type '{category}' is uploaded")
        } else {
            format!("Document type '{category}' not found")
        };
        CheckOutcome {
            passed: found,
            message,
            details: Default::default(),
        }
        .with_detail("document_type", category)
        .with_detail("found", found)
    }

    fn check_payment_received(
        &self,
        subject: &dyn Subject,
        milestone: PaymentMilestone,
    ) -> CheckOutcome {
        let Some(order) = subject.primary_order() else {
            return CheckOutcome::fail("No sales order found");
        };

        let paid = match milestone {
            PaymentMilestone::Deposit => order.deposit_paid_at.is_some(),
            PaymentMilestone::Final => order.final_paid_at.is_some(),
        };

        let message = if paid {
            format!("Payment '{milestone}' received")
        } else {
            format!("Payment '{milestone}' not received")
        };
        CheckOutcome {
            passed: paid,
            message,
            details: Default::default(),
        }
        .with_detail("payment_type", milestone.to_string())
        .with_detail("received", paid)
    }

    fn check_task_completed(&self, subject: &dyn Subject, task_type: &str) -> CheckOutcome {
        let completed = subject.completed_task_count(task_type) > 0;
        let message = if completed {
            format!("Task type '{task_type}' is completed")
        } else {
            format!("Task type '{task_type}' not completed")
        };
        CheckOutcome {
            passed: completed,
            message,
            details: Default::default(),
        }
        .with_detail("task_type", task_type)
        .with_detail("completed", completed)
    }

    fn check_custom(
        &self,
        subject: &dyn Subject,
        requirement: &GateRequirement,
        strategy: &str,
        capability: &str,
    ) -> CheckOutcome {
        let Some(check) = self.registry.resolve(strategy) else {
            return CheckOutcome::fail(format!("Custom check '{strategy}' not registered"));
        };

        match check.invoke(capability, subject, requirement) {
            Some(outcome) => outcome,
            None => CheckOutcome::fail(format!(
                "Capability '{capability}' not supported by custom check '{strategy}'"
            )),
        }
    }
}

fn panic_text(panic: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(text) = panic.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = panic.downcast_ref::<String>() {
        text.clone()
    } else {
        "unknown panic".to_string()
    }
}
