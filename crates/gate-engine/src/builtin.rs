//! Built-in shop checks: the composite strategies gates reference by name
//!
//! Each aggregates a child collection on the project and applies a
//! counting rule. The empty-collection behavior is intentional per
//! check: cascading checks (CNC programs, POs, production tasks,
//! defects) pass when there is nothing to verify, while
//! mandatory-evidence checks (BOM coverage, cabinet dimensioning) fail;
//! an empty BOM is missing evidence, not a clean bill.

use crate::{CustomCheck, CustomCheckRegistry, Subject};
use gate_types::{CheckOutcome, GateRequirement, PaymentMilestone};
use serde_json::{json, Value};
use std::sync::Arc;

/// Registry names for the built-in checks
pub mod names {
    pub const ALL_CNC_PROGRAMS_COMPLETE: &str = "all_cnc_programs_complete";
    pub const ALL_BOM_LINES_COVERED: &str = "all_bom_lines_covered";
    pub const ALL_CABINETS_DIMENSIONED: &str = "all_cabinets_dimensioned";
    pub const ALL_POS_CONFIRMED: &str = "all_pos_confirmed";
    pub const ALL_PRODUCTION_TASKS_COMPLETE: &str = "all_production_tasks_complete";
    pub const DELIVERY_DATE_SET: &str = "delivery_date_set";
    pub const DEPOSIT_RECEIVED: &str = "deposit_received";
    pub const FINAL_PAYMENT_RECEIVED: &str = "final_payment_received";
    pub const NO_BLOCKING_DEFECTS: &str = "no_blocking_defects";
}

impl CustomCheckRegistry {
    /// A registry pre-populated with every built-in shop check
    pub fn with_builtin_checks() -> Self {
        let mut registry = Self::new();
        registry.register(names::ALL_CNC_PROGRAMS_COMPLETE, Arc::new(AllCncProgramsComplete));
        registry.register(names::ALL_BOM_LINES_COVERED, Arc::new(AllBomLinesCovered));
        registry.register(names::ALL_CABINETS_DIMENSIONED, Arc::new(AllCabinetsDimensioned));
        registry.register(names::ALL_POS_CONFIRMED, Arc::new(AllPosConfirmed));
        registry.register(
            names::ALL_PRODUCTION_TASKS_COMPLETE,
            Arc::new(AllProductionTasksComplete),
        );
        registry.register(names::DELIVERY_DATE_SET, Arc::new(DeliveryDateSet));
        registry.register(names::DEPOSIT_RECEIVED, Arc::new(DepositReceived));
        registry.register(names::FINAL_PAYMENT_RECEIVED, Arc::new(FinalPaymentReceived));
        registry.register(names::NO_BLOCKING_DEFECTS, Arc::new(NoBlockingDefects));
        registry
    }
}

/// What an aggregate check does when the collection is empty
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum EmptyRule {
    /// Nothing to verify, so the check passes (cascading)
    Pass,
    /// The collection itself is required evidence, so emptiness fails
    Fail,
}

/// Shared counting rule: every member of `relation` must have
/// `field` = `expected`
fn all_members_match(
    subject: &dyn Subject,
    relation: &str,
    field: &str,
    expected: &Value,
    empty_rule: EmptyRule,
    noun: &str,
) -> CheckOutcome {
    let Some(total) = subject.relation_count(relation) else {
        return CheckOutcome::fail(format!("Relation '{relation}' does not exist on subject"));
    };

    if total == 0 {
        return match empty_rule {
            EmptyRule::Pass => CheckOutcome::pass(format!("No {noun} to check"))
                .with_detail("total", 0),
            EmptyRule::Fail => CheckOutcome::fail(format!("No {noun} found"))
                .with_detail("total", 0),
        };
    }

    let Some(passing) = subject.relation_count_where(relation, field, expected) else {
        return CheckOutcome::fail(format!("Relation '{relation}' does not exist on subject"));
    };

    let passed = passing == total;
    let message = if passed {
        format!("All {total} {noun} complete")
    } else {
        format!("{passing}/{total} {noun} complete")
    };
    CheckOutcome {
        passed,
        message,
        details: Default::default(),
    }
    .with_detail("passing", passing)
    .with_detail("total", total)
}

macro_rules! single_capability {
    ($type:ty, $body:expr) => {
        impl CustomCheck for $type {
            fn capabilities(&self) -> &[&str] {
                &["check"]
            }

            fn invoke(
                &self,
                capability: &str,
                subject: &dyn Subject,
                requirement: &GateRequirement,
            ) -> Option<CheckOutcome> {
                if capability != "check" {
                    return None;
                }
                let _ = requirement;
                Some($body(subject))
            }
        }
    };
}

/// Every CNC program for the project has finished cutting
pub struct AllCncProgramsComplete;
single_capability!(AllCncProgramsComplete, |subject: &dyn Subject| {
    all_members_match(
        subject,
        "cnc_programs",
        "status",
        &json!("complete"),
        EmptyRule::Pass,
        "CNC programs",
    )
});

/// Every BOM line has inventory reserved or a PO line covering it.
/// An empty BOM fails: coverage cannot be claimed without a BOM.
pub struct AllBomLinesCovered;
single_capability!(AllBomLinesCovered, |subject: &dyn Subject| {
    all_members_match(
        subject,
        "bom_lines",
        "is_covered",
        &json!(true),
        EmptyRule::Fail,
        "BOM lines",
    )
});

/// Every cabinet has width, height, and depth specified. An empty
/// cabinet list fails: dimensioning requires cabinets to dimension.
pub struct AllCabinetsDimensioned;
single_capability!(AllCabinetsDimensioned, |subject: &dyn Subject| {
    all_members_match(
        subject,
        "cabinets",
        "is_dimensioned",
        &json!(true),
        EmptyRule::Fail,
        "cabinets",
    )
});

/// Every purchase order is in a confirmed state
pub struct AllPosConfirmed;
single_capability!(AllPosConfirmed, |subject: &dyn Subject| {
    all_members_match(
        subject,
        "purchase_orders",
        "is_confirmed",
        &json!(true),
        EmptyRule::Pass,
        "purchase orders",
    )
});

/// Every production task is done
pub struct AllProductionTasksComplete;
single_capability!(AllProductionTasksComplete, |subject: &dyn Subject| {
    all_members_match(
        subject,
        "production_tasks",
        "state",
        &json!("done"),
        EmptyRule::Pass,
        "production tasks",
    )
});

/// The project has a delivery date scheduled
pub struct DeliveryDateSet;
single_capability!(DeliveryDateSet, |subject: &dyn Subject| {
    let set = matches!(
        subject.field("delivery_date"),
        Some(value) if !value.is_null() && value != Value::String(String::new())
    );
    if set {
        CheckOutcome::pass("Delivery date is set")
    } else {
        CheckOutcome::fail("Delivery date not set")
    }
});

/// The deposit payment is recorded on the primary sales order
pub struct DepositReceived;
single_capability!(DepositReceived, |subject: &dyn Subject| {
    payment_check(subject, PaymentMilestone::Deposit)
});

/// The final payment is recorded on the primary sales order
pub struct FinalPaymentReceived;
single_capability!(FinalPaymentReceived, |subject: &dyn Subject| {
    payment_check(subject, PaymentMilestone::Final)
});

fn payment_check(subject: &dyn Subject, milestone: PaymentMilestone) -> CheckOutcome {
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
}

/// No open defect with blocking severity remains
pub struct NoBlockingDefects;
single_capability!(NoBlockingDefects, |subject: &dyn Subject| {
    let Some(blocking) =
        subject.relation_count_where("defects", "severity", &json!("blocking"))
    else {
        return CheckOutcome::fail("Relation 'defects' does not exist on subject");
    };

    if blocking == 0 {
        CheckOutcome::pass("No blocking defects").with_detail("blocking", 0)
    } else {
        CheckOutcome::fail(format!("{blocking} blocking defect(s) open"))
            .with_detail("blocking", blocking)
    }
});
