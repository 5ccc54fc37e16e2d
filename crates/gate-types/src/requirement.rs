//! Gate requirements: one configured condition per entry
//!
//! A requirement's kind is a closed tagged union rather than a stored
//! string routed through a switch. Tags that no longer decode to a known
//! variant land on [`RequirementKind::Unsupported`] and evaluate to an
//! explicit failed outcome instead of a default branch.

use crate::{GateId, RequirementId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One testable condition belonging to a gate
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GateRequirement {
    pub id: RequirementId,
    pub gate_id: GateId,
    pub kind: RequirementKind,
    /// Shown to the user when the requirement fails
    pub error_message: String,
    #[serde(default)]
    pub help_text: String,
    /// Optional remediation pointer, purely informational
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<RemediationAction>,
    /// Ordering within the gate; affects audit readability only
    pub sequence: u32,
    pub is_active: bool,
}

impl GateRequirement {
    pub fn new(gate_id: GateId, kind: RequirementKind, error_message: impl Into<String>) -> Self {
        Self {
            id: RequirementId::generate(),
            gate_id,
            kind,
            error_message: error_message.into(),
            help_text: String::new(),
            action: None,
            sequence: 1,
            is_active: true,
        }
    }

    pub fn with_help_text(mut self, help_text: impl Into<String>) -> Self {
        self.help_text = help_text.into();
        self
    }

    pub fn with_action(mut self, label: impl Into<String>, route: impl Into<String>) -> Self {
        self.action = Some(RemediationAction {
            label: label.into(),
            route: route.into(),
        });
        self
    }

    pub fn with_sequence(mut self, sequence: u32) -> Self {
        self.sequence = sequence;
        self
    }

    pub fn active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }
}

/// Where a user can go to fix a failing requirement
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RemediationAction {
    pub label: String,
    pub route: String,
}

/// The condition a requirement tests, with its parameters
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RequirementKind {
    /// A field on the target entity is neither absent nor empty
    FieldNotNull { target: TargetEntity, field: String },

    /// A field loosely equals an expected value
    FieldEquals {
        target: TargetEntity,
        field: String,
        expected: Value,
    },

    /// A numeric field strictly exceeds a threshold
    FieldGreaterThan {
        target: TargetEntity,
        field: String,
        threshold: Value,
    },

    /// A to-many relation on the subject has at least one member
    RelationExists { relation: String },

    /// A relation's member count satisfies an operator comparison
    RelationCount {
        relation: String,
        operator: ComparisonOp,
        expected: i64,
    },

    /// Every member of a relation has field = expected
    AllChildrenPass {
        relation: String,
        field: String,
        expected: Value,
    },

    /// The subject has at least one document in the named category
    DocumentUploaded { category: String },

    /// The subject's primary order has the named payment recorded
    PaymentReceived { milestone: PaymentMilestone },

    /// The subject has a completed task of the named type
    TaskCompleted { task_type: String },

    /// Delegate to a registered custom check strategy
    CustomCheck { strategy: String, capability: String },

    /// A stored tag this build does not understand. Always fails with a
    /// message naming the tag.
    #[serde(untagged)]
    Unsupported {
        #[serde(rename = "type")]
        tag: String,
    },
}

impl RequirementKind {
    /// The stable tag used in audit payloads and log lines
    pub fn tag(&self) -> &str {
        match self {
            Self::FieldNotNull { .. } => "field_not_null",
            Self::FieldEquals { .. } => "field_equals",
            Self::FieldGreaterThan { .. } => "field_greater_than",
            Self::RelationExists { .. } => "relation_exists",
            Self::RelationCount { .. } => "relation_count",
            Self::AllChildrenPass { .. } => "all_children_pass",
            Self::DocumentUploaded { .. } => "document_uploaded",
            Self::PaymentReceived { .. } => "payment_received",
            Self::TaskCompleted { .. } => "task_completed",
            Self::CustomCheck { .. } => "custom_check",
            Self::Unsupported { tag } => tag,
        }
    }
}

/// Which entity a field-level requirement reads from
///
/// The engine resolves these through the subject's read surface instead
/// of matching on entity type names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetEntity {
    /// The subject itself (the project)
    Subject,
    /// The subject's primary sales order
    SalesOrder,
    /// The subject's client/partner
    Partner,
}

impl std::fmt::Display for TargetEntity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Subject => "subject",
            Self::SalesOrder => "sales_order",
            Self::Partner => "partner",
        };
        write!(f, "{name}")
    }
}

/// Payment milestones a PaymentReceived requirement can test
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMilestone {
    Deposit,
    Final,
}

impl std::fmt::Display for PaymentMilestone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Deposit => "deposit",
            Self::Final => "final",
        };
        write!(f, "{name}")
    }
}

/// Comparison operators for ordinal requirement checks
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparisonOp {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
}

impl ComparisonOp {
    pub fn apply(&self, actual: i64, expected: i64) -> bool {
        match self {
            Self::Eq => actual == expected,
            Self::Ne => actual != expected,
            Self::Gt => actual > expected,
            Self::Ge => actual >= expected,
            Self::Lt => actual < expected,
            Self::Le => actual <= expected,
        }
    }
}

impl std::fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let glyph = match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Lt => "<",
            Self::Le => "<=",
        };
        write!(f, "{glyph}")
    }
}
