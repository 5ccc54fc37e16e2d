//! Subject read surface: what the engine is allowed to see
//!
//! The engine never mutates the subject. Everything a requirement check
//! can observe goes through this trait: named fields, to-many relations,
//! stored documents, tasks, and the primary sales order. Relation lookups
//! return `None` for unknown relation names so checks can fail explicitly
//! instead of silently.

use chrono::{DateTime, Utc};
use gate_types::{StageId, SubjectId, TargetEntity};
use serde_json::Value;
use std::collections::HashMap;

/// Result of resolving a field on a target entity
#[derive(Clone, Debug, PartialEq)]
pub enum TargetField {
    /// The target entity itself is absent (no order, no partner)
    Missing,
    /// The target exists; the field value may still be null
    Value(Option<Value>),
}

/// Payment timestamps on the subject's primary sales order
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OrderPayments {
    pub deposit_paid_at: Option<DateTime<Utc>>,
    pub final_paid_at: Option<DateTime<Utc>>,
}

/// Read-only view of the entity being evaluated
pub trait Subject {
    fn id(&self) -> SubjectId;

    /// The subject's current workflow stage, if any
    fn stage(&self) -> Option<StageId>;

    /// Read a named field on the subject itself. `None` means the field
    /// is absent; `Some(Value::Null)` means present but unset.
    fn field(&self, name: &str) -> Option<Value>;

    /// Read a named field on a target entity resolved by enum key.
    /// `TargetEntity::Subject` must behave exactly like [`Self::field`].
    fn target_field(&self, target: TargetEntity, name: &str) -> TargetField;

    /// Number of members in a named to-many relation, or `None` if the
    /// relation name is unknown
    fn relation_count(&self, relation: &str) -> Option<usize>;

    /// Number of relation members whose `field` matches `value`, or
    /// `None` if the relation name is unknown
    fn relation_count_where(&self, relation: &str, field: &str, value: &Value) -> Option<usize>;

    /// Number of stored documents tagged with the given category
    fn document_count(&self, category: &str) -> usize;

    /// Number of tasks of the given type in a done state
    fn completed_task_count(&self, task_type: &str) -> usize;

    /// The subject's primary associated sales order, if one exists
    fn primary_order(&self) -> Option<OrderPayments>;
}

/// A subject assembled from literal values.
///
/// Production code implements [`Subject`] over the ERP's project entity;
/// this one backs tests and configuration previews where no store is
/// available.
#[derive(Clone, Debug, Default)]
pub struct StaticSubject {
    id: SubjectId,
    stage: Option<StageId>,
    fields: serde_json::Map<String, Value>,
    related: HashMap<&'static str, serde_json::Map<String, Value>>,
    relations: HashMap<String, Vec<serde_json::Map<String, Value>>>,
    documents: HashMap<String, usize>,
    completed_tasks: HashMap<String, usize>,
    order: Option<OrderPayments>,
}

impl StaticSubject {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: SubjectId::new(id),
            ..Self::default()
        }
    }

    pub fn with_stage(mut self, stage: StageId) -> Self {
        self.stage = Some(stage);
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Set a field on a related target entity. Setting any field marks
    /// the target as present.
    pub fn with_target_field(
        mut self,
        target: TargetEntity,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        self.related
            .entry(Self::target_key(target))
            .or_default()
            .insert(name.into(), value.into());
        self
    }

    /// Add one member to a named to-many relation
    pub fn with_relation_member(
        mut self,
        relation: impl Into<String>,
        member: serde_json::Map<String, Value>,
    ) -> Self {
        self.relations.entry(relation.into()).or_default().push(member);
        self
    }

    /// Declare a relation with `count` empty members
    pub fn with_relation_size(mut self, relation: impl Into<String>, count: usize) -> Self {
        let members = self.relations.entry(relation.into()).or_default();
        members.resize(count.max(members.len()), serde_json::Map::new());
        self
    }

    /// Declare an empty (but known) relation
    pub fn with_empty_relation(mut self, relation: impl Into<String>) -> Self {
        self.relations.entry(relation.into()).or_default();
        self
    }

    pub fn with_documents(mut self, category: impl Into<String>, count: usize) -> Self {
        self.documents.insert(category.into(), count);
        self
    }

    pub fn with_completed_tasks(mut self, task_type: impl Into<String>, count: usize) -> Self {
        self.completed_tasks.insert(task_type.into(), count);
        self
    }

    pub fn with_order(mut self, order: OrderPayments) -> Self {
        self.order = Some(order);
        self
    }

    fn target_key(target: TargetEntity) -> &'static str {
        match target {
            TargetEntity::Subject => "subject",
            TargetEntity::SalesOrder => "sales_order",
            TargetEntity::Partner => "partner",
        }
    }
}

impl Subject for StaticSubject {
    fn id(&self) -> SubjectId {
        self.id.clone()
    }

    fn stage(&self) -> Option<StageId> {
        self.stage.clone()
    }

    fn field(&self, name: &str) -> Option<Value> {
        self.fields.get(name).cloned()
    }

    fn target_field(&self, target: TargetEntity, name: &str) -> TargetField {
        if target == TargetEntity::Subject {
            return TargetField::Value(self.field(name));
        }
        match self.related.get(Self::target_key(target)) {
            Some(fields) => TargetField::Value(fields.get(name).cloned()),
            None => TargetField::Missing,
        }
    }

    fn relation_count(&self, relation: &str) -> Option<usize> {
        self.relations.get(relation).map(Vec::len)
    }

    fn relation_count_where(&self, relation: &str, field: &str, value: &Value) -> Option<usize> {
        let members = self.relations.get(relation)?;
        let matching = members
            .iter()
            .filter(|member| {
                member
                    .get(field)
                    .is_some_and(|actual| crate::value::loose_eq(actual, value))
            })
            .count();
        Some(matching)
    }

    fn document_count(&self, category: &str) -> usize {
        self.documents.get(category).copied().unwrap_or(0)
    }

    fn completed_task_count(&self, task_type: &str) -> usize {
        self.completed_tasks.get(task_type).copied().unwrap_or(0)
    }

    fn primary_order(&self) -> Option<OrderPayments> {
        self.order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn room(room_type: &str, approved: bool) -> serde_json::Map<String, Value> {
        let mut member = serde_json::Map::new();
        member.insert("room_type".into(), json!(room_type));
        member.insert("approved".into(), json!(approved));
        member
    }

    #[test]
    fn test_field_and_stage() {
        let subject = StaticSubject::new("p1")
            .with_stage(StageId::new("design"))
            .with_field("name", "Kitchen Remodel")
            .with_field("budget", Value::Null);

        assert_eq!(subject.stage(), Some(StageId::new("design")));
        assert_eq!(subject.field("name"), Some(json!("Kitchen Remodel")));
        assert_eq!(subject.field("budget"), Some(Value::Null));
        assert_eq!(subject.field("missing"), None);
    }

    #[test]
    fn test_target_field_resolution() {
        let subject = StaticSubject::new("p1")
            .with_field("name", "Project")
            .with_target_field(TargetEntity::Partner, "name", "ACME Builders");

        assert_eq!(
            subject.target_field(TargetEntity::Subject, "name"),
            TargetField::Value(Some(json!("Project")))
        );
        assert_eq!(
            subject.target_field(TargetEntity::Partner, "name"),
            TargetField::Value(Some(json!("ACME Builders")))
        );
        assert_eq!(
            subject.target_field(TargetEntity::SalesOrder, "total"),
            TargetField::Missing
        );
    }

    #[test]
    fn test_relation_counts() {
        let subject = StaticSubject::new("p1")
            .with_relation_member("rooms", room("kitchen", true))
            .with_relation_member("rooms", room("kitchen", false))
            .with_empty_relation("defects");

        assert_eq!(subject.relation_count("rooms"), Some(2));
        assert_eq!(subject.relation_count("defects"), Some(0));
        assert_eq!(subject.relation_count("unknown"), None);

        assert_eq!(
            subject.relation_count_where("rooms", "approved", &json!(true)),
            Some(1)
        );
        assert_eq!(
            subject.relation_count_where("rooms", "room_type", &json!("kitchen")),
            Some(2)
        );
    }
}
