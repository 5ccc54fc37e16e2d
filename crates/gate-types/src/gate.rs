//! Gate configuration: checkpoints attached to workflow stages
//!
//! Gates are administrator-edited configuration. They are read-only
//! during evaluation; the engine never mutates them.

use crate::{GateId, StageId};
use serde::{Deserialize, Serialize};

/// A named checkpoint attached to one workflow stage
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Gate {
    pub id: GateId,
    /// Stable key used to reference the gate from UI and reports
    pub gate_key: String,
    /// The stage this gate belongs to (exactly one)
    pub stage_id: StageId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Ordering within the stage
    pub sequence: u32,
    /// Whether failure prevents stage advancement
    pub is_blocking: bool,
    pub is_active: bool,
    /// Downstream lock flags applied when the gate passes. The locks
    /// themselves are enforced elsewhere; the engine only carries the
    /// configuration.
    #[serde(default)]
    pub applies_design_lock: bool,
    #[serde(default)]
    pub applies_procurement_lock: bool,
    #[serde(default)]
    pub applies_production_lock: bool,
    /// Whether passing this gate should spawn follow-up tasks
    #[serde(default)]
    pub creates_tasks_on_pass: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub task_templates: Vec<TaskTemplate>,
}

impl Gate {
    /// Create an active, blocking gate with defaults for everything else
    pub fn new(
        gate_key: impl Into<String>,
        stage_id: StageId,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: GateId::generate(),
            gate_key: gate_key.into(),
            stage_id,
            name: name.into(),
            description: String::new(),
            sequence: 1,
            is_blocking: true,
            is_active: true,
            applies_design_lock: false,
            applies_procurement_lock: false,
            applies_production_lock: false,
            creates_tasks_on_pass: false,
            task_templates: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_sequence(mut self, sequence: u32) -> Self {
        self.sequence = sequence;
        self
    }

    pub fn blocking(mut self, is_blocking: bool) -> Self {
        self.is_blocking = is_blocking;
        self
    }

    pub fn active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    pub fn with_design_lock(mut self) -> Self {
        self.applies_design_lock = true;
        self
    }

    pub fn with_procurement_lock(mut self) -> Self {
        self.applies_procurement_lock = true;
        self
    }

    pub fn with_production_lock(mut self) -> Self {
        self.applies_production_lock = true;
        self
    }

    pub fn with_task_template(mut self, template: TaskTemplate) -> Self {
        self.creates_tasks_on_pass = true;
        self.task_templates.push(template);
        self
    }
}

/// Template for a follow-up task created when a gate passes
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TaskTemplate {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

impl TaskTemplate {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_gate_defaults() {
        let gate = Gate::new("design_lock", StageId::new("design"), "Design Lock");
        assert!(gate.is_blocking);
        assert!(gate.is_active);
        assert!(!gate.applies_design_lock);
        assert!(gate.task_templates.is_empty());
        assert_eq!(gate.sequence, 1);
    }

    #[test]
    fn test_builder_methods() {
        let gate = Gate::new("qc_passed", StageId::new("production"), "QC Passed")
            .with_sequence(3)
            .blocking(false)
            .with_production_lock()
            .with_task_template(TaskTemplate::new("Schedule Delivery", "Coordinate with client"));

        assert_eq!(gate.sequence, 3);
        assert!(!gate.is_blocking);
        assert!(gate.applies_production_lock);
        assert!(gate.creates_tasks_on_pass);
        assert_eq!(gate.task_templates.len(), 1);
    }
}
