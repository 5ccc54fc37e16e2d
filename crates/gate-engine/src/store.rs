//! Gate configuration store: where gates and requirements come from
//!
//! Configuration is created and edited by administrators elsewhere; the
//! engine only reads it. The in-memory implementation backs tests and
//! single-process deployments; a database-backed implementation lives
//! with the persistence layer.

use gate_types::{Gate, GateId, GateRequirement, StageId};
use std::collections::HashMap;

/// Read access to gate configuration
pub trait GateStore: Send + Sync {
    /// Active gates bound to a stage, ordered by sequence
    fn gates_for_stage(&self, stage_id: &StageId) -> Vec<Gate>;

    /// Active requirements of a gate, ordered by sequence
    fn active_requirements(&self, gate_id: &GateId) -> Vec<GateRequirement>;
}

/// In-memory gate configuration
#[derive(Clone, Debug, Default)]
pub struct InMemoryGateStore {
    gates: Vec<Gate>,
    requirements: HashMap<GateId, Vec<GateRequirement>>,
}

impl InMemoryGateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_gate(&mut self, gate: Gate) {
        tracing::info!(gate_key = %gate.gate_key, stage_id = %gate.stage_id, "Gate registered");
        self.gates.push(gate);
    }

    pub fn add_requirement(&mut self, requirement: GateRequirement) {
        self.requirements
            .entry(requirement.gate_id.clone())
            .or_default()
            .push(requirement);
    }

    pub fn with_gate(mut self, gate: Gate) -> Self {
        self.add_gate(gate);
        self
    }

    pub fn with_requirement(mut self, requirement: GateRequirement) -> Self {
        self.add_requirement(requirement);
        self
    }

    /// All requirements across all gates, for registry validation at
    /// configuration-load time
    pub fn all_requirements(&self) -> impl Iterator<Item = &GateRequirement> {
        self.requirements.values().flatten()
    }
}

impl GateStore for InMemoryGateStore {
    fn gates_for_stage(&self, stage_id: &StageId) -> Vec<Gate> {
        let mut gates: Vec<Gate> = self
            .gates
            .iter()
            .filter(|gate| gate.is_active && &gate.stage_id == stage_id)
            .cloned()
            .collect();
        gates.sort_by_key(|gate| gate.sequence);
        gates
    }

    fn active_requirements(&self, gate_id: &GateId) -> Vec<GateRequirement> {
        let mut requirements: Vec<GateRequirement> = self
            .requirements
            .get(gate_id)
            .map(|reqs| reqs.iter().filter(|r| r.is_active).cloned().collect())
            .unwrap_or_default();
        requirements.sort_by_key(|r| r.sequence);
        requirements
    }
}
