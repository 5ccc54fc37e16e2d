//! Custom-check registry: named strategies resolved at startup
//!
//! Custom checks used to be looked up by stored class and method name at
//! evaluation time. Here they are registered once under a stable name,
//! expose their capabilities explicitly, and configurations referencing
//! them are validated at load time rather than on first evaluation.

use crate::Subject;
use gate_types::{CheckOutcome, GateError, GateRequirement, GateResult, RequirementKind};
use std::collections::HashMap;
use std::sync::Arc;

/// A registered requirement check strategy
///
/// A strategy may expose several named capabilities; a requirement
/// selects one. `invoke` returns `None` for capabilities the strategy
/// does not support.
pub trait CustomCheck: Send + Sync {
    /// Capability names this strategy supports
    fn capabilities(&self) -> &[&str];

    /// Run the named capability against the subject. Must be a pure
    /// read; must not panic past its own boundary.
    fn invoke(
        &self,
        capability: &str,
        subject: &dyn Subject,
        requirement: &GateRequirement,
    ) -> Option<CheckOutcome>;
}

/// Registry of custom check strategies, keyed by name
#[derive(Clone, Default)]
pub struct CustomCheckRegistry {
    checks: HashMap<String, Arc<dyn CustomCheck>>,
}

impl CustomCheckRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            checks: HashMap::new(),
        }
    }

    /// Register a strategy under a name. Re-registering a name replaces
    /// the previous strategy.
    pub fn register(&mut self, name: impl Into<String>, check: Arc<dyn CustomCheck>) {
        let name = name.into();
        tracing::info!(strategy = %name, "Custom check registered");
        self.checks.insert(name, check);
    }

    /// Resolve a strategy by name
    pub fn resolve(&self, name: &str) -> Option<&Arc<dyn CustomCheck>> {
        self.checks.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.checks.contains_key(name)
    }

    pub fn count(&self) -> usize {
        self.checks.len()
    }

    /// Validate that every CustomCheck requirement in a configuration
    /// references a registered strategy and a supported capability.
    ///
    /// Run this when gate configuration is loaded, not when a gate is
    /// first evaluated.
    pub fn validate<'a>(
        &self,
        requirements: impl IntoIterator<Item = &'a GateRequirement>,
    ) -> GateResult<()> {
        for requirement in requirements {
            if let RequirementKind::CustomCheck {
                strategy,
                capability,
            } = &requirement.kind
            {
                let check = self.resolve(strategy).ok_or_else(|| {
                    GateError::UnknownCustomCheck {
                        strategy: strategy.clone(),
                    }
                })?;
                if !check.capabilities().contains(&capability.as_str()) {
                    return Err(GateError::UnknownCapability {
                        strategy: strategy.clone(),
                        capability: capability.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for CustomCheckRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomCheckRegistry")
            .field("strategies", &self.checks.keys().collect::<Vec<_>>())
            .finish()
    }
}
