//! Identifier newtypes shared across the gate engine

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn short(&self) -> &str {
                &self.0[..8.min(self.0.len())]
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

string_id! {
    /// Unique identifier for a gate
    GateId
}

string_id! {
    /// Unique identifier for a gate requirement
    RequirementId
}

string_id! {
    /// Unique identifier for a workflow stage
    StageId
}

string_id! {
    /// Unique identifier for the subject entity under evaluation
    SubjectId
}

string_id! {
    /// Identifier of the actor who triggered an evaluation
    ActorId
}

string_id! {
    /// Unique identifier for a persisted evaluation record
    EvaluationId
}
