//! Domain Types for the Workflow Gate Engine
//!
//! Gates are named checkpoints attached to a workflow stage. A subject
//! (a shop project) may only cross a stage boundary when every blocking
//! gate of its current stage passes. What a gate demands is configured
//! as a set of **requirements**: heterogeneous, individually testable
//! conditions. Every evaluation leaves an immutable audit record.
//!
//! # Key Concepts
//!
//! - **Gate**: A checkpoint bound to one stage. Blocking gates prevent
//!   stage advancement on failure; advisory gates merely report.
//! - **GateRequirement**: One configured condition belonging to a gate,
//!   expressed as a [`RequirementKind`] tagged union.
//! - **CheckOutcome**: The transient result of checking one requirement.
//! - **GateOutcome**: The aggregate verdict for one gate, including the
//!   persisted audit record.
//! - **GateEvaluation**: The append-only audit artifact of one
//!   evaluation call; why a decision was made, replayable later.
//!
//! # Design Principles
//!
//! 1. Configuration is read-only during evaluation.
//! 2. Every evaluation persists exactly one audit record.
//! 3. A failing requirement never aborts its siblings.
//! 4. Unknown configuration degrades to explicit failed outcomes,
//!    never to panics.

#![deny(unsafe_code)]

mod audit;
mod errors;
mod gate;
mod ids;
mod outcome;
mod requirement;

pub use audit::*;
pub use errors::*;
pub use gate::*;
pub use ids::*;
pub use outcome::*;
pub use requirement::*;
