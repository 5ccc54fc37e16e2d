//! Workflow Gate Evaluation Engine
//!
//! Decides whether a subject (a shop project) may cross a workflow-stage
//! boundary by evaluating the configured requirements of each gate bound
//! to its current stage, and records an immutable audit trail of every
//! decision.
//!
//! # Key Concepts
//!
//! - **Subject**: the read-only surface the engine evaluates against:
//!   named fields, to-many relations, documents, tasks, the primary order.
//! - **RequirementChecker**: routes each requirement kind to its check
//!   logic and isolates failures so one bad rule never aborts the batch.
//! - **CustomCheckRegistry**: named strategies resolved at startup; the
//!   shop's composite checks (CNC programs, BOM coverage, QC defects) are
//!   registered here.
//! - **GateEvaluator**: the orchestrator. `evaluate()` produces a verdict
//!   and persists exactly one audit record; `check()` is the pure,
//!   non-recording counterpart.
//! - **Stage surface**: convenience queries over the current stage's
//!   gates: advance eligibility, blockers, per-gate status.
//!
//! # Design Principles
//!
//! 1. Evaluation is a pure read of already-resolved subject data plus
//!    one audit write. No locking, no caching, no retries.
//! 2. Per-requirement errors become failed outcomes, never panics past
//!    the dispatcher.
//! 3. A failed audit write aborts the call: a decision without a record
//!    is not a decision.

#![deny(unsafe_code)]

mod audit;
mod builtin;
mod checker;
mod evaluator;
mod registry;
mod stage;
mod store;
mod subject;
mod value;

pub use audit::*;
pub use builtin::*;
pub use checker::*;
pub use evaluator::*;
pub use registry::*;
pub use stage::*;
pub use store::*;
pub use subject::*;
pub use value::*;

pub use gate_types::*;
