//! Draft reconciliation.
//!
//! [`ReconciliationEngine`] opens [`EditSession`]s, diffs a frozen draft
//! against the product it was seeded from ([`CommitPlan`]) and executes
//! the resulting calls. The backend has no multi-entity transaction: a
//! commit is ordered and best-effort, and reports every failed call.

mod engine;
mod outcome;
mod plan;

pub use engine::{EditSession, ReconciliationEngine};
pub use outcome::{CommitFailure, CommitOutcome, CommitStep, SessionState, StepFailure};
pub use plan::{CommitPlan, VariantAction, VariantChange};
