//! `herald-review` — from AI plan to human-approved queue admission.
//!
//! The [`preparer::PlanPreparer`] turns a planner-produced daily plan into a
//! [`plan::PendingPlan`]: one generated, safety-classified post per plan
//! entry that survived its bounded generation retries. The
//! [`workflow::ApprovalWorkflow`] then holds pending plans per reviewer and
//! applies reviewer actions — regenerate with feedback, soft-remove, view,
//! bulk approve into the task queue, or cancel.
//!
//! Reviewer actions racing with approval or expiry are normal; stale
//! references answer with `false`/`None`, never an error.

pub mod error;
pub mod plan;
pub mod preparer;
pub mod workflow;

pub use error::{ReviewError, Result};
pub use plan::{PendingPlan, PreparedPost, SafetyZone};
pub use preparer::PlanPreparer;
pub use workflow::{ApprovalOutcome, ApprovalWorkflow};
