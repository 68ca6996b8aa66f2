use thiserror::Error;

/// Errors that can occur while preparing a plan.
#[derive(Debug, Error)]
pub enum ReviewError {
    /// The planner call failed or produced output that did not decode.
    #[error("Planning failed: {0}")]
    Planning(String),

    /// Every plan entry was skipped; there is nothing to review.
    #[error("No posts survived preparation")]
    EmptyPlan,
}

pub type Result<T> = std::result::Result<T, ReviewError>;
