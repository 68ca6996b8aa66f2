use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::AgentError;
use crate::types::{DailyPlan, GenerationRequest, SafetyVerdict};

/// Produces a daily publication plan for the given specialties.
#[async_trait]
pub trait Planner: Send + Sync {
    /// One planning call. No internal retry; malformed output is an error.
    async fn plan(
        &self,
        target_date: DateTime<Utc>,
        specialties: &[String],
    ) -> Result<DailyPlan, AgentError>;
}

/// Produces post content for a topic within a channel context.
#[async_trait]
pub trait Generator: Send + Sync {
    /// One generation call. May fail or time out; bounded retry is the
    /// caller's responsibility.
    async fn generate(&self, req: &GenerationRequest) -> Result<String, AgentError>;
}

/// Screens generated content.
#[async_trait]
pub trait SafetyChecker: Send + Sync {
    /// Single-attempt safety check.
    async fn check(
        &self,
        content: &str,
        specialty: &str,
        channel_name: &str,
    ) -> Result<SafetyVerdict, AgentError>;
}
