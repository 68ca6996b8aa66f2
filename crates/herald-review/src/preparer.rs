//! Plan preparation: planner output → reviewable batch of prepared posts.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use herald_agents::boundary::{Generator, Planner, SafetyChecker};
use herald_agents::types::{ChannelContext, GenerationRequest, PlanEntry};
use herald_core::config::PreparerConfig;
use herald_core::types::Specialty;
use tracing::{info, warn};

use crate::error::{ReviewError, Result};
use crate::plan::{PendingPlan, PreparedPost, SafetyZone};

/// Drives the generation + safety-check sequence that builds a
/// [`PendingPlan`] from an AI-produced daily plan.
///
/// Collaborators are injected at construction; the preparer owns no state
/// beyond configuration and the specialty directory.
pub struct PlanPreparer {
    planner: Arc<dyn Planner>,
    generator: Arc<dyn Generator>,
    safety: Arc<dyn SafetyChecker>,
    specialties: HashMap<String, Specialty>,
    cfg: PreparerConfig,
}

impl PlanPreparer {
    pub fn new(
        planner: Arc<dyn Planner>,
        generator: Arc<dyn Generator>,
        safety: Arc<dyn SafetyChecker>,
        specialties: Vec<Specialty>,
        cfg: PreparerConfig,
    ) -> Self {
        Self {
            planner,
            generator,
            safety,
            specialties: specialties.into_iter().map(|s| (s.id.clone(), s)).collect(),
            cfg,
        }
    }

    /// Build a reviewable plan for today.
    ///
    /// Entries whose generation attempts all fail are skipped — their index
    /// is simply never created, no placeholder. Succeeds only when at least
    /// one entry produced a post.
    pub async fn prepare_daily_plan(&self, specialties: Option<&[String]>) -> Result<PendingPlan> {
        let requested: Vec<String> = match specialties {
            Some(ids) => ids.to_vec(),
            None => self.specialties.keys().cloned().collect(),
        };

        let plan = self
            .planner
            .plan(Utc::now(), &requested)
            .await
            .map_err(|e| ReviewError::Planning(e.to_string()))?;

        info!(
            entries = plan.posts.len(),
            reasoning = %plan.reasoning,
            "daily plan received"
        );

        let total = plan.posts.len();
        let mut posts = Vec::new();
        for (index, entry) in plan.posts.into_iter().enumerate() {
            if let Some(post) = self.prepare_entry(index, entry).await {
                posts.push(post);
            }
            // Pace the generation service between entries.
            if index + 1 < total && self.cfg.entry_delay_secs > 0 {
                tokio::time::sleep(Duration::from_secs(self.cfg.entry_delay_secs)).await;
            }
        }

        if posts.is_empty() {
            return Err(ReviewError::EmptyPlan);
        }

        info!(prepared = posts.len(), total, "plan prepared for review");
        Ok(PendingPlan::new(plan.reasoning, posts))
    }

    /// Generate and classify one plan entry. `None` when the entry is
    /// abandoned (unknown specialty or generation exhausted).
    async fn prepare_entry(&self, index: usize, entry: PlanEntry) -> Option<PreparedPost> {
        let Some(specialty) = self.specialties.get(&entry.specialty) else {
            warn!(index, specialty = %entry.specialty, "unknown specialty, entry skipped");
            return None;
        };

        let req = GenerationRequest {
            topic: entry.topic.clone(),
            post_type: entry.post_type.clone(),
            channel: channel_context(specialty),
            feedback: None,
        };

        let content = self.generate_with_retries(&req).await?;
        let (zone, issues, recommendations) = self
            .classify(&content, &specialty.id, &specialty.name)
            .await;

        Some(PreparedPost {
            index,
            specialty: specialty.id.clone(),
            channel_id: specialty.channel.clone(),
            channel_name: specialty.name.clone(),
            channel_emoji: specialty.emoji.clone(),
            channel_link: specialty.link.clone(),
            topic: entry.topic,
            post_type: entry.post_type,
            publish_time: entry.publish_time,
            content,
            zone,
            issues,
            recommendations,
            removed: false,
        })
    }

    /// Bounded generation attempts with a fixed delay between them.
    pub(crate) async fn generate_with_retries(&self, req: &GenerationRequest) -> Option<String> {
        let attempts = self.cfg.generation_attempts.max(1);
        for attempt in 1..=attempts {
            match self.generator.generate(req).await {
                Ok(content) => return Some(content),
                Err(e) => {
                    warn!(topic = %req.topic, attempt, error = %e, "generation attempt failed")
                }
            }
            if attempt < attempts && self.cfg.retry_delay_secs > 0 {
                tokio::time::sleep(Duration::from_secs(self.cfg.retry_delay_secs)).await;
            }
        }
        warn!(topic = %req.topic, "generation exhausted, entry abandoned");
        None
    }

    /// Single safety check, fail-closed.
    ///
    /// A checker failure never drops the post silently — it is classified
    /// Yellow with a synthetic issue so the reviewer sees that the check
    /// could not run.
    pub(crate) async fn classify(
        &self,
        content: &str,
        specialty: &str,
        channel_name: &str,
    ) -> (SafetyZone, Vec<String>, Vec<String>) {
        match self.safety.check(content, specialty, channel_name).await {
            Ok(verdict) => (
                SafetyZone::from_verdict(&verdict),
                verdict.issues,
                verdict.recommendations,
            ),
            Err(e) => {
                warn!(specialty, error = %e, "safety check failed, classifying yellow");
                (
                    SafetyZone::Yellow,
                    vec![format!("safety check could not run: {e}")],
                    Vec::new(),
                )
            }
        }
    }

}

pub(crate) fn channel_context(specialty: &Specialty) -> ChannelContext {
    ChannelContext {
        specialty: specialty.id.clone(),
        name: specialty.name.clone(),
        emoji: specialty.emoji.clone(),
        link: specialty.link.clone(),
    }
}
