use chrono::{DateTime, Utc};
use herald_agents::types::{SafetyVerdict, Severity};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Coarse risk classification used for reviewer triage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SafetyZone {
    /// Safe and lowest severity tier — publish as-is.
    Green,
    /// Remarks at low/medium severity — worth a look.
    Yellow,
    /// High or unclassifiable severity — needs editing or removal.
    Red,
}

impl SafetyZone {
    /// Map a checker verdict to a zone.
    pub fn from_verdict(verdict: &SafetyVerdict) -> Self {
        match (verdict.is_safe, verdict.severity) {
            (true, Severity::Low) => SafetyZone::Green,
            (_, Severity::Low | Severity::Medium) => SafetyZone::Yellow,
            _ => SafetyZone::Red,
        }
    }
}

/// Generated, safety-classified content for one plan entry, awaiting
/// approval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreparedPost {
    /// Position within the plan. Stable for the plan's lifetime — removed
    /// posts keep their index so reviewer references never shift.
    pub index: usize,

    /// Specialty/channel binding.
    pub specialty: String,
    pub channel_id: String,
    pub channel_name: String,
    pub channel_emoji: String,
    pub channel_link: String,

    pub topic: String,
    pub post_type: String,
    /// Intended publish time of day, `"HH:MM"`.
    pub publish_time: String,

    /// Generated body (HTML markup).
    pub content: String,
    pub zone: SafetyZone,
    pub issues: Vec<String>,
    pub recommendations: Vec<String>,

    /// Soft delete — excluded from approval but never physically removed.
    pub removed: bool,
}

/// The review unit handed to a reviewer: one day's prepared posts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingPlan {
    pub plan_id: String,
    pub created_at: DateTime<Utc>,
    /// Planner's free-text rationale, shown at the top of the review feed.
    pub reasoning: String,
    pub posts: Vec<PreparedPost>,
    /// Outward message reference of the rendered review feed, for in-place
    /// updates by the presentation layer.
    pub feed_message_ref: Option<String>,
}

impl PendingPlan {
    pub fn new(reasoning: impl Into<String>, posts: Vec<PreparedPost>) -> Self {
        Self {
            plan_id: Uuid::new_v4().simple().to_string(),
            created_at: Utc::now(),
            reasoning: reasoning.into(),
            posts,
            feed_message_ref: None,
        }
    }

    /// Posts still part of the plan.
    pub fn active_posts(&self) -> impl Iterator<Item = &PreparedPost> {
        self.posts.iter().filter(|p| !p.removed)
    }

    pub fn total_active(&self) -> usize {
        self.active_posts().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verdict(is_safe: bool, severity: Severity) -> SafetyVerdict {
        SafetyVerdict {
            is_safe,
            severity,
            issues: vec![],
            recommendations: vec![],
        }
    }

    #[test]
    fn zone_mapping_covers_all_tiers() {
        use Severity::*;
        assert_eq!(
            SafetyZone::from_verdict(&verdict(true, Low)),
            SafetyZone::Green
        );
        // safe but not lowest tier is still worth a look
        assert_eq!(
            SafetyZone::from_verdict(&verdict(true, Medium)),
            SafetyZone::Yellow
        );
        assert_eq!(
            SafetyZone::from_verdict(&verdict(false, Low)),
            SafetyZone::Yellow
        );
        assert_eq!(
            SafetyZone::from_verdict(&verdict(false, Medium)),
            SafetyZone::Yellow
        );
        assert_eq!(
            SafetyZone::from_verdict(&verdict(false, High)),
            SafetyZone::Red
        );
        assert_eq!(
            SafetyZone::from_verdict(&verdict(true, Unknown)),
            SafetyZone::Red
        );
    }

    #[test]
    fn removed_posts_drop_out_of_active_view_but_keep_indices() {
        let mut plan = PendingPlan::new(
            "r",
            (0..3)
                .map(|i| PreparedPost {
                    index: i,
                    specialty: "cardiology".into(),
                    channel_id: "@cardio".into(),
                    channel_name: "Cardiology".into(),
                    channel_emoji: String::new(),
                    channel_link: String::new(),
                    topic: format!("topic {i}"),
                    post_type: "guideline_review".into(),
                    publish_time: "09:00".into(),
                    content: "body".into(),
                    zone: SafetyZone::Green,
                    issues: vec![],
                    recommendations: vec![],
                    removed: false,
                })
                .collect(),
        );
        assert_eq!(plan.total_active(), 3);

        plan.posts[1].removed = true;
        assert_eq!(plan.total_active(), 2);
        let indices: Vec<usize> = plan.active_posts().map(|p| p.index).collect();
        assert_eq!(indices, vec![0, 2]);
        // still physically present
        assert_eq!(plan.posts.len(), 3);
    }
}
