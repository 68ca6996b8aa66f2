use serde::{Deserialize, Serialize};

/// Presentation context of the channel a post is generated for.
///
/// Forwarded verbatim to the generator and safety checker so the model can
/// match the channel's audience and tone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelContext {
    /// Specialty identifier (e.g. `"cardiology"`).
    pub specialty: String,
    /// Human-readable channel name.
    pub name: String,
    /// Decorative emoji used in channel branding.
    pub emoji: String,
    /// Public link to the channel.
    pub link: String,
}

/// A single content-generation request.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub topic: String,
    pub post_type: String,
    pub channel: ChannelContext,
    /// Reviewer feedback injected when a post is regenerated.
    pub feedback: Option<String>,
}

/// One planned post inside a [`DailyPlan`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanEntry {
    pub specialty: String,
    pub topic: String,
    pub post_type: String,
    /// Intended publish time of day, `"HH:MM"`.
    pub publish_time: String,
    #[serde(default)]
    pub priority: u32,
}

/// The planner's daily publication plan.
///
/// Decoded strictly from the planner's JSON output; a response that does not
/// match this schema is rejected as a parse failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyPlan {
    pub plan_date: String,
    pub posts: Vec<PlanEntry>,
    #[serde(default)]
    pub total_posts: u32,
    #[serde(default)]
    pub reasoning: String,
}

/// Severity tier reported by the safety checker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    /// Catch-all for values outside the known tiers.
    #[serde(other)]
    Unknown,
}

/// Result of a single safety check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyVerdict {
    pub is_safe: bool,
    #[serde(default = "default_severity")]
    pub severity: Severity,
    #[serde(default)]
    pub issues: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

fn default_severity() -> Severity {
    Severity::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn daily_plan_decodes() {
        let json = r#"{
            "plan_date": "2026-08-23",
            "posts": [
                {"specialty": "cardiology", "topic": "Statin guidelines",
                 "post_type": "guideline_review", "publish_time": "09:00", "priority": 1}
            ],
            "total_posts": 1,
            "reasoning": "Weekday morning slot."
        }"#;
        let plan: DailyPlan = serde_json::from_str(json).expect("plan should decode");
        assert_eq!(plan.posts.len(), 1);
        assert_eq!(plan.posts[0].publish_time, "09:00");
    }

    #[test]
    fn malformed_plan_is_a_decode_error() {
        // posts must be an array of entries, not free text
        let json = r#"{"plan_date": "2026-08-23", "posts": "three posts about statins"}"#;
        assert!(serde_json::from_str::<DailyPlan>(json).is_err());
    }

    #[test]
    fn unknown_severity_maps_to_catch_all() {
        let v: SafetyVerdict =
            serde_json::from_str(r#"{"is_safe": false, "severity": "catastrophic"}"#).unwrap();
        assert_eq!(v.severity, Severity::Unknown);
        assert!(v.issues.is_empty());
    }

    #[test]
    fn verdict_defaults_severity_when_absent() {
        let v: SafetyVerdict = serde_json::from_str(r#"{"is_safe": true}"#).unwrap();
        assert_eq!(v.severity, Severity::Unknown);
    }
}
