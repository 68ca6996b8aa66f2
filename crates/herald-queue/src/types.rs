use chrono::{DateTime, Utc};
use herald_core::config::DEFAULT_MAX_RETRIES;
use herald_core::types::LinkButton;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state of a publish task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Due now (or overdue); picked up by the next poll.
    Pending,
    /// Waiting for its scheduled time.
    Scheduled,
    /// A dispatch is in flight. Transient; overwritten by the next transition.
    Processing,
    /// Delivered successfully (terminal).
    Completed,
    /// Retry budget exhausted (terminal).
    Failed,
    /// Explicitly cancelled before delivery (terminal).
    Cancelled,
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Scheduled => "scheduled",
            TaskStatus::Processing => "processing",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
            TaskStatus::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TaskStatus::Pending),
            "scheduled" => Ok(TaskStatus::Scheduled),
            "processing" => Ok(TaskStatus::Processing),
            "completed" => Ok(TaskStatus::Completed),
            "failed" => Ok(TaskStatus::Failed),
            "cancelled" => Ok(TaskStatus::Cancelled),
            other => Err(format!("unknown task status: {other}")),
        }
    }
}

/// One scheduled outbound post with its own lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishTask {
    /// Unique short token, assigned at creation, immutable.
    pub id: String,
    /// Channel identifier understood by the messaging boundary.
    pub channel_id: String,
    /// Post body (HTML markup).
    pub text: String,

    /// Optional media, delivered by URL.
    pub photo_url: Option<String>,
    pub video_url: Option<String>,
    pub document_url: Option<String>,
    /// Inline URL buttons rendered below the post.
    #[serde(default)]
    pub buttons: Vec<LinkButton>,

    /// Instant after which the task is eligible for dispatch.
    pub scheduled_time: DateTime<Utc>,
    /// Current lifecycle state.
    pub status: TaskStatus,

    /// External message reference, set once on successful delivery.
    pub message_ref: Option<String>,
    /// Actual delivery time, set once on successful delivery.
    pub published_at: Option<DateTime<Utc>>,

    /// Dispatch attempts so far. Never exceeds `max_retries`.
    pub retry_count: u32,
    /// Retry budget, fixed at creation.
    pub max_retries: u32,
    /// Message of the most recent dispatch failure.
    pub last_error: Option<String>,

    pub created_at: DateTime<Utc>,
    /// Reviewer identifier, 0 = system-generated.
    pub created_by: u64,
}

impl PublishTask {
    /// New task due at `scheduled_time`, with the default retry budget.
    ///
    /// The id is a random 8-character token; uniqueness is the caller's
    /// implicit contract with the queue (identifier collision is last write
    /// wins).
    pub fn new(
        channel_id: impl Into<String>,
        text: impl Into<String>,
        scheduled_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id: short_id(),
            channel_id: channel_id.into(),
            text: text.into(),
            photo_url: None,
            video_url: None,
            document_url: None,
            buttons: Vec::new(),
            scheduled_time,
            status: TaskStatus::Pending,
            message_ref: None,
            published_at: None,
            retry_count: 0,
            max_retries: DEFAULT_MAX_RETRIES,
            last_error: None,
            created_at: Utc::now(),
            created_by: 0,
        }
    }

    /// True when the task would be returned by a readiness poll at `now`.
    pub fn is_ready(&self, now: DateTime<Utc>) -> bool {
        matches!(self.status, TaskStatus::Pending | TaskStatus::Scheduled)
            && self.scheduled_time <= now
    }
}

/// Random 8-character task token.
fn short_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(8);
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn status_round_trips_through_str() {
        for s in [
            TaskStatus::Pending,
            TaskStatus::Scheduled,
            TaskStatus::Processing,
            TaskStatus::Completed,
            TaskStatus::Failed,
            TaskStatus::Cancelled,
        ] {
            assert_eq!(s.to_string().parse::<TaskStatus>().unwrap(), s);
        }
        assert!("paused".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn new_task_has_short_unique_id() {
        let now = Utc::now();
        let a = PublishTask::new("@c", "a", now);
        let b = PublishTask::new("@c", "b", now);
        assert_eq!(a.id.len(), 8);
        assert_ne!(a.id, b.id);
        assert_eq!(a.max_retries, 3);
        assert_eq!(a.created_by, 0);
    }

    #[test]
    fn readiness_requires_due_time_and_live_status() {
        let now = Utc::now();
        let mut task = PublishTask::new("@c", "x", now - Duration::seconds(1));
        assert!(task.is_ready(now));

        task.status = TaskStatus::Scheduled;
        assert!(task.is_ready(now));

        task.scheduled_time = now + Duration::minutes(5);
        assert!(!task.is_ready(now));

        task.scheduled_time = now;
        task.status = TaskStatus::Processing;
        assert!(!task.is_ready(now));
        task.status = TaskStatus::Completed;
        assert!(!task.is_ready(now));
    }
}
