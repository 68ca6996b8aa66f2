//! Reviewer-facing plan approval: hold pending plans per reviewer and turn
//! approved posts into queue tasks.

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveTime, Utc};
use dashmap::DashMap;
use herald_agents::types::{ChannelContext, GenerationRequest};
use herald_core::config::ReviewConfig;
use herald_queue::{PublishTask, TaskQueue, TaskStatus};
use tracing::{info, warn};

use crate::plan::{PendingPlan, PreparedPost};
use crate::preparer::PlanPreparer;

/// Result of approving a plan: queue ids of the admitted tasks plus the
/// number of posts that could not be scheduled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalOutcome {
    pub scheduled: Vec<String>,
    pub failed: usize,
}

/// Per-reviewer pending-plan store and the actions a reviewer can take on
/// their plan.
///
/// Each reviewer holds at most one pending plan; staging a new one replaces
/// it. Plans are broadcast as independent clones, so two reviewers editing
/// "the same" plan never see each other's changes, and whoever approves
/// first wins only their own copy. Stale references (wrong reviewer, wrong
/// plan id, unknown index) answer `false`/`None` rather than erroring —
/// reviewer actions racing with approval or expiry are routine.
pub struct ApprovalWorkflow {
    plans: DashMap<u64, PendingPlan>,
    queue: Arc<TaskQueue>,
    preparer: Arc<PlanPreparer>,
    cfg: ReviewConfig,
}

impl ApprovalWorkflow {
    pub fn new(queue: Arc<TaskQueue>, preparer: Arc<PlanPreparer>, cfg: ReviewConfig) -> Self {
        Self {
            plans: DashMap::new(),
            queue,
            preparer,
            cfg,
        }
    }

    /// Hand a prepared plan to every reviewer, each getting their own copy.
    pub fn stage(&self, reviewers: &[u64], plan: PendingPlan) {
        info!(
            plan_id = %plan.plan_id,
            posts = plan.total_active(),
            reviewers = reviewers.len(),
            "plan staged for review"
        );
        for &reviewer in reviewers {
            self.plans.insert(reviewer, plan.clone());
        }
    }

    /// The reviewer's current pending plan, if any.
    pub fn pending(&self, reviewer: u64) -> Option<PendingPlan> {
        self.plans.get(&reviewer).map(|p| p.clone())
    }

    /// Remember the rendered review feed's message reference so the
    /// presentation layer can update it in place.
    pub fn record_feed_ref(&self, reviewer: u64, message_ref: impl Into<String>) -> bool {
        match self.plans.get_mut(&reviewer) {
            Some(mut plan) => {
                plan.feed_message_ref = Some(message_ref.into());
                true
            }
            None => false,
        }
    }

    /// Regenerate one post with reviewer feedback, then re-run the safety
    /// classification on the new content. `false` for stale references or
    /// when generation is exhausted (the old content stays).
    pub async fn regenerate_post(
        &self,
        reviewer: u64,
        plan_id: &str,
        index: usize,
        feedback: &str,
    ) -> bool {
        // Clone what the request needs, then drop the map guard across the
        // await points.
        let req = {
            let Some(plan) = self.plans.get(&reviewer) else {
                return false;
            };
            if plan.plan_id != plan_id {
                return false;
            }
            let Some(post) = plan.posts.iter().find(|p| p.index == index && !p.removed) else {
                return false;
            };
            GenerationRequest {
                topic: post.topic.clone(),
                post_type: post.post_type.clone(),
                channel: ChannelContext {
                    specialty: post.specialty.clone(),
                    name: post.channel_name.clone(),
                    emoji: post.channel_emoji.clone(),
                    link: post.channel_link.clone(),
                },
                feedback: Some(feedback.to_string()),
            }
        };

        let Some(content) = self.preparer.generate_with_retries(&req).await else {
            warn!(reviewer, index, "regeneration exhausted, keeping old content");
            return false;
        };
        let (zone, issues, recommendations) = self
            .preparer
            .classify(&content, &req.channel.specialty, &req.channel.name)
            .await;

        let Some(mut plan) = self.plans.get_mut(&reviewer) else {
            // Plan approved or expired while we were generating.
            return false;
        };
        if plan.plan_id != plan_id {
            return false;
        }
        let Some(post) = plan
            .posts
            .iter_mut()
            .find(|p| p.index == index && !p.removed)
        else {
            return false;
        };
        post.content = content;
        post.zone = zone;
        post.issues = issues;
        post.recommendations = recommendations;
        info!(reviewer, index, zone = ?post.zone, "post regenerated");
        true
    }

    /// Soft-remove a post from the reviewer's plan. Indices of the remaining
    /// posts never shift.
    pub fn remove_post(&self, reviewer: u64, plan_id: &str, index: usize) -> bool {
        let Some(mut plan) = self.plans.get_mut(&reviewer) else {
            return false;
        };
        if plan.plan_id != plan_id {
            return false;
        }
        match plan.posts.iter_mut().find(|p| p.index == index) {
            Some(post) if !post.removed => {
                post.removed = true;
                info!(reviewer, index, "post removed from plan");
                true
            }
            _ => false,
        }
    }

    /// Full detail of one post, for the reviewer's expanded view.
    pub fn view_post(&self, reviewer: u64, plan_id: &str, index: usize) -> Option<PreparedPost> {
        let plan = self.plans.get(&reviewer)?;
        if plan.plan_id != plan_id {
            return None;
        }
        plan.posts
            .iter()
            .find(|p| p.index == index && !p.removed)
            .cloned()
    }

    /// Approve the reviewer's plan: every active post becomes a queue task.
    ///
    /// The plan binding is consumed no matter what — even a plan whose every
    /// post fails to schedule does not stay pending. A post with an
    /// unparseable publish time counts as failed; one whose time already
    /// passed today is pushed forward by the late grace.
    pub fn approve_and_schedule(&self, reviewer: u64) -> Option<ApprovalOutcome> {
        let (_, plan) = self.plans.remove(&reviewer)?;
        let now = Utc::now();
        let grace = Duration::minutes(self.cfg.late_grace_mins as i64);

        let mut scheduled = Vec::new();
        let mut failed = 0;
        for post in plan.active_posts() {
            let Some(when) = resolve_publish_time(&post.publish_time, now, grace) else {
                warn!(
                    plan_id = %plan.plan_id,
                    index = post.index,
                    publish_time = %post.publish_time,
                    "unparseable publish time, post not scheduled"
                );
                failed += 1;
                continue;
            };

            let mut task = PublishTask::new(&post.channel_id, &post.content, when);
            task.created_by = reviewer;
            // Imminent tasks go straight to Pending so the next poll takes
            // them without waiting out a Scheduled round-trip.
            task.status = if when > now + Duration::minutes(1) {
                TaskStatus::Scheduled
            } else {
                TaskStatus::Pending
            };
            scheduled.push(self.queue.add_task(task));
        }

        info!(
            plan_id = %plan.plan_id,
            reviewer,
            scheduled = scheduled.len(),
            failed,
            "plan approved"
        );
        Some(ApprovalOutcome { scheduled, failed })
    }

    /// Discard the reviewer's pending plan, but only if it is still the one
    /// the reviewer is looking at.
    pub fn cancel_plan(&self, reviewer: u64, plan_id: &str) -> bool {
        let removed = self
            .plans
            .remove_if(&reviewer, |_, plan| plan.plan_id == plan_id);
        match removed {
            Some(_) => {
                info!(reviewer, plan_id, "plan cancelled");
                true
            }
            None => false,
        }
    }

    /// Drop plans older than the configured TTL. Returns how many expired.
    pub fn expire_stale(&self, now: DateTime<Utc>) -> usize {
        let ttl = Duration::hours(self.cfg.plan_ttl_hours as i64);
        let before = self.plans.len();
        self.plans.retain(|reviewer, plan| {
            let keep = now - plan.created_at < ttl;
            if !keep {
                info!(reviewer, plan_id = %plan.plan_id, "pending plan expired");
            }
            keep
        });
        before - self.plans.len()
    }
}

/// `"HH:MM"` → concrete instant today (UTC). Times already in the past are
/// pushed forward to `now + grace`. `None` when the text does not parse.
fn resolve_publish_time(
    hhmm: &str,
    now: DateTime<Utc>,
    grace: Duration,
) -> Option<DateTime<Utc>> {
    let time = NaiveTime::parse_from_str(hhmm, "%H:%M").ok()?;
    let when = now.date_naive().and_time(time).and_utc();
    Some(if when <= now { now + grace } else { when })
}
