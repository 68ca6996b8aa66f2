use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use herald_agents::boundary::{Generator, Planner, SafetyChecker};
use herald_agents::OpenRouterProvider;
use herald_channels::{Channel, TelegramChannel};
use herald_core::config::HeraldConfig;
use herald_core::error::{HeraldError, Result};
use herald_publisher::{DispatchReport, Publisher};
use herald_queue::{PublishTask, QueueStats, TaskQueue};
use herald_review::{
    ApprovalOutcome, ApprovalWorkflow, PendingPlan, PlanPreparer, PreparedPost,
};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// The assembled application: queue, publisher loop, preparer and approval
/// workflow behind one facade.
///
/// All collaborators are injected at construction; nothing here is global.
/// The service owns the publisher loop's lifetime through a watch channel —
/// [`start`](Self::start) spawns it, [`shutdown`](Self::shutdown) signals it
/// and waits for it to drain.
pub struct PublishingService {
    queue: Arc<TaskQueue>,
    publisher: Arc<Publisher>,
    preparer: Arc<PlanPreparer>,
    review: ApprovalWorkflow,
    publisher_loop: Mutex<Option<(watch::Sender<bool>, JoinHandle<()>)>>,
}

impl PublishingService {
    pub fn new(
        planner: Arc<dyn Planner>,
        generator: Arc<dyn Generator>,
        safety: Arc<dyn SafetyChecker>,
        channel: Arc<dyn Channel>,
        config: HeraldConfig,
    ) -> Self {
        let queue = Arc::new(TaskQueue::new());
        let preparer = Arc::new(PlanPreparer::new(
            planner,
            generator,
            safety,
            config.specialties.clone(),
            config.preparer.clone(),
        ));
        let review = ApprovalWorkflow::new(queue.clone(), preparer.clone(), config.review.clone());
        let publisher = Arc::new(Publisher::new(
            queue.clone(),
            channel,
            config.publisher.clone(),
        ));
        Self {
            queue,
            publisher,
            preparer,
            review,
            publisher_loop: Mutex::new(None),
        }
    }

    /// Assemble the reference deployment: OpenRouter provider for all three
    /// agent roles, Telegram as the channel. Errors when either credential
    /// block is missing from the config.
    pub fn from_config(config: HeraldConfig) -> Result<Self> {
        let or = config
            .providers
            .openrouter
            .clone()
            .ok_or_else(|| HeraldError::Config("providers.openrouter is required".into()))?;
        let tg = config
            .channels
            .telegram
            .clone()
            .ok_or_else(|| HeraldError::Config("channels.telegram is required".into()))?;

        let provider = Arc::new(OpenRouterProvider::new(
            or.api_key,
            Some(or.base_url),
            or.model,
            config.specialties.clone(),
        ));
        let channel = Arc::new(TelegramChannel::new(&tg.bot_token));

        Ok(Self::new(
            provider.clone(),
            provider.clone(),
            provider,
            channel,
            config,
        ))
    }

    /// Spawn the background publisher loop. No-op if already running.
    pub fn start(&self) {
        let mut slot = self.publisher_loop.lock().unwrap();
        if slot.is_some() {
            warn!("publisher loop already running");
            return;
        }
        let (tx, rx) = watch::channel(false);
        let publisher = self.publisher.clone();
        let handle = tokio::spawn(async move { publisher.run(rx).await });
        *slot = Some((tx, handle));
        info!("publishing service started");
    }

    /// Signal the publisher loop to stop and wait for it to finish.
    pub async fn shutdown(&self) {
        let running = self.publisher_loop.lock().unwrap().take();
        let Some((tx, handle)) = running else {
            return;
        };
        let _ = tx.send(true);
        if handle.await.is_err() {
            warn!("publisher loop ended abnormally");
        }
        info!("publishing service stopped");
    }

    // --- queue surface ---

    pub fn schedule_task(&self, task: PublishTask) -> String {
        self.queue.add_task(task)
    }

    pub fn cancel_task(&self, id: &str) -> bool {
        self.queue.cancel_task(id)
    }

    pub fn get_task(&self, id: &str) -> Option<PublishTask> {
        self.queue.get_task(id)
    }

    pub fn list_upcoming(&self, limit: usize) -> Vec<PublishTask> {
        self.queue.upcoming_tasks(limit)
    }

    pub fn stats(&self) -> QueueStats {
        self.queue.stats()
    }

    pub fn cleanup_old_tasks(&self, days: i64) -> usize {
        self.queue.cleanup_old_tasks(days)
    }

    /// One dispatch batch, for deployments driven by an external scheduler
    /// instead of (or alongside) the resident loop.
    pub async fn publish_due(&self) -> DispatchReport {
        self.publisher.publish_due().await
    }

    // --- plan surface ---

    pub async fn prepare_daily_plan(
        &self,
        specialties: Option<&[String]>,
    ) -> herald_review::Result<PendingPlan> {
        self.preparer.prepare_daily_plan(specialties).await
    }

    pub fn stage_plan(&self, reviewers: &[u64], plan: PendingPlan) {
        self.review.stage(reviewers, plan)
    }

    pub fn pending_plan(&self, reviewer: u64) -> Option<PendingPlan> {
        self.review.pending(reviewer)
    }

    pub fn record_feed_ref(&self, reviewer: u64, message_ref: impl Into<String>) -> bool {
        self.review.record_feed_ref(reviewer, message_ref)
    }

    pub async fn regenerate_post(
        &self,
        reviewer: u64,
        plan_id: &str,
        index: usize,
        feedback: &str,
    ) -> bool {
        self.review
            .regenerate_post(reviewer, plan_id, index, feedback)
            .await
    }

    pub fn remove_post(&self, reviewer: u64, plan_id: &str, index: usize) -> bool {
        self.review.remove_post(reviewer, plan_id, index)
    }

    pub fn view_post(&self, reviewer: u64, plan_id: &str, index: usize) -> Option<PreparedPost> {
        self.review.view_post(reviewer, plan_id, index)
    }

    pub fn approve_and_schedule(&self, reviewer: u64) -> Option<ApprovalOutcome> {
        self.review.approve_and_schedule(reviewer)
    }

    pub fn cancel_plan(&self, reviewer: u64, plan_id: &str) -> bool {
        self.review.cancel_plan(reviewer, plan_id)
    }

    pub fn expire_stale_plans(&self, now: DateTime<Utc>) -> usize {
        self.review.expire_stale(now)
    }
}
