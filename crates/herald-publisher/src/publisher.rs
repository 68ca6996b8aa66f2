use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use herald_channels::{Channel, OutboundPost};
use herald_core::config::PublisherConfig;
use herald_queue::{PublishTask, TaskQueue};
use tokio::sync::watch;
use tracing::{info, warn};

/// Outcome of one dispatch batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub published: usize,
    pub failed: usize,
    /// Failures the adapter classified as transport-level (connectivity,
    /// flood limits). These trigger the loop's error backoff.
    pub transport_errors: usize,
}

/// Dispatches due tasks from the queue through a [`Channel`].
pub struct Publisher {
    queue: Arc<TaskQueue>,
    channel: Arc<dyn Channel>,
    cfg: PublisherConfig,
}

impl Publisher {
    pub fn new(queue: Arc<TaskQueue>, channel: Arc<dyn Channel>, cfg: PublisherConfig) -> Self {
        Self {
            queue,
            channel,
            cfg,
        }
    }

    /// Poll-dispatch loop. Runs until `shutdown` flips to true.
    ///
    /// After a batch that hit transport-level failures the next poll waits
    /// out the error backoff instead of the regular interval — per-task
    /// retry budgets should not be burned against a dead network.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            channel = self.channel.name(),
            poll_interval_secs = self.cfg.poll_interval_secs,
            "publisher loop started"
        );
        loop {
            let report = self.publish_due().await;

            let pause = if report.transport_errors > 0 {
                warn!(
                    transport_errors = report.transport_errors,
                    backoff_secs = self.cfg.error_backoff_secs,
                    "transport failures in batch, backing off"
                );
                Duration::from_secs(self.cfg.error_backoff_secs)
            } else {
                Duration::from_secs(self.cfg.poll_interval_secs)
            };

            tokio::select! {
                _ = tokio::time::sleep(pause) => {}
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("publisher loop stopping");
                        return;
                    }
                }
            }
        }
    }

    /// Dispatch every task due right now, pacing consecutive sends.
    ///
    /// Each task is marked `Processing` before its send; a task another
    /// actor grabbed or cancelled between the poll and the marking is
    /// skipped. Outcomes go straight back to the queue, so a mid-batch
    /// crash loses at most the in-flight task.
    pub async fn publish_due(&self) -> DispatchReport {
        let due = self.queue.get_ready_tasks(Utc::now());
        if due.is_empty() {
            return DispatchReport::default();
        }
        info!(count = due.len(), "dispatching due tasks");

        let mut report = DispatchReport::default();
        let total = due.len();
        for (i, task) in due.into_iter().enumerate() {
            if !self.queue.mark_processing(&task.id) {
                continue;
            }
            self.dispatch(&task, &mut report).await;

            if i + 1 < total && self.cfg.dispatch_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.cfg.dispatch_delay_ms)).await;
            }
        }
        report
    }

    async fn dispatch(&self, task: &PublishTask, report: &mut DispatchReport) {
        let post = outbound(task);
        match self.channel.send(&post).await {
            Ok(message_ref) => {
                self.queue.complete_task(&task.id, &message_ref.0);
                report.published += 1;
            }
            Err(e) => {
                warn!(task_id = %task.id, error = %e, "dispatch failed");
                self.queue.fail_task(&task.id, &e.to_string());
                report.failed += 1;
                if e.is_transport() {
                    report.transport_errors += 1;
                }
            }
        }
    }
}

fn outbound(task: &PublishTask) -> OutboundPost {
    OutboundPost {
        channel_id: task.channel_id.clone(),
        text: task.text.clone(),
        photo_url: task.photo_url.clone(),
        video_url: task.video_url.clone(),
        document_url: task.document_url.clone(),
        buttons: task.buttons.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Duration as ChronoDuration;
    use herald_channels::{ChannelError, MessageRef};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays a scripted sequence of send outcomes and records every post.
    struct ScriptedChannel {
        outcomes: Mutex<VecDeque<Result<MessageRef, ChannelError>>>,
        sent: Mutex<Vec<OutboundPost>>,
    }

    impl ScriptedChannel {
        fn new(outcomes: Vec<Result<MessageRef, ChannelError>>) -> Arc<Self> {
            Arc::new(Self {
                outcomes: Mutex::new(outcomes.into()),
                sent: Mutex::new(Vec::new()),
            })
        }

        fn always_ok() -> Arc<Self> {
            Arc::new(Self {
                outcomes: Mutex::new(VecDeque::new()),
                sent: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Channel for ScriptedChannel {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn send(&self, post: &OutboundPost) -> Result<MessageRef, ChannelError> {
            self.sent.lock().unwrap().push(post.clone());
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(MessageRef("ok".into())))
        }
    }

    fn no_delays() -> PublisherConfig {
        PublisherConfig {
            poll_interval_secs: 0,
            dispatch_delay_ms: 0,
            error_backoff_secs: 0,
        }
    }

    fn due_task(queue: &TaskQueue, text: &str) -> String {
        queue.add_task(PublishTask::new(
            "@chan",
            text,
            Utc::now() - ChronoDuration::seconds(1),
        ))
    }

    #[tokio::test]
    async fn successful_dispatch_completes_the_task() {
        let queue = Arc::new(TaskQueue::new());
        let channel = ScriptedChannel::new(vec![Ok(MessageRef("msg-17".into()))]);
        let id = due_task(&queue, "hello");

        let publisher = Publisher::new(queue.clone(), channel.clone(), no_delays());
        let report = publisher.publish_due().await;

        assert_eq!(report.published, 1);
        assert_eq!(report.failed, 0);
        let task = queue.get_task(&id).unwrap();
        assert_eq!(task.status, herald_queue::TaskStatus::Completed);
        assert_eq!(task.message_ref.as_deref(), Some("msg-17"));
        assert_eq!(channel.sent.lock().unwrap()[0].text, "hello");
    }

    #[tokio::test]
    async fn media_and_buttons_survive_into_the_outbound_post() {
        let queue = Arc::new(TaskQueue::new());
        let channel = ScriptedChannel::always_ok();
        let mut task = PublishTask::new("@chan", "body", Utc::now() - ChronoDuration::seconds(1));
        task.photo_url = Some("https://example.org/p.png".into());
        task.buttons = vec![herald_core::types::LinkButton {
            label: "Read more".into(),
            url: "https://example.org".into(),
        }];
        queue.add_task(task);

        Publisher::new(queue, channel.clone(), no_delays())
            .publish_due()
            .await;

        let sent = channel.sent.lock().unwrap();
        assert_eq!(sent[0].photo_url.as_deref(), Some("https://example.org/p.png"));
        assert_eq!(sent[0].buttons[0].label, "Read more");
    }

    #[tokio::test]
    async fn failed_dispatch_is_retried_on_the_next_batch() {
        let queue = Arc::new(TaskQueue::new());
        let channel = ScriptedChannel::new(vec![
            Err(ChannelError::SendFailed("rejected".into())),
            Ok(MessageRef("msg-2".into())),
        ]);
        let id = due_task(&queue, "retry me");
        let publisher = Publisher::new(queue.clone(), channel, no_delays());

        let first = publisher.publish_due().await;
        assert_eq!(first.failed, 1);
        assert_eq!(first.transport_errors, 0);
        let task = queue.get_task(&id).unwrap();
        assert_eq!(task.retry_count, 1);
        assert_eq!(task.last_error.as_deref(), Some("Send failed: rejected"));

        let second = publisher.publish_due().await;
        assert_eq!(second.published, 1);
        assert_eq!(
            queue.get_task(&id).unwrap().status,
            herald_queue::TaskStatus::Completed
        );
    }

    #[tokio::test]
    async fn retry_exhaustion_ends_in_failed_partition() {
        let queue = Arc::new(TaskQueue::new());
        let channel = ScriptedChannel::new(vec![
            Err(ChannelError::SendFailed("bad payload".into())),
            Err(ChannelError::SendFailed("bad payload".into())),
        ]);
        let mut task = PublishTask::new("@chan", "doomed", Utc::now() - ChronoDuration::seconds(1));
        task.max_retries = 2;
        let id = queue.add_task(task);
        let publisher = Publisher::new(queue.clone(), channel, no_delays());

        publisher.publish_due().await;
        publisher.publish_due().await;

        let task = queue.get_task(&id).unwrap();
        assert_eq!(task.status, herald_queue::TaskStatus::Failed);
        assert_eq!(task.retry_count, 2);
        // terminal: nothing due any more
        assert_eq!(publisher.publish_due().await, DispatchReport::default());
    }

    #[tokio::test]
    async fn transport_failures_are_reported_separately() {
        let queue = Arc::new(TaskQueue::new());
        let channel = ScriptedChannel::new(vec![
            Err(ChannelError::ConnectionFailed("dns".into())),
            Err(ChannelError::SendFailed("rejected".into())),
        ]);
        due_task(&queue, "a");
        due_task(&queue, "b");

        let report = Publisher::new(queue, channel, no_delays()).publish_due().await;
        assert_eq!(report.failed, 2);
        assert_eq!(report.transport_errors, 1);
    }

    #[tokio::test]
    async fn empty_queue_is_a_quiet_noop() {
        let queue = Arc::new(TaskQueue::new());
        let channel = ScriptedChannel::always_ok();
        let report = Publisher::new(queue, channel.clone(), no_delays())
            .publish_due()
            .await;
        assert_eq!(report, DispatchReport::default());
        assert!(channel.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn run_loop_stops_on_shutdown_signal() {
        let queue = Arc::new(TaskQueue::new());
        due_task(&queue, "once");
        let channel = ScriptedChannel::always_ok();
        let publisher = Arc::new(Publisher::new(queue, channel.clone(), PublisherConfig {
            poll_interval_secs: 3600,
            dispatch_delay_ms: 0,
            error_backoff_secs: 3600,
        }));

        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn({
            let publisher = publisher.clone();
            async move { publisher.run(rx).await }
        });

        tx.send(true).unwrap();
        tokio::time::timeout(std::time::Duration::from_secs(5), handle)
            .await
            .expect("loop should stop promptly")
            .unwrap();
        // the first batch ran before the loop went to sleep
        assert_eq!(channel.sent.lock().unwrap().len(), 1);
    }
}
