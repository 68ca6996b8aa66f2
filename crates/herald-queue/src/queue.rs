use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::store::TaskStore;
use crate::types::{PublishTask, TaskStatus};

/// Per-status counts plus the derived success rate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueueStats {
    pub total: usize,
    pub pending: usize,
    pub scheduled: usize,
    pub processing: usize,
    pub completed: usize,
    pub failed: usize,
    /// completed / (completed + failed); 0 when nothing has finished yet.
    pub success_rate: f64,
}

/// Thread-safe lifecycle operations over the [`TaskStore`].
///
/// Every operation is a single lock-mutate-unlock step, so the polling loop
/// and the scheduled one-shot entry point can share one queue without
/// further coordination. Operations addressed at an absent id are logged
/// no-ops (duplicate completion signals and cancel/approve races are
/// expected), never errors.
pub struct TaskQueue {
    store: Mutex<TaskStore>,
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskQueue {
    pub fn new() -> Self {
        info!("task queue initialised");
        Self {
            store: Mutex::new(TaskStore::new()),
        }
    }

    /// Admit a task into the active partition. Returns its id.
    ///
    /// Admission normalises the status: a task whose scheduled time is not
    /// in the future enters as `Pending` regardless of what the caller set,
    /// so the next poll picks it up immediately. Identifier collision is
    /// last write wins — callers generate unique ids.
    pub fn add_task(&self, mut task: PublishTask) -> String {
        if task.scheduled_time <= Utc::now() {
            task.status = TaskStatus::Pending;
        }
        let id = task.id.clone();
        info!(
            task_id = %id,
            channel_id = %task.channel_id,
            scheduled_time = %task.scheduled_time,
            "task admitted"
        );
        self.store.lock().unwrap().active.insert(id.clone(), task);
        id
    }

    /// Look a task up by id across all partitions.
    pub fn get_task(&self, id: &str) -> Option<PublishTask> {
        self.store.lock().unwrap().get(id).cloned()
    }

    /// All active tasks due at `now`, in no guaranteed order.
    pub fn get_ready_tasks(&self, now: DateTime<Utc>) -> Vec<PublishTask> {
        self.store
            .lock()
            .unwrap()
            .active
            .values()
            .filter(|t| t.is_ready(now))
            .cloned()
            .collect()
    }

    /// Mark a task as in-flight just before dispatch.
    ///
    /// Transient: the next `complete_task`/`fail_task` overwrites it. A crash
    /// while Processing strands the task (known open failure mode — there is
    /// no reclaim deadline).
    pub fn mark_processing(&self, id: &str) -> bool {
        let mut store = self.store.lock().unwrap();
        match store.active.get_mut(id) {
            Some(task) => {
                task.status = TaskStatus::Processing;
                true
            }
            None => false,
        }
    }

    /// Move a task to the completed partition, recording the external
    /// message reference and delivery time. Logged no-op when absent.
    pub fn complete_task(&self, id: &str, message_ref: &str) {
        let mut store = self.store.lock().unwrap();
        match store.active.remove(id) {
            Some(mut task) => {
                task.status = TaskStatus::Completed;
                task.message_ref = Some(message_ref.to_string());
                task.published_at = Some(Utc::now());
                store.completed.insert(id.to_string(), task);
                info!(task_id = %id, message_ref = %message_ref, "task completed");
            }
            None => warn!(task_id = %id, "task not found for completion"),
        }
    }

    /// Record a dispatch failure.
    ///
    /// Increments the retry counter; once the budget is exhausted the task
    /// moves to the failed partition (terminal), otherwise it returns to
    /// `Pending` with its scheduled time untouched, so the next poll retries
    /// it. Logged no-op when absent.
    pub fn fail_task(&self, id: &str, error_text: &str) {
        let mut store = self.store.lock().unwrap();
        let Some(mut task) = store.active.remove(id) else {
            warn!(task_id = %id, "task not found for failure");
            return;
        };

        task.retry_count += 1;
        task.last_error = Some(error_text.to_string());

        if task.retry_count >= task.max_retries {
            task.status = TaskStatus::Failed;
            error!(
                task_id = %id,
                retries = task.retry_count,
                error = %error_text,
                "task failed terminally"
            );
            store.failed.insert(id.to_string(), task);
        } else {
            task.status = TaskStatus::Pending;
            warn!(
                task_id = %id,
                attempt = task.retry_count,
                max_retries = task.max_retries,
                error = %error_text,
                "task failed, will retry"
            );
            store.active.insert(id.to_string(), task);
        }
    }

    /// Remove an active task unconditionally. Returns whether one was found.
    ///
    /// A task in `Processing` can be cancelled, but the in-flight dispatch
    /// is not interrupted — cancellation only prevents a future retry.
    pub fn cancel_task(&self, id: &str) -> bool {
        let removed = self.store.lock().unwrap().active.remove(id);
        match removed {
            Some(_) => {
                info!(task_id = %id, "task cancelled");
                true
            }
            None => {
                warn!(task_id = %id, "task not found for cancellation");
                false
            }
        }
    }

    /// Purge completed/failed tasks whose scheduled time is older than
    /// `days` days. Active tasks are never touched. Returns count removed.
    pub fn cleanup_old_tasks(&self, days: i64) -> usize {
        let cutoff = Utc::now() - Duration::days(days);
        let mut store = self.store.lock().unwrap();
        let before = store.completed.len() + store.failed.len();
        store.completed.retain(|_, t| t.scheduled_time >= cutoff);
        store.failed.retain(|_, t| t.scheduled_time >= cutoff);
        let removed = before - (store.completed.len() + store.failed.len());
        if removed > 0 {
            info!(removed, days, "old tasks cleaned up");
        }
        removed
    }

    /// Current per-status counts and success rate.
    pub fn stats(&self) -> QueueStats {
        let store = self.store.lock().unwrap();
        let by_status = |s: TaskStatus| store.active.values().filter(|t| t.status == s).count();
        let completed = store.completed.len();
        let failed = store.failed.len();
        let finished = completed + failed;
        QueueStats {
            total: store.active.len() + finished,
            pending: by_status(TaskStatus::Pending),
            scheduled: by_status(TaskStatus::Scheduled),
            processing: by_status(TaskStatus::Processing),
            completed,
            failed,
            success_rate: if finished == 0 {
                0.0
            } else {
                completed as f64 / finished as f64
            },
        }
    }

    /// Upcoming `Scheduled` tasks, ascending by scheduled time, at most
    /// `limit` of them.
    pub fn upcoming_tasks(&self, limit: usize) -> Vec<PublishTask> {
        let store = self.store.lock().unwrap();
        let mut upcoming: Vec<PublishTask> = store
            .active
            .values()
            .filter(|t| t.status == TaskStatus::Scheduled)
            .cloned()
            .collect();
        upcoming.sort_by_key(|t| t.scheduled_time);
        upcoming.truncate(limit);
        upcoming
    }
}
