//! In-memory task custody across three partitions.
//!
//! No business rules live here; the store only gives the queue O(1) lookup
//! and bucketed iteration. Locking is the queue's responsibility.

use std::collections::HashMap;

use crate::types::PublishTask;

/// Key-value custody of tasks partitioned by outcome.
#[derive(Debug, Default)]
pub struct TaskStore {
    /// Live tasks: pending, scheduled, or processing.
    pub active: HashMap<String, PublishTask>,
    /// Terminally completed tasks, retained for stats until cleanup.
    pub completed: HashMap<String, PublishTask>,
    /// Terminally failed tasks, retained for stats until cleanup.
    pub failed: HashMap<String, PublishTask>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look a task up in any partition.
    pub fn get(&self, id: &str) -> Option<&PublishTask> {
        self.active
            .get(id)
            .or_else(|| self.completed.get(id))
            .or_else(|| self.failed.get(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn get_searches_all_partitions() {
        let mut store = TaskStore::new();
        let a = PublishTask::new("@c", "active", Utc::now());
        let c = PublishTask::new("@c", "completed", Utc::now());
        let f = PublishTask::new("@c", "failed", Utc::now());
        let (ida, idc, idf) = (a.id.clone(), c.id.clone(), f.id.clone());
        store.active.insert(ida.clone(), a);
        store.completed.insert(idc.clone(), c);
        store.failed.insert(idf.clone(), f);

        assert_eq!(store.get(&ida).unwrap().text, "active");
        assert_eq!(store.get(&idc).unwrap().text, "completed");
        assert_eq!(store.get(&idf).unwrap().text, "failed");
        assert!(store.get("missing").is_none());
    }
}
