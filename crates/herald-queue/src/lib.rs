//! `herald-queue` — the publish-task lifecycle engine.
//!
//! # State machine
//!
//! A task is admitted as `Pending` (due now) or `Scheduled` (due later),
//! is briefly marked `Processing` while a dispatch is in flight, and ends in
//! exactly one of three terminal states:
//!
//! | Transition                                   | Result                      |
//! |----------------------------------------------|-----------------------------|
//! | dispatch succeeds                            | `Completed` (terminal)      |
//! | dispatch fails, retries left                 | back to `Pending`           |
//! | dispatch fails, retry budget exhausted       | `Failed` (terminal)         |
//! | explicit cancel                              | `Cancelled` (terminal)      |
//!
//! Failed-with-retries-left tasks keep their `scheduled_time`, so they are
//! picked up again on the very next poll — there is no backoff between task
//! retries, only between poll cycles.
//!
//! Storage is in-memory ([`store::TaskStore`], three partitions behind a
//! mutex in [`queue::TaskQueue`]); durability is explicitly out of scope.

pub mod queue;
pub mod store;
pub mod types;

pub use queue::{QueueStats, TaskQueue};
pub use types::{PublishTask, TaskStatus};
