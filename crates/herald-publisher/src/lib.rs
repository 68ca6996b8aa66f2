//! `herald-publisher` — the background dispatch loop.
//!
//! [`Publisher::run`] polls the task queue on a fixed interval, dispatches
//! every due task through the messaging boundary, and reports outcomes back
//! to the queue. [`Publisher::publish_due`] is the same single batch exposed
//! as a one-shot entry point for external schedulers (cron-style setups that
//! prefer no resident loop).

pub mod publisher;

pub use publisher::{DispatchReport, Publisher};
