//! `herald-service` — the application context.
//!
//! [`PublishingService`] wires the queue, publisher loop, plan preparer and
//! approval workflow together from explicitly injected collaborators, and is
//! the single surface a frontend (bot, CLI, scheduler) talks to.

pub mod service;

pub use service::PublishingService;
