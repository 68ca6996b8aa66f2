//! `herald-agents` — the AI-service boundary.
//!
//! Three collaborator traits ([`Planner`], [`Generator`], [`SafetyChecker`])
//! plus an OpenRouter-compatible HTTP provider implementing all of them.
//! None of the traits retry internally; retry policy belongs to the callers
//! in `herald-review`.
//!
//! Planner and safety responses are decoded with strict serde schemas —
//! output that does not parse is a generation failure for that call, never a
//! string-scan salvage.

pub mod boundary;
pub mod error;
pub mod openrouter;
pub mod types;

pub use boundary::{Generator, Planner, SafetyChecker};
pub use error::{AgentError, Result};
pub use openrouter::OpenRouterProvider;
pub use types::{ChannelContext, DailyPlan, GenerationRequest, PlanEntry, SafetyVerdict, Severity};
