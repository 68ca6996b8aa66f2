//! `herald-core` — shared configuration, content types, and the top-level error.
//!
//! Every other crate in the workspace depends on this one and nothing here
//! depends back, so boundary types that cross crate lines (link buttons,
//! specialty directory entries) live in [`types`].

pub mod config;
pub mod error;
pub mod types;

pub use config::HeraldConfig;
pub use error::{HeraldError, Result};
pub use types::{LinkButton, Specialty};
