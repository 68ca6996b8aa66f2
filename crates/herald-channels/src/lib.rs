//! `herald-channels` — the messaging boundary.
//!
//! Defines the [`Channel`] trait the publisher dispatches through, the
//! [`OutboundPost`] payload, and the Telegram adapter used by the reference
//! deployment. Any thrown error here is a dispatch failure from the queue's
//! point of view; the adapter only distinguishes transport-level failures so
//! the publisher loop can back off instead of burning per-task retries.

pub mod channel;
pub mod error;
pub mod telegram;
pub mod types;

pub use channel::Channel;
pub use error::ChannelError;
pub use telegram::TelegramChannel;
pub use types::{MessageRef, OutboundPost};
