use async_trait::async_trait;

use crate::{
    error::ChannelError,
    types::{MessageRef, OutboundPost},
};

/// Common interface implemented by every channel adapter.
///
/// Implementations must be `Send + Sync` so a single adapter can be shared
/// between the polling publisher loop and the scheduled one-shot entry point.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Stable lowercase identifier for this channel (e.g. `"telegram"`).
    fn name(&self) -> &str;

    /// Deliver a single post.
    ///
    /// Returns a platform message reference on success. Any error is treated
    /// by the caller as a dispatch failure that feeds the task retry counter;
    /// [`ChannelError::is_transport`] errors additionally trigger the
    /// publisher's infrastructure backoff.
    async fn send(&self, post: &OutboundPost) -> Result<MessageRef, ChannelError>;
}
