use thiserror::Error;

/// Errors that can occur within any channel adapter.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The underlying transport could not be reached.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The remote endpoint rejected the message.
    #[error("Send failed: {0}")]
    SendFailed(String),

    /// The channel rejected the supplied credentials or token.
    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    /// An operation exceeded its allowed time budget.
    #[error("Operation timed out after {ms}ms")]
    Timeout { ms: u64 },

    /// The outbound payload is malformed (bad URL, empty recipient, …).
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),
}

impl ChannelError {
    /// True when the failure is infrastructure-level (network, timeout)
    /// rather than a rejection of this particular message.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ChannelError::ConnectionFailed(_) | ChannelError::Timeout { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ChannelError>;
