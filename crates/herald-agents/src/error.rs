use thiserror::Error;

/// Errors that can occur at the AI-service boundary.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Transport-level failure talking to the provider.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider returned a non-success status.
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Rate limited by the provider.
    #[error("Rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// The response did not match the expected schema.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The provider answered but produced no usable content.
    #[error("Empty response from provider")]
    EmptyResponse,
}

pub type Result<T> = std::result::Result<T, AgentError>;
