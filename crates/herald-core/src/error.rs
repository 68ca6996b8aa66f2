use thiserror::Error;

/// Workspace-level failures: configuration and service assembly.
///
/// Subsystem failures have their own per-crate error types; operations the
/// data model defines as total (absent ids, stale references) return
/// `bool`/`Option` instead of erroring.
#[derive(Debug, Error)]
pub enum HeraldError {
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, HeraldError>;
