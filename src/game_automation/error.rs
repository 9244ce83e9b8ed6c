use super::match_image::Token;
use crate::host::HostError;
use std::path::PathBuf;
use thiserror::Error;

/// A specialized `Result` type for run attempts.
pub type RunResult<T> = Result<T, RunError>;

/// Why a run attempt ended early.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Host(#[from] HostError),

    #[error("Required template '{token}' could not be loaded from {path:?}")]
    MissingTemplate { token: Token, path: PathBuf },

    /// Cooperative cancellation requested by the user, not a failure
    #[error("Stopped by user")]
    Stopped,
}

impl RunError {
    pub fn is_stop(&self) -> bool {
        matches!(self, RunError::Stopped)
    }

    /// Whether the driver may start a fresh attempt after this error
    pub fn is_retryable(&self) -> bool {
        match self {
            RunError::Host(e) => e.is_transient(),
            RunError::MissingTemplate { .. } => true,
            RunError::Stopped => false,
        }
    }
}
