use super::types::WindowRect;
use std::path::PathBuf;
use thiserror::Error;

/// A specialized `Result` type for host operations.
pub type HostResult<T> = Result<T, HostError>;

/// The error type for window discovery, capture and input injection.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("No window title contains any of {filters:?}. Make sure the emulator is running.")]
    WindowNotFound { filters: Vec<String> },

    #[error("Window '{title}' still reports an empty area ({rect}) after restoring it")]
    WindowMinimized { title: String, rect: WindowRect },

    #[error("Failed to enumerate windows: {description}")]
    EnumerationFailed { description: String },

    #[error("Screen capture of {rect} failed: {description}")]
    CaptureFailed { rect: WindowRect, description: String },

    #[error("Failed to restore window '{title}': {description}")]
    RestoreFailed { title: String, description: String },

    #[error("Failed to load replay frames from {path:?}: {description}")]
    ReplayLoadFailed { path: PathBuf, description: String },

    #[error("Input injection unavailable: {description}")]
    InputUnavailable { description: String },
}

impl HostError {
    /// Errors that a fresh run attempt may recover from.
    ///
    /// Window query, restore and capture failures depend on the emulator's
    /// current state; a broken replay directory or input device does not.
    pub fn is_transient(&self) -> bool {
        !matches!(
            self,
            HostError::ReplayLoadFailed { .. } | HostError::InputUnavailable { .. }
        )
    }
}
