//! Error taxonomy for enhancement actions and configuration.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FixError {
    #[error("Please set your OpenAI API key first")]
    ApiKeyMissing,

    #[error("Please select some text to enhance")]
    NoTextSelected,

    #[error("Accessibility permission is required to copy and paste text")]
    PermissionDenied,

    #[error("{0}")]
    Remote(String),

    #[error("Config file {path:?} is not valid JSON: {message}")]
    ConfigCorrupt { path: PathBuf, message: String },

    #[error("Could not access config file {path:?}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Clipboard error: {0}")]
    Clipboard(String),

    #[error("Automation failed: {0}")]
    Automation(String),

    #[error("Unknown enhancement mode: {0}")]
    UnknownMode(String),

    #[error("An enhancement is already in progress")]
    Busy,
}

impl FixError {
    /// Errors that mean "nothing happened yet" rather than a failed attempt.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            FixError::ApiKeyMissing | FixError::NoTextSelected | FixError::PermissionDenied
        )
    }
}
