//! Error types for Deskpilot Core

use thiserror::Error;

/// Result type alias using Deskpilot Error
pub type Result<T> = std::result::Result<T, Error>;

/// Deskpilot error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    /// A status with no registered state behaviour. Fatal: the control loop
    /// would otherwise spin without making progress.
    #[error("No state registered for status: {0}")]
    UnknownStatus(String),

    #[error("Decision error: {0}")]
    Decision(String),

    #[error("State capture error: {0}")]
    Capture(String),

    #[error("Action execution error: {0}")]
    Execution(String),

    #[error("Experience error: {0}")]
    Experience(String),

    #[error("Input error: {0}")]
    Input(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yml::Error),
}

impl Error {
    /// Whether this error should abort the run rather than be retried
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Config(_) | Error::UnknownStatus(_))
    }
}
