//!
//! Errors returned by the [`chartwait_core`](super) crate
//!
use thiserror::Error;

/// Errors returned by the [`chartwait_core`](super) crate
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Options rejected before any timer was started
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The readiness predicate reported a failure or panicked
    #[error("readiness predicate failed: {0}")]
    Predicate(String),

    /// The readiness callback reported a failure or panicked
    #[error("readiness callback failed: {0}")]
    Callback(String),

    /// The timeout callback panicked
    #[error("timeout callback failed: {0}")]
    TimeoutCallback(String),

    /// The platform timer could not be created
    #[error("timer error: {0}")]
    Timer(String),

    /// Configuration text could not be parsed
    #[error("unable to parse configuration: {0}")]
    Config(String),
}

impl Error {
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration(message.into())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(err.to_string())
    }
}
