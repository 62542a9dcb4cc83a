use std::time::Duration;

use thiserror::Error;

/// Failures surfaced by the review data pipeline
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Direct request threw or answered with a non-success status
    #[error("network request failed: {0}")]
    Network(String),

    /// Fallback transport received no callback in time
    #[error("fallback request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// Fallback script could not be retrieved
    #[error("failed to load fallback script: {0}")]
    Load(String),

    /// Endpoint answered but reported an error in the envelope
    #[error("{0}")]
    Remote(String),
}

impl FetchError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Timeout(_))
    }
}

pub type Result<T> = std::result::Result<T, FetchError>;
