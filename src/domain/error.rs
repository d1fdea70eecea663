// Error taxonomy for the monitoring engine
use thiserror::Error;

/// Why a single observation could not be fetched. Always transient from the
/// polling loop's point of view.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("character '{0}' not found")]
    NotFound(String),

    #[error("level source unreachable: {0}")]
    Network(String),

    #[error("malformed level source response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            FetchError::Malformed(err.to_string())
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

#[derive(Debug, Error)]
pub enum MonitorError {
    /// Rejected synchronously, nothing is persisted.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("persistence failed: {0}")]
    Persistence(String),
}

impl MonitorError {
    pub fn invalid(message: impl Into<String>) -> Self {
        MonitorError::InvalidInput(message.into())
    }

    pub fn persistence(err: anyhow::Error) -> Self {
        MonitorError::Persistence(format!("{err:#}"))
    }
}

pub type MonitorResult<T> = Result<T, MonitorError>;
