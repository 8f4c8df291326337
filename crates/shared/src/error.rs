use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error body returned by the remote API, e.g. `{"message": "Invalid credentials"}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DashboardError {
    #[error("fetch failed: {0}")]
    FetchFailure(String),
    #[error("authentication failed: {0}")]
    AuthFailure(String),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("session storage error: {0}")]
    Storage(String),
}

impl DashboardError {
    /// Whether the controller should treat this as a failed fetch.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(
            self,
            DashboardError::FetchFailure(_) | DashboardError::MalformedResponse(_)
        )
    }

    pub fn message(&self) -> &str {
        match self {
            DashboardError::FetchFailure(message)
            | DashboardError::AuthFailure(message)
            | DashboardError::MalformedResponse(message)
            | DashboardError::Validation(message)
            | DashboardError::Storage(message) => message,
        }
    }
}

pub type DashboardResult<T> = Result<T, DashboardError>;
