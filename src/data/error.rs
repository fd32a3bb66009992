//! Backend error taxonomy.

use thiserror::Error;

use super::models::Collection;
use crate::retry::StatusCode;

/// Failure of a data-service call.
#[derive(Debug, Error)]
pub enum DataError {
    /// The backend could not be reached.
    #[error("network error: {0}")]
    Network(String),

    /// The backend did not answer in time.
    #[error("request timeout")]
    Timeout,

    /// The backend answered with an HTTP-like error status.
    #[error("backend returned status {status}: {message}")]
    Status { status: u16, message: String },

    /// The addressed record does not exist.
    #[error("no record '{id}' in {collection}")]
    NotFound { collection: Collection, id: String },

    /// A record could not be encoded or decoded.
    #[error("invalid record: {0}")]
    InvalidRecord(#[from] serde_json::Error),
}

impl DataError {
    /// Builds a status error.
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }
}

impl StatusCode for DataError {
    fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::NotFound { .. } => Some(404),
            Self::InvalidRecord(_) => Some(422),
            Self::Network(_) | Self::Timeout => None,
        }
    }
}
