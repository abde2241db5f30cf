//! Errors surfaced by the remote store.

use thiserror::Error;

/// Failure of a single remote call.
///
/// Callers normally only show the message (`Display`); the variants exist so
/// tests and logs can tell a backend rejection from a transport failure.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// The backend answered with an error payload.
    #[error("{message}")]
    Rejected {
        message: String,
        code: Option<String>,
    },
    /// The request could not complete.
    #[error("{0}")]
    Network(String),
    /// The response could not be understood.
    #[error("{0}")]
    Unexpected(String),
    /// A single-row operation matched no row.
    #[error("No matching row found")]
    NotFound,
    /// The input was refused before any remote call was made.
    #[error("{0}")]
    InvalidInput(String),
}

impl StoreError {
    pub fn rejected(message: impl Into<String>) -> Self {
        StoreError::Rejected {
            message: message.into(),
            code: None,
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Unexpected(format!("Invalid row: {}", e))
    }
}
