// Central Error Type for the Application

use crate::domain::DomainError;
use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Domain error: {0}")]
    Domain(DomainError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller asked for something the job's current state does not allow
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        if matches!(err, DomainError::InvalidState { .. }) {
            AppError::InvalidState(err.to_string())
        } else {
            AppError::Domain(err)
        }
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

// Note: sqlx::Error conversion is handled in infra-sqlite crate
// by converting to AppError::Database(String)
