use thiserror::Error;

use crate::ports::RepositoryError;
use crate::validation::ValidationError;

/// Domain error taxonomy returned by every use case.
///
/// All variants are returned, never thrown across the public boundary;
/// callers branch on the outcome.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("not allowed: {0}")]
    NotAllowed(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("appointment already canceled: {0}")]
    AlreadyCanceled(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("negative value: {0}")]
    NegativeValue(String),

    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<ValidationError> for DomainError {
    fn from(err: ValidationError) -> Self {
        DomainError::Validation(err.to_string())
    }
}

impl DomainError {
    /// Whether the caller can recover by retrying with corrected input.
    pub fn is_user_error(&self) -> bool {
        !matches!(self, DomainError::Repository(_))
    }
}
