//! Error types for the catalog service.

use crate::dto::RateRequest;

/// Domain-level errors (business rule violations).
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid rate {0}: rates must be finite and positive")]
    InvalidRate(f64),
}

/// Repository-level errors (data access failures).
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Entity not found")]
    NotFound,

    #[error("Storage error: {0}")]
    Storage(String),
}

/// Errors returned to callers of the rate cache.
///
/// `Clone` because a single in-flight fetch result is shared by every caller
/// waiting on the same destination.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RateError {
    /// The destination is not a supported currency. No remote call was made.
    #[error("Invalid currency: {0}")]
    InvalidCurrency(String),

    /// Network failure, timeout or server fault. Retryable.
    #[error("Currency service unavailable: {0}")]
    RemoteUnavailable(String),

    /// The rate service refused the request. Not retryable with the same arguments.
    /// `request` is the echoed request, kept for logging only.
    #[error("Unable to retrieve exchange rate from currency service: {message}")]
    RemoteRejected {
        message: String,
        request: Option<RateRequest>,
    },
}

impl RateError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, RateError::RemoteUnavailable(_))
    }
}

/// Errors on the push-update stream. Never surfaced to request handlers.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StreamError {
    #[error("Rate stream disconnected: {0}")]
    Disconnected(String),

    #[error("Malformed rate stream message: {0}")]
    Malformed(String),

    #[error("Rate stream reconnect budget exhausted after {0} attempts")]
    RetriesExhausted(u32),
}

/// Application-level errors (for HTTP responses).
///
/// Rate cache errors are carried unchanged; the HTTP adapter decides their
/// status code.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Rate(#[from] RateError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::ValidationError(msg) => AppError::BadRequest(msg),
            e @ DomainError::InvalidRate(_) => AppError::Internal(e.to_string()),
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Domain(e) => e.into(),
            RepoError::NotFound => AppError::NotFound("Product not found".into()),
            RepoError::Storage(e) => AppError::Internal(e),
        }
    }
}
