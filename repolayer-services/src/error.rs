//! Service-facing error taxonomy.

use thiserror::Error;

use repolayer_core::error::RepositoryError;

/// Failures surfaced by the service layer.
///
/// Repository failures are translated on the way up: validation problems
/// become [`InvalidRequest`](ServiceError::InvalidRequest), a missing
/// document becomes [`NotFound`](ServiceError::NotFound), and everything
/// else stays wrapped as a storage failure.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("no matching record in '{0}'")]
    NotFound(String),

    #[error("credentials are not valid")]
    InvalidCredentials,

    #[error("payment was rejected: {0}")]
    PaymentFailed(String),

    #[error("storage failure")]
    Storage(#[source] RepositoryError),
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Validation(message) => ServiceError::InvalidRequest(message),
            RepositoryError::NotFound { collection } => ServiceError::NotFound(collection),
            other => ServiceError::Storage(other),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
