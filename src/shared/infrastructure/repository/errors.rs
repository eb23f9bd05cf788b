use crate::shared::infrastructure::document_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("{0}")]
    InvalidInterval(String),

    #[error("{0}")]
    RelatedEntityMissing(String),

    #[error("There is another time entry in that date range")]
    OverlapDetected,

    #[error("{0}")]
    UnprocessableState(String),

    #[error("no running time entry")]
    NoRunningEntry,

    #[error(transparent)]
    Store(StoreError),

    #[error("malformed document: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<StoreError> for RepositoryError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound { id, .. } => RepositoryError::NotFound(id),
            StoreError::Conflict { key, .. } => RepositoryError::Conflict(key),
            other => RepositoryError::Store(other),
        }
    }
}

impl RepositoryError {
    /// Status the HTTP boundary maps this error to.
    pub fn status_code(&self) -> u16 {
        match self {
            RepositoryError::NotFound(_) => 404,
            RepositoryError::Conflict(_) => 409,
            RepositoryError::InvalidInterval(_) => 400,
            RepositoryError::RelatedEntityMissing(_) => 400,
            RepositoryError::OverlapDetected => 422,
            RepositoryError::UnprocessableState(_) => 422,
            RepositoryError::NoRunningEntry => 204,
            RepositoryError::Store(StoreError::Transient(_)) => 503,
            RepositoryError::Store(_) | RepositoryError::Serialization(_) => 500,
        }
    }
}
