use thiserror::Error;

use crate::blocks::RegistryError;
use crate::page::FieldError;
use crate::store::StoreError;

/// Failure of a page-builder operation, classified the way callers need to
/// react to it.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Malformed input. Nothing was written.
    #[error("validation failed")]
    Validation(Vec<FieldError>),

    /// The write collides with existing state (slug, key, foreign revision).
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => ServiceError::NotFound("record not found".to_string()),
            StoreError::SlugTaken(slug) => {
                ServiceError::Conflict(format!("slug `{slug}` is already in use"))
            }
            StoreError::DuplicateKey(key) => {
                ServiceError::Conflict(format!("key `{key}` already exists"))
            }
            other => ServiceError::Store(other),
        }
    }
}

impl From<RegistryError> for ServiceError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::Duplicate(_) => ServiceError::Conflict(err.to_string()),
            RegistryError::NotFound(_) => ServiceError::NotFound(err.to_string()),
            RegistryError::SystemBlock(_) => ServiceError::Forbidden(err.to_string()),
            RegistryError::InvalidKey(_) => {
                ServiceError::Validation(vec![FieldError::new("key", err.to_string())])
            }
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
