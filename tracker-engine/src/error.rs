use auth_allowance::AllowanceError;
use auth_identity::IdentityError;
use config_engine::ConfigError;
use error_common::{TrackerError, ValidationErrors};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrackerEngineError {
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    #[error("Allowance error: {0}")]
    Allowance(#[from] AllowanceError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Mail delivery failed: {0}")]
    DeliveryFailed(String),

    #[error("Repository error: {0}")]
    RepositoryError(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl From<ValidationErrors> for TrackerEngineError {
    fn from(errors: ValidationErrors) -> Self {
        TrackerEngineError::Validation(errors)
    }
}

impl From<TrackerEngineError> for TrackerError {
    fn from(error: TrackerEngineError) -> Self {
        match error {
            TrackerEngineError::Validation(errors) => TrackerError::Validation(errors),
            TrackerEngineError::NotFound(what) => TrackerError::NotFound(what),
            TrackerEngineError::Identity(inner) => inner.into(),
            TrackerEngineError::Allowance(inner) => inner.into(),
            TrackerEngineError::Config(inner) => inner.into(),
            TrackerEngineError::DeliveryFailed(message) => TrackerError::InternalError(message),
            TrackerEngineError::RepositoryError(message) => TrackerError::RepositoryError(message),
            TrackerEngineError::InternalError(inner) => TrackerError::Other(inner),
        }
    }
}

pub type Result<T> = std::result::Result<T, TrackerEngineError>;
