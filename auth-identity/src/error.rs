use error_common::{TrackerError, ValidationErrors};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("User not found")]
    UserNotFound,

    #[error("Group not found")]
    GroupNotFound,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account disabled")]
    AccountDisabled,

    #[error("Self-registration is disabled")]
    RegistrationDisabled,

    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Built-in users cannot be modified this way")]
    SentinelProtected,

    #[error("Hashing error")]
    HashingError,

    #[error("Repository error: {0}")]
    RepositoryError(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl From<ValidationErrors> for IdentityError {
    fn from(errors: ValidationErrors) -> Self {
        IdentityError::Validation(errors)
    }
}

impl From<IdentityError> for TrackerError {
    fn from(error: IdentityError) -> Self {
        match error {
            IdentityError::Validation(errors) => TrackerError::Validation(errors),
            IdentityError::UserNotFound | IdentityError::GroupNotFound => {
                TrackerError::NotFound(error.to_string())
            }
            IdentityError::InvalidCredentials
            | IdentityError::AccountDisabled
            | IdentityError::RegistrationDisabled
            | IdentityError::SentinelProtected => TrackerError::AccessDenied(error.to_string()),
            IdentityError::RepositoryError(message) => TrackerError::RepositoryError(message),
            IdentityError::HashingError => TrackerError::InternalError(error.to_string()),
            IdentityError::InternalError(inner) => TrackerError::Other(inner),
        }
    }
}

pub type Result<T> = std::result::Result<T, IdentityError>;
