use thiserror::Error;

use crate::codes;
use crate::validation::ValidationErrors;

/// Top-level error shared across the tracker crates
#[derive(Error, Debug)]
pub enum TrackerError {
    /// A record failed validation
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// The requested record does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The acting principal may not perform the operation
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// Storage backend failures
    #[error("Repository error: {0}")]
    RepositoryError(String),

    /// Configuration loading or validation errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Internal system errors
    #[error("Internal error: {0}")]
    InternalError(String),

    /// Wrapped external errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TrackerError {
    /// Stable error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            TrackerError::Validation(_) => codes::validation::INVALID_RECORD,
            TrackerError::NotFound(_) => codes::repository::NOT_FOUND,
            TrackerError::AccessDenied(_) => codes::authorization::ACCESS_DENIED,
            TrackerError::RepositoryError(_) => codes::repository::STORAGE_FAILED,
            TrackerError::ConfigError(_) => codes::configuration::INVALID_CONFIG,
            TrackerError::InternalError(_) | TrackerError::Other(_) => codes::system::INTERNAL,
        }
    }

    /// The validation errors carried by this error, if any
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            TrackerError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

impl From<ValidationErrors> for TrackerError {
    fn from(errors: ValidationErrors) -> Self {
        TrackerError::Validation(errors)
    }
}

/// Result type alias for tracker operations
pub type Result<T> = std::result::Result<T, TrackerError>;

/// Log an error with its stable code
pub fn log_error(context: &str, error: &TrackerError) {
    tracing::error!(
        context = context,
        error_code = error.code(),
        error = %error,
        "Tracker error occurred"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ErrorKind;

    #[test]
    fn test_validation_error_code() {
        let mut errors = ValidationErrors::new();
        errors.add("hours", ErrorKind::Invalid);
        let error: TrackerError = errors.into();

        assert_eq!(error.code(), codes::validation::INVALID_RECORD);
        assert!(error.validation_errors().unwrap().has("hours", &ErrorKind::Invalid));
    }

    #[test]
    fn test_not_found_has_no_validation_errors() {
        let error = TrackerError::NotFound("user".to_string());
        assert!(error.validation_errors().is_none());
        assert_eq!(error.code(), codes::repository::NOT_FOUND);
    }
}
