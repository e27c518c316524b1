use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl From<ConfigError> for error_common::TrackerError {
    fn from(error: ConfigError) -> Self {
        error_common::TrackerError::ConfigError(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;
