//! Structured logging with automatic redaction of user-identifying data
//!
//! The tracker logs principal lifecycle events (registration, login, deletion,
//! watcher pruning, notification dispatch). Those messages routinely carry mail
//! addresses and logins, which are redacted before they reach the log sink.
//!
//! # Key Features
//!
//! - **Subscriber setup**: `EnvFilter` plus a pretty or JSON `fmt` layer
//! - **Mail redaction**: `john.doe@example.com` → `EMAIL[<hash>]` or `j***@e***`
//! - **Hash-based correlation**: redacted values can be correlated through a short SHA-256 hash
//! - **Macros**: `redacted_info!` / `redacted_warn!` format, redact, then log
//!
//! # Example
//!
//! ```rust,no_run
//! use logger_redacted::{init, LoggerConfig, redacted_info};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     init(&LoggerConfig::default())?;
//!
//!     redacted_info!("User {} registered", "john.doe@example.com");
//!     // Output: "User EMAIL[...] registered"
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod macros;
pub mod redactor;
pub mod subscriber;

pub use config::*;
pub use redactor::*;
pub use subscriber::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoggerError {
    #[error("Invalid log filter: {0}")]
    InvalidFilter(String),

    #[error("Subscriber initialization failed: {0}")]
    InitFailed(String),
}

impl From<LoggerError> for error_common::TrackerError {
    fn from(error: LoggerError) -> Self {
        error_common::TrackerError::ConfigError(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LoggerError>;
