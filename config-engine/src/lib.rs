//! Layered configuration loading for the tracker core
//!
//! Configuration is assembled from, in increasing precedence:
//! - in-code defaults (`Default` of the target type)
//! - TOML or YAML files
//! - prefixed environment variables (`TRACKER_IDENTITY__PASSWORD_MIN_LENGTH=10`)
//!
//! The merged document is extracted into any `serde::Deserialize` type and can
//! be checked with a [`ConfigValidator`].
//!
//! # Example
//!
//! ```rust,no_run
//! use config_engine::{ConfigEngine, ConfigSource};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Default, Serialize, Deserialize)]
//! struct AppConfig {
//!     log_level: String,
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config: AppConfig = ConfigEngine::new()
//!         .add_source(ConfigSource::toml("tracker.toml"))
//!         .add_source(ConfigSource::env("TRACKER_"))
//!         .extract()?;
//!     Ok(())
//! }
//! ```

pub mod engine;
pub mod error;
pub mod validation;

pub use engine::*;
pub use error::*;
pub use validation::*;
