//! Common error handling utilities for the tracker core
//!
//! This crate provides the error types shared by every workspace crate:
//!
//! - **TrackerError**: top-level error enum each crate-specific error converts into
//! - **ValidationErrors**: field-tagged validation failures attached to a record
//! - **Error Codes**: stable string codes for API responses
//!
//! Validation failures are never raised as panics. A record that fails
//! validation yields a [`ValidationErrors`] value listing every offending
//! field, and the caller decides how to present it.
//!
//! # Example
//!
//! ```rust
//! use error_common::{ErrorKind, ValidationErrors};
//!
//! fn validate_hours(hours: Option<f64>) -> Result<(), ValidationErrors> {
//!     let mut errors = ValidationErrors::new();
//!     match hours {
//!         None => errors.add("hours", ErrorKind::Blank),
//!         Some(h) if !(0.0..1000.0).contains(&h) => errors.add("hours", ErrorKind::Invalid),
//!         Some(_) => {}
//!     }
//!     errors.into_result()
//! }
//!
//! assert!(validate_hours(Some(8.0)).is_ok());
//! let errors = validate_hours(Some(1000.0)).unwrap_err();
//! assert!(errors.has("hours", &ErrorKind::Invalid));
//! ```

pub mod codes;
pub mod types;
pub mod validation;

pub use types::*;
pub use validation::*;
