//! Principals of the tracker: users, groups and the two built-in sentinels
//!
//! This crate owns everything that identifies an actor:
//! - Users with status, notification preference and display name format
//! - Groups as named collections of users
//! - The anonymous and deleted-user sentinels (`UserKind`)
//! - Field validation, uniqueness checks and argon2 password hashing
//! - Notification preference rules consumed by the mailer
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use auth_identity::{CreateUserRequest, IdentityConfig, IdentityService, InMemoryPrincipalRepository};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = IdentityService::new(
//!         Arc::new(InMemoryPrincipalRepository::new()),
//!         IdentityConfig::default(),
//!     );
//!
//!     let user = service
//!         .register_user(CreateUserRequest {
//!             login: "jsmith".into(),
//!             firstname: "John".into(),
//!             lastname: "Smith".into(),
//!             mail: "jsmith@example.net".into(),
//!             password: Some("secret".into()),
//!             ..Default::default()
//!         })
//!         .await?;
//!     assert!(service.try_to_login("jsmith", "secret").await?.is_some());
//!     println!("{}", user.name(service.config().user_format));
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod kind;
pub mod models;
pub mod name_format;
pub mod notification;
pub mod repository;
pub mod service;
pub mod validation;

pub use config::*;
pub use error::*;
pub use kind::KindTraits;
pub use models::*;
pub use name_format::{NameField, UserFormat};
pub use notification::{notify_about, valid_notification_options, NotificationEvent};
pub use repository::{InMemoryPrincipalRepository, PrincipalRepository};
pub use service::*;

impl User {
    /// Should this user be mailed about `event`
    pub fn notify_about(&self, event: &NotificationEvent) -> bool {
        notification::notify_about(self, event)
    }
}
