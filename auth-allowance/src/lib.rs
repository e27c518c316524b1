//! Role based permission resolution for the tracker
//!
//! A user may perform an action when one of the principals acting for it
//! (the user itself or one of its groups) holds a role that allows the action,
//! and no evaluator denies it.
//!
//! # Core Concepts
//!
//! - **Action**: a permission name (`edit_project`) or a `controller/action` route
//! - **Role**: a named set of permissions; `non_member` and `anonymous` are synthetic
//! - **Membership**: the roles a principal holds in one project
//! - **AccessControl**: the catalog mapping permissions to project modules and routes
//! - **AllowanceEvaluator**: a pluggable grant/deny strategy
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use auth_allowance::{
//!     AccessControl, Action, AllowanceContext, AllowanceOptions, InMemoryMembershipRepository,
//!     PermissionResolver, Project,
//! };
//! use auth_identity::{InMemoryPrincipalRepository, User};
//!
//! #[tokio::main]
//! async fn main() {
//!     let resolver = PermissionResolver::new(
//!         Arc::new(InMemoryMembershipRepository::new()),
//!         Arc::new(InMemoryPrincipalRepository::new()),
//!         Arc::new(AccessControl::tracker_default()),
//!     );
//!     let project = Project::new("Tracker", "tracker").with_modules(["issue_tracking"]);
//!     let user = User::new("jsmith", "John", "Smith", "jsmith@example.net");
//!
//!     let allowed = resolver
//!         .allowed_to(
//!             &user,
//!             &Action::permission("view_issues"),
//!             AllowanceContext::Project(&project),
//!             &AllowanceOptions::default(),
//!         )
//!         .await;
//!     println!("allowed: {}", allowed);
//! }
//! ```

pub mod access_control;
pub mod error;
pub mod evaluator;
pub mod models;
pub mod repository;
pub mod resolver;

pub use access_control::{AccessControl, Permission, Requirement};
pub use error::*;
pub use evaluator::{AllowanceEvaluator, DefaultEvaluator};
pub use models::*;
pub use repository::{InMemoryMembershipRepository, MembershipRepository};
pub use resolver::PermissionResolver;
