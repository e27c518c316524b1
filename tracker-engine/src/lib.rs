//! Tracker features built on principals and permissions
//!
//! - **Watchers**: validation against project visibility and pruning of
//!   watchers that lost access
//! - **Time entries**: hours parsing, validation, derived date fields and
//!   aggregation reports
//! - **Principal search**: user and group lookup for membership pickers
//! - **User deletion**: reassignment of authored records to the deleted-user sentinel
//! - **Wiki notifications**: mails for added and updated wiki content
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tracker_engine::{LoggingMailer, PruneOptions, TrackerConfig, TrackerEngine};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = TrackerConfig::load(None)?;
//!     logger_redacted::init(&config.logging)?;
//!
//!     let engine = TrackerEngine::in_memory(config, Arc::new(LoggingMailer::new()));
//!     let pruned = engine.watchers.prune(PruneOptions::default()).await?;
//!     println!("pruned {} watchers", pruned);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod hours;
pub mod mailer;
pub mod models;
pub mod principal_search;
pub mod repository;
pub mod time_entry;
pub mod time_report;
pub mod user_deletion;
pub mod watchables;
pub mod watcher;
pub mod wiki_notifications;

pub use config::{TrackerConfig, TrackerSettings};
pub use engine::{Repositories, TrackerEngine};
pub use error::*;
pub use hours::parse_hours;
pub use mailer::{LoggingMailer, MailMessage, Mailer};
pub use models::*;
pub use principal_search::{Page, PrincipalSearch};
pub use repository::{
    InMemoryTrackerRepository, InMemoryWatcherRepository, TrackerRepository, WatcherRepository,
};
pub use time_entry::{TimeEntry, TimeEntryService};
pub use time_report::{Criterion, Period, ReportLookup, ReportRow, TimeReport};
pub use user_deletion::{DeletionSummary, UserDeletion};
pub use watchables::{WatchTarget, WatchableKey, WatchableType};
pub use watcher::{PruneOptions, Watcher, WatcherService};
pub use wiki_notifications::WikiContentObserver;
