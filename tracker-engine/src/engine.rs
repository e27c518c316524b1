use auth_allowance::{AccessControl, InMemoryMembershipRepository, MembershipRepository, PermissionResolver};
use auth_identity::{IdentityService, InMemoryPrincipalRepository, PrincipalRepository};
use std::sync::Arc;
use tracing::info;

use crate::config::TrackerConfig;
use crate::mailer::Mailer;
use crate::principal_search::PrincipalSearch;
use crate::repository::{
    InMemoryTrackerRepository, InMemoryWatcherRepository, TrackerRepository, WatcherRepository,
};
use crate::time_entry::TimeEntryService;
use crate::user_deletion::UserDeletion;
use crate::watcher::WatcherService;
use crate::wiki_notifications::WikiContentObserver;

/// Storage backends the engine runs on
#[derive(Clone)]
pub struct Repositories {
    pub principals: Arc<dyn PrincipalRepository>,
    pub memberships: Arc<dyn MembershipRepository>,
    pub tracker: Arc<dyn TrackerRepository>,
    pub watchers: Arc<dyn WatcherRepository>,
}

impl Repositories {
    pub fn in_memory() -> Self {
        Self {
            principals: Arc::new(InMemoryPrincipalRepository::new()),
            memberships: Arc::new(InMemoryMembershipRepository::new()),
            tracker: Arc::new(InMemoryTrackerRepository::new()),
            watchers: Arc::new(InMemoryWatcherRepository::new()),
        }
    }
}

/// Every service wired against one set of repositories
pub struct TrackerEngine {
    pub config: TrackerConfig,
    pub repositories: Repositories,
    pub identity: Arc<IdentityService>,
    pub resolver: Arc<PermissionResolver>,
    pub watchers: Arc<WatcherService>,
    pub time_entries: TimeEntryService,
    pub principal_search: PrincipalSearch,
    pub user_deletion: UserDeletion,
    pub wiki_notifications: WikiContentObserver,
}

impl TrackerEngine {
    pub fn new(
        config: TrackerConfig,
        repositories: Repositories,
        access_control: AccessControl,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        let identity = Arc::new(IdentityService::new(
            repositories.principals.clone(),
            config.identity.clone(),
        ));
        let resolver = Arc::new(PermissionResolver::new(
            repositories.memberships.clone(),
            repositories.principals.clone(),
            Arc::new(access_control),
        ));
        let watchers = Arc::new(WatcherService::new(
            repositories.tracker.clone(),
            repositories.watchers.clone(),
            resolver.clone(),
        ));

        info!(
            evaluators = resolver.evaluators().len(),
            notified_events = ?config.tracker.notified_events,
            "Tracker engine ready"
        );

        Self {
            time_entries: TimeEntryService::new(repositories.tracker.clone(), resolver.clone()),
            principal_search: PrincipalSearch::new(
                repositories.principals.clone(),
                repositories.memberships.clone(),
                config.tracker.principal_search_page_limit,
            ),
            user_deletion: UserDeletion::new(
                identity.clone(),
                repositories.tracker.clone(),
                repositories.memberships.clone(),
                repositories.watchers.clone(),
                config.tracker.user_deletion_batch_size,
            ),
            wiki_notifications: WikiContentObserver::new(
                repositories.tracker.clone(),
                watchers.clone(),
                resolver.clone(),
                mailer,
                config.tracker.clone(),
            ),
            config,
            repositories,
            identity,
            resolver,
            watchers,
        }
    }

    /// In-memory storage with the default permission catalog
    pub fn in_memory(config: TrackerConfig, mailer: Arc<dyn Mailer>) -> Self {
        Self::new(
            config,
            Repositories::in_memory(),
            AccessControl::tracker_default(),
            mailer,
        )
    }
}
