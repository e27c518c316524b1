use auth_allowance::{Action, AllowanceOptions, MembershipRepository, PermissionResolver};
use auth_identity::{MailNotification, PrincipalRepository, User};
use chrono::{DateTime, Utc};
use error_common::{ErrorKind, ValidationErrors};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{Result, TrackerEngineError};
use crate::repository::{TrackerRepository, WatcherRepository};
use crate::watchables::{WatchTarget, WatchableKey};

/// A user following a watchable record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Watcher {
    pub id: Uuid,
    pub user_id: Uuid,
    pub watchable: WatchableKey,
    pub created_on: DateTime<Utc>,
}

impl Watcher {
    pub fn new(user_id: Uuid, watchable: WatchableKey) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            watchable,
            created_on: Utc::now(),
        }
    }
}

/// Narrows [`WatcherService::prune`]; both unset prunes everything
#[derive(Debug, Clone, Copy, Default)]
pub struct PruneOptions {
    pub user: Option<Uuid>,
    pub project: Option<Uuid>,
}

impl PruneOptions {
    pub fn user(user_id: Uuid) -> Self {
        Self {
            user: Some(user_id),
            project: None,
        }
    }

    pub fn project(project_id: Uuid) -> Self {
        Self {
            user: None,
            project: Some(project_id),
        }
    }
}

pub struct WatcherService {
    tracker: Arc<dyn TrackerRepository>,
    watchers: Arc<dyn WatcherRepository>,
    resolver: Arc<PermissionResolver>,
}

impl WatcherService {
    pub fn new(
        tracker: Arc<dyn TrackerRepository>,
        watchers: Arc<dyn WatcherRepository>,
        resolver: Arc<PermissionResolver>,
    ) -> Self {
        Self {
            tracker,
            watchers,
            resolver,
        }
    }

    /// Whether `user` can see `target`; `None` when the target cannot tell
    pub async fn visible(&self, target: &WatchTarget, user: &User) -> Result<Option<bool>> {
        let permission = match target.view_permission() {
            Some(permission) => permission,
            None => return Ok(None),
        };
        let project = match self.resolver.memberships().find_project(target.project_id()).await? {
            Some(project) => project,
            None => return Ok(Some(false)),
        };
        let allowed = self
            .resolver
            .try_allowed_to_in_project(
                user,
                &Action::permission(permission),
                &project,
                &AllowanceOptions::default(),
            )
            .await?;
        Ok(Some(allowed))
    }

    /// Active members of the target's project who can see it
    pub async fn possible_watcher_users(&self, target: &WatchTarget) -> Result<Vec<User>> {
        let principals = self.resolver.principals();
        let mut seen = HashSet::new();
        let mut users = Vec::new();

        for principal_id in self
            .resolver
            .memberships()
            .principal_ids_for_project(target.project_id())
            .await?
        {
            let members = match principals.find_user(principal_id).await? {
                Some(user) => vec![user],
                None => principals.users_in_group(principal_id).await?,
            };
            for user in members {
                if user.is_active() && seen.insert(user.id) {
                    users.push(user);
                }
            }
        }

        let mut possible = Vec::new();
        for user in users {
            if self.visible(target, &user).await?.unwrap_or(true) {
                possible.push(user);
            }
        }
        possible.sort_by(|a, b| a.login.cmp(&b.login));
        Ok(possible)
    }

    pub async fn validate(&self, watcher: &Watcher) -> Result<ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let target = self.tracker.find_watch_target(watcher.watchable).await?;
        if target.is_none() {
            errors.add("watchable", ErrorKind::Blank);
        }

        let user = self.resolver.principals().find_user(watcher.user_id).await?;
        let acceptable = match (&user, &target) {
            (Some(user), Some(target)) if user.is_active() => self
                .possible_watcher_users(target)
                .await?
                .iter()
                .any(|u| u.id == user.id),
            (Some(user), None) => user.is_active(),
            _ => false,
        };
        if !acceptable {
            errors.add("user_id", ErrorKind::Invalid);
        }

        if self
            .watchers
            .find(watcher.user_id, watcher.watchable)
            .await?
            .is_some()
        {
            errors.add("user_id", ErrorKind::Taken);
        }
        Ok(errors)
    }

    pub async fn add_watcher(&self, user_id: Uuid, watchable: WatchableKey) -> Result<Watcher> {
        let watcher = Watcher::new(user_id, watchable);
        let errors = self.validate(&watcher).await?;
        if !errors.is_empty() {
            return Err(TrackerEngineError::Validation(errors));
        }
        debug!(user_id = %user_id, watchable = %watchable, "Adding watcher");
        self.watchers.insert(watcher).await
    }

    /// `false` when the user was not watching
    pub async fn remove_watcher(&self, user_id: Uuid, watchable: WatchableKey) -> Result<bool> {
        match self.watchers.find(user_id, watchable).await? {
            Some(watcher) => self.watchers.delete(watcher.id).await,
            None => Ok(false),
        }
    }

    pub async fn watchers_of(&self, watchable: WatchableKey) -> Result<Vec<Watcher>> {
        self.watchers.for_watchable(watchable).await
    }

    pub async fn watcher_users(&self, watchable: WatchableKey) -> Result<Vec<User>> {
        let mut users = Vec::new();
        for watcher in self.watchers.for_watchable(watchable).await? {
            if let Some(user) = self.resolver.principals().find_user(watcher.user_id).await? {
                users.push(user);
            }
        }
        Ok(users)
    }

    pub async fn watched_by(&self, user_id: Uuid, watchable: WatchableKey) -> Result<bool> {
        Ok(self.watchers.find(user_id, watchable).await?.is_some())
    }

    /// Drops watchers that can no longer see what they watch
    ///
    /// Watchers of vanished records, of records that cannot report their
    /// visibility and of unknown users are left alone.
    pub async fn prune(&self, options: PruneOptions) -> Result<usize> {
        let user_ids = match options.user {
            Some(user_id) => vec![user_id],
            None => self.watchers.user_ids().await?,
        };

        let mut pruned = 0;
        for user_id in user_ids {
            let user = match self.resolver.principals().find_user(user_id).await? {
                Some(user) => user,
                None => continue,
            };
            for watcher in self.watchers.for_user(user_id).await? {
                let target = match self.tracker.find_watch_target(watcher.watchable).await? {
                    Some(target) => target,
                    None => continue,
                };
                if let Some(project_id) = options.project {
                    if target.project_id() != project_id {
                        continue;
                    }
                }
                if self.visible(&target, &user).await? == Some(false)
                    && self.watchers.delete(watcher.id).await?
                {
                    pruned += 1;
                }
            }
        }

        info!(
            user_id = ?options.user,
            project_id = ?options.project,
            pruned,
            "Pruned watchers"
        );
        Ok(pruned)
    }

    /// Mail addresses of watching users who still want and may see updates
    pub async fn watcher_recipients(&self, watchable: WatchableKey) -> Result<Vec<String>> {
        let target = self.tracker.find_watch_target(watchable).await?;
        let mut mails = Vec::new();
        for user in self.watcher_users(watchable).await? {
            if !user.is_active() || user.mail_notification == Some(MailNotification::None) {
                continue;
            }
            if let Some(target) = &target {
                if self.visible(target, &user).await? == Some(false) {
                    continue;
                }
            }
            if let Some(mail) = user.mail() {
                mails.push(mail.to_string());
            }
        }
        Ok(mails)
    }
}
