use auth_allowance::MembershipRepository;
use auth_identity::{IdentityService, PrincipalRepository};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::Result;
use crate::models::Journal;
use crate::repository::{TrackerRepository, WatcherRepository};

/// Journal attributes holding user ids
const USER_ATTRIBUTES: [&str; 3] = ["author_id", "user_id", "assigned_to_id"];

/// Counts of what a deletion touched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeletionSummary {
    pub reassigned_records: usize,
    pub unassigned_issues: usize,
    pub rewritten_journals: usize,
    pub removed_memberships: usize,
    pub removed_watchers: usize,
}

/// Deletes users, handing their authored records to the deleted-user sentinel
pub struct UserDeletion {
    identity: Arc<IdentityService>,
    tracker: Arc<dyn TrackerRepository>,
    memberships: Arc<dyn MembershipRepository>,
    watchers: Arc<dyn WatcherRepository>,
    batch_size: usize,
}

impl UserDeletion {
    pub fn new(
        identity: Arc<IdentityService>,
        tracker: Arc<dyn TrackerRepository>,
        memberships: Arc<dyn MembershipRepository>,
        watchers: Arc<dyn WatcherRepository>,
        batch_size: usize,
    ) -> Self {
        Self {
            identity,
            tracker,
            memberships,
            watchers,
            batch_size: batch_size.max(1),
        }
    }

    /// `false` for the built-in users, which are never deleted
    pub async fn destroy(&self, user_id: Uuid) -> Result<bool> {
        Ok(self.destroy_with_summary(user_id).await?.is_some())
    }

    pub async fn destroy_with_summary(&self, user_id: Uuid) -> Result<Option<DeletionSummary>> {
        let user = self.identity.find_user(user_id).await?;
        if !user.traits().destroyable {
            debug!(user_id = %user.id, kind = ?user.kind, "Refusing to delete built-in user");
            return Ok(None);
        }

        let substitute = self.identity.deleted_user().await?;
        let summary = DeletionSummary {
            reassigned_records: self.tracker.reassign_user(user.id, substitute.id).await?,
            unassigned_issues: self.tracker.unassign_user(user.id).await?,
            rewritten_journals: self.rewrite_journals(user.id, substitute.id).await?,
            removed_memberships: self.memberships.remove_memberships_for_principal(user.id).await?,
            removed_watchers: self.watchers.remove_for_user(user.id).await?,
        };
        self.identity.repository().delete_user(user.id).await?;

        info!(
            user_id = %user.id,
            substitute_id = %substitute.id,
            reassigned = summary.reassigned_records,
            unassigned = summary.unassigned_issues,
            journals = summary.rewritten_journals,
            memberships = summary.removed_memberships,
            watchers = summary.removed_watchers,
            "User deleted"
        );
        Ok(Some(summary))
    }

    /// Walks journals by ascending id so rows added mid-sweep are covered
    async fn rewrite_journals(&self, from: Uuid, to: Uuid) -> Result<usize> {
        let mut rewritten = 0;
        let mut after = 0;
        loop {
            let batch = self.tracker.journals_after(after, self.batch_size).await?;
            let last = match batch.last() {
                Some(journal) => journal.id,
                None => break,
            };
            for mut journal in batch {
                if substitute_user(&mut journal, from, to) {
                    self.tracker.update_journal(journal).await?;
                    rewritten += 1;
                }
            }
            after = last;
        }
        Ok(rewritten)
    }
}

fn substitute_user(journal: &mut Journal, from: Uuid, to: Uuid) -> bool {
    let from = Value::String(from.to_string());
    let to = Value::String(to.to_string());
    let mut changed = false;
    for attribute in USER_ATTRIBUTES {
        if let Some(Value::Array(values)) = journal.changed_data.get_mut(attribute) {
            for value in values.iter_mut() {
                if *value == from {
                    *value = to.clone();
                    changed = true;
                }
            }
        }
    }
    changed
}
