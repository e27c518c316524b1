use auth_allowance::MembershipRepository;
use auth_identity::{Principal, PrincipalRepository};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::Result;

/// One page of a larger result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based
    pub page: usize,
    pub per_page: usize,
    pub total: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    /// Slices `items`; pages past the end come back empty
    pub fn paginate(items: Vec<T>, page: usize, per_page: usize) -> Self {
        let per_page = per_page.max(1);
        let page = page.max(1);
        let total = items.len();
        let total_pages = match total {
            0 => 0,
            total => (total - 1) / per_page + 1,
        };
        let items = items
            .into_iter()
            .skip((page - 1).saturating_mul(per_page))
            .take(per_page)
            .collect();
        Self {
            items,
            page,
            per_page,
            total,
            total_pages,
        }
    }
}

/// Searches users and groups for membership and watcher pickers
pub struct PrincipalSearch {
    principals: Arc<dyn PrincipalRepository>,
    memberships: Arc<dyn MembershipRepository>,
    page_limit: usize,
}

impl PrincipalSearch {
    pub fn new(
        principals: Arc<dyn PrincipalRepository>,
        memberships: Arc<dyn MembershipRepository>,
        page_limit: usize,
    ) -> Self {
        Self {
            principals,
            memberships,
            page_limit,
        }
    }

    /// Active or registered users and all groups matching `query`
    ///
    /// Users match on login, first name, last name or mail and groups on
    /// their name, case-insensitively. A blank query matches everything.
    /// Groups come first, then users by login, last name, first name and mail.
    pub async fn search(&self, query: &str) -> Result<Vec<Principal>> {
        let needle = query.trim().to_lowercase();
        let mut found: Vec<Principal> = self
            .principals
            .list_principals()
            .await?
            .into_iter()
            .filter(|p| p.is_active_or_registered() && matches(p, &needle))
            .collect();
        found.sort_by(|a, b| sort_key(a).cmp(&sort_key(b)));
        Ok(found)
    }

    /// Matches of [`PrincipalSearch::search`] without a membership in the project
    pub async fn search_without_project(&self, query: &str, project_id: Uuid) -> Result<Vec<Principal>> {
        let members: HashSet<Uuid> = self
            .memberships
            .principal_ids_for_project(project_id)
            .await?
            .into_iter()
            .collect();
        Ok(self
            .search(query)
            .await?
            .into_iter()
            .filter(|p| !members.contains(&p.id()))
            .collect())
    }

    pub async fn possible_members(&self, query: &str, limit: usize) -> Result<Vec<Principal>> {
        let mut found = self.search(query).await?;
        found.truncate(limit);
        Ok(found)
    }

    /// Candidates for a new membership, `page_limit` per page
    pub async fn paginate(
        &self,
        query: &str,
        project_id: Option<Uuid>,
        page: usize,
    ) -> Result<Page<Principal>> {
        let found = match project_id {
            Some(project_id) => self.search_without_project(query, project_id).await?,
            None => self.search(query).await?,
        };
        Ok(Page::paginate(found, page, self.page_limit))
    }
}

fn matches(principal: &Principal, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    let contains = |field: &str| field.to_lowercase().contains(needle);
    match principal {
        Principal::User(user) => {
            contains(&user.login)
                || contains(&user.firstname)
                || contains(&user.lastname)
                || contains(user.raw_mail())
        }
        Principal::Group(group) => contains(&group.name),
    }
}

fn sort_key(principal: &Principal) -> (auth_identity::PrincipalType, String, String, String, String) {
    match principal {
        Principal::User(user) => (
            principal.principal_type(),
            user.login.to_lowercase(),
            user.lastname.to_lowercase(),
            user.firstname.to_lowercase(),
            user.raw_mail().to_lowercase(),
        ),
        Principal::Group(group) => (
            principal.principal_type(),
            String::new(),
            group.name.to_lowercase(),
            String::new(),
            String::new(),
        ),
    }
}
