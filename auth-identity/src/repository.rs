use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{IdentityError, Result};
use crate::models::{Group, Principal, User, UserKind};

/// Storage for users and groups
#[async_trait]
pub trait PrincipalRepository: Send + Sync {
    async fn insert_user(&self, user: User) -> Result<User>;
    async fn update_user(&self, user: User) -> Result<User>;
    /// Removes the user and drops it from every group
    async fn delete_user(&self, id: Uuid) -> Result<()>;
    async fn find_user(&self, id: Uuid) -> Result<Option<User>>;
    /// Exact match first, then case-insensitive
    async fn find_by_login(&self, login: &str) -> Result<Option<User>>;
    /// Case-insensitive
    async fn find_by_mail(&self, mail: &str) -> Result<Option<User>>;
    async fn find_all_by_mails(&self, mails: &[String]) -> Result<Vec<User>>;
    async fn find_sentinel(&self, kind: UserKind) -> Result<Option<User>>;
    async fn list_users(&self) -> Result<Vec<User>>;

    async fn insert_group(&self, group: Group) -> Result<Group>;
    async fn update_group(&self, group: Group) -> Result<Group>;
    async fn delete_group(&self, id: Uuid) -> Result<()>;
    async fn find_group(&self, id: Uuid) -> Result<Option<Group>>;
    async fn find_group_by_name(&self, name: &str) -> Result<Option<Group>>;
    async fn groups_for_user(&self, user_id: Uuid) -> Result<Vec<Group>>;
    async fn list_groups(&self) -> Result<Vec<Group>>;

    async fn users_in_group(&self, group_id: Uuid) -> Result<Vec<User>> {
        let group = self
            .find_group(group_id)
            .await?
            .ok_or(IdentityError::GroupNotFound)?;
        let mut users = Vec::with_capacity(group.user_ids.len());
        for user_id in &group.user_ids {
            if let Some(user) = self.find_user(*user_id).await? {
                users.push(user);
            }
        }
        Ok(users)
    }

    async fn find_principal(&self, id: Uuid) -> Result<Option<Principal>> {
        if let Some(user) = self.find_user(id).await? {
            return Ok(Some(Principal::User(user)));
        }
        Ok(self.find_group(id).await?.map(Principal::Group))
    }

    async fn list_principals(&self) -> Result<Vec<Principal>> {
        let mut principals: Vec<Principal> = self
            .list_users()
            .await?
            .into_iter()
            .map(Principal::User)
            .collect();
        principals.extend(self.list_groups().await?.into_iter().map(Principal::Group));
        Ok(principals)
    }
}

pub struct InMemoryPrincipalRepository {
    users: Arc<DashMap<Uuid, User>>,
    groups: Arc<DashMap<Uuid, Group>>,
}

impl InMemoryPrincipalRepository {
    pub fn new() -> Self {
        Self {
            users: Arc::new(DashMap::new()),
            groups: Arc::new(DashMap::new()),
        }
    }

    fn find_user_where(&self, predicate: impl Fn(&User) -> bool) -> Option<User> {
        self.users
            .iter()
            .find(|entry| predicate(entry.value()))
            .map(|entry| entry.value().clone())
    }
}

impl Default for InMemoryPrincipalRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PrincipalRepository for InMemoryPrincipalRepository {
    async fn insert_user(&self, user: User) -> Result<User> {
        if self.users.contains_key(&user.id) {
            return Err(IdentityError::RepositoryError(format!(
                "user {} already stored",
                user.id
            )));
        }
        self.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_user(&self, user: User) -> Result<User> {
        match self.users.get_mut(&user.id) {
            Some(mut stored) => {
                *stored = user.clone();
                Ok(user)
            }
            None => Err(IdentityError::UserNotFound),
        }
    }

    async fn delete_user(&self, id: Uuid) -> Result<()> {
        self.users.remove(&id);
        for mut group in self.groups.iter_mut() {
            group.user_ids.remove(&id);
        }
        Ok(())
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.users.get(&id).map(|entry| entry.value().clone()))
    }

    async fn find_by_login(&self, login: &str) -> Result<Option<User>> {
        if let Some(user) = self.find_user_where(|u| !u.is_sentinel() && u.login == login) {
            return Ok(Some(user));
        }
        let lowered = login.to_lowercase();
        Ok(self.find_user_where(|u| !u.is_sentinel() && u.login.to_lowercase() == lowered))
    }

    async fn find_by_mail(&self, mail: &str) -> Result<Option<User>> {
        let lowered = mail.trim().to_lowercase();
        Ok(self.find_user_where(|u| !u.is_sentinel() && u.raw_mail().to_lowercase() == lowered))
    }

    async fn find_all_by_mails(&self, mails: &[String]) -> Result<Vec<User>> {
        let lowered: Vec<String> = mails.iter().map(|m| m.trim().to_lowercase()).collect();
        Ok(self
            .users
            .iter()
            .filter(|entry| {
                let user = entry.value();
                !user.is_sentinel() && lowered.contains(&user.raw_mail().to_lowercase())
            })
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn find_sentinel(&self, kind: UserKind) -> Result<Option<User>> {
        Ok(self.find_user_where(|u| u.kind == kind))
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        Ok(self.users.iter().map(|entry| entry.value().clone()).collect())
    }

    async fn insert_group(&self, group: Group) -> Result<Group> {
        if self.groups.contains_key(&group.id) {
            return Err(IdentityError::RepositoryError(format!(
                "group {} already stored",
                group.id
            )));
        }
        self.groups.insert(group.id, group.clone());
        Ok(group)
    }

    async fn update_group(&self, group: Group) -> Result<Group> {
        match self.groups.get_mut(&group.id) {
            Some(mut stored) => {
                *stored = group.clone();
                Ok(group)
            }
            None => Err(IdentityError::GroupNotFound),
        }
    }

    async fn delete_group(&self, id: Uuid) -> Result<()> {
        self.groups.remove(&id);
        Ok(())
    }

    async fn find_group(&self, id: Uuid) -> Result<Option<Group>> {
        Ok(self.groups.get(&id).map(|entry| entry.value().clone()))
    }

    async fn find_group_by_name(&self, name: &str) -> Result<Option<Group>> {
        let lowered = name.trim().to_lowercase();
        Ok(self
            .groups
            .iter()
            .find(|entry| entry.value().name.to_lowercase() == lowered)
            .map(|entry| entry.value().clone()))
    }

    async fn groups_for_user(&self, user_id: Uuid) -> Result<Vec<Group>> {
        let mut groups: Vec<Group> = self
            .groups
            .iter()
            .filter(|entry| entry.value().contains(user_id))
            .map(|entry| entry.value().clone())
            .collect();
        groups.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(groups)
    }

    async fn list_groups(&self) -> Result<Vec<Group>> {
        Ok(self.groups.iter().map(|entry| entry.value().clone()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_login_lookup_prefers_exact_match() {
        let repo = InMemoryPrincipalRepository::new();
        let lower = repo
            .insert_user(User::new("jsmith", "John", "Smith", "j1@example.net"))
            .await
            .unwrap();
        let upper = repo
            .insert_user(User::new("JSmith", "Jane", "Smith", "j2@example.net"))
            .await
            .unwrap();

        assert_eq!(repo.find_by_login("JSmith").await.unwrap().unwrap().id, upper.id);
        assert_eq!(repo.find_by_login("jsmith").await.unwrap().unwrap().id, lower.id);
        assert!(repo.find_by_login("JSMITH").await.unwrap().is_some());
        assert!(repo.find_by_login("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_user_leaves_groups() {
        let repo = InMemoryPrincipalRepository::new();
        let user = repo
            .insert_user(User::new("jsmith", "John", "Smith", "j@example.net"))
            .await
            .unwrap();
        let mut group = Group::new("Developers");
        group.user_ids.insert(user.id);
        let group = repo.insert_group(group).await.unwrap();

        assert_eq!(repo.groups_for_user(user.id).await.unwrap().len(), 1);
        repo.delete_user(user.id).await.unwrap();

        let group = repo.find_group(group.id).await.unwrap().unwrap();
        assert!(group.user_ids.is_empty());
        assert!(repo.find_principal(user.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_mail_lookup_is_case_insensitive() {
        let repo = InMemoryPrincipalRepository::new();
        repo.insert_user(User::new("jsmith", "John", "Smith", "John@Example.net"))
            .await
            .unwrap();

        assert!(repo.find_by_mail("john@example.NET").await.unwrap().is_some());
        let found = repo
            .find_all_by_mails(&["JOHN@example.net".to_string(), "x@example.net".to_string()])
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
    }
}
