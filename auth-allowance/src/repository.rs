use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{AllowanceError, Result};
use crate::models::{Membership, Project, Role, RoleBuiltin};

/// Storage for projects, roles and memberships
#[async_trait]
pub trait MembershipRepository: Send + Sync {
    async fn insert_project(&self, project: Project) -> Result<Project>;
    async fn update_project(&self, project: Project) -> Result<Project>;
    async fn find_project(&self, id: Uuid) -> Result<Option<Project>>;
    async fn list_projects(&self) -> Result<Vec<Project>>;

    async fn insert_role(&self, role: Role) -> Result<Role>;
    async fn update_role(&self, role: Role) -> Result<Role>;
    async fn find_role(&self, id: Uuid) -> Result<Option<Role>>;
    /// Ordered by position
    async fn list_roles(&self) -> Result<Vec<Role>>;
    /// The synthetic role of this kind, created on first use
    async fn builtin_role(&self, builtin: RoleBuiltin) -> Result<Role>;

    /// Fails when the principal is already a member of the project
    async fn insert_membership(&self, membership: Membership) -> Result<Membership>;
    async fn update_membership(&self, membership: Membership) -> Result<Membership>;
    async fn delete_membership(&self, id: Uuid) -> Result<()>;
    async fn memberships_for(&self, principal_id: Uuid) -> Result<Vec<Membership>>;
    async fn memberships_of_project(&self, project_id: Uuid) -> Result<Vec<Membership>>;
    /// Returns the number of removed memberships
    async fn remove_memberships_for_principal(&self, principal_id: Uuid) -> Result<usize>;

    async fn membership_for_project(
        &self,
        principal_id: Uuid,
        project_id: Uuid,
    ) -> Result<Option<Membership>> {
        Ok(self
            .memberships_for(principal_id)
            .await?
            .into_iter()
            .find(|m| m.project_id == project_id))
    }

    /// Memberships in active projects, ordered by project name
    async fn active_memberships_for(&self, principal_id: Uuid) -> Result<Vec<(Membership, Project)>> {
        let mut active = Vec::new();
        for membership in self.memberships_for(principal_id).await? {
            if let Some(project) = self.find_project(membership.project_id).await? {
                if project.is_active() {
                    active.push((membership, project));
                }
            }
        }
        active.sort_by(|(_, a), (_, b)| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(active)
    }

    /// Roles of a membership ordered by position; vanished roles are skipped
    async fn roles_for_membership(&self, membership: &Membership) -> Result<Vec<Role>> {
        let mut roles = Vec::with_capacity(membership.role_ids.len());
        for role_id in &membership.role_ids {
            if let Some(role) = self.find_role(*role_id).await? {
                roles.push(role);
            }
        }
        roles.sort_by_key(|r| r.position);
        Ok(roles)
    }

    async fn principal_ids_for_project(&self, project_id: Uuid) -> Result<Vec<Uuid>> {
        Ok(self
            .memberships_of_project(project_id)
            .await?
            .into_iter()
            .map(|m| m.principal_id)
            .collect())
    }

    /// All projects below `project_id`, breadth first
    async fn descendants(&self, project_id: Uuid) -> Result<Vec<Project>> {
        let projects = self.list_projects().await?;
        let mut found = Vec::new();
        let mut seen = HashSet::from([project_id]);
        let mut queue = VecDeque::from([project_id]);
        while let Some(parent) = queue.pop_front() {
            for child in projects.iter().filter(|p| p.parent_id == Some(parent)) {
                if seen.insert(child.id) {
                    queue.push_back(child.id);
                    found.push(child.clone());
                }
            }
        }
        Ok(found)
    }

    /// The project and all its descendants
    async fn self_and_descendant_ids(&self, project_id: Uuid) -> Result<Vec<Uuid>> {
        let mut ids = vec![project_id];
        ids.extend(self.descendants(project_id).await?.into_iter().map(|p| p.id));
        Ok(ids)
    }
}

pub struct InMemoryMembershipRepository {
    projects: Arc<DashMap<Uuid, Project>>,
    roles: Arc<DashMap<Uuid, Role>>,
    memberships: Arc<DashMap<Uuid, Membership>>,
}

impl InMemoryMembershipRepository {
    pub fn new() -> Self {
        Self {
            projects: Arc::new(DashMap::new()),
            roles: Arc::new(DashMap::new()),
            memberships: Arc::new(DashMap::new()),
        }
    }
}

impl Default for InMemoryMembershipRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MembershipRepository for InMemoryMembershipRepository {
    async fn insert_project(&self, project: Project) -> Result<Project> {
        self.projects.insert(project.id, project.clone());
        Ok(project)
    }

    async fn update_project(&self, project: Project) -> Result<Project> {
        match self.projects.get_mut(&project.id) {
            Some(mut stored) => {
                *stored = project.clone();
                Ok(project)
            }
            None => Err(AllowanceError::ProjectNotFound(project.id)),
        }
    }

    async fn find_project(&self, id: Uuid) -> Result<Option<Project>> {
        Ok(self.projects.get(&id).map(|entry| entry.value().clone()))
    }

    async fn list_projects(&self) -> Result<Vec<Project>> {
        let mut projects: Vec<Project> = self.projects.iter().map(|e| e.value().clone()).collect();
        projects.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(projects)
    }

    async fn insert_role(&self, role: Role) -> Result<Role> {
        self.roles.insert(role.id, role.clone());
        Ok(role)
    }

    async fn update_role(&self, role: Role) -> Result<Role> {
        match self.roles.get_mut(&role.id) {
            Some(mut stored) => {
                *stored = role.clone();
                Ok(role)
            }
            None => Err(AllowanceError::RoleNotFound(role.id)),
        }
    }

    async fn find_role(&self, id: Uuid) -> Result<Option<Role>> {
        Ok(self.roles.get(&id).map(|entry| entry.value().clone()))
    }

    async fn list_roles(&self) -> Result<Vec<Role>> {
        let mut roles: Vec<Role> = self.roles.iter().map(|e| e.value().clone()).collect();
        roles.sort_by_key(|r| r.position);
        Ok(roles)
    }

    async fn builtin_role(&self, builtin: RoleBuiltin) -> Result<Role> {
        if builtin == RoleBuiltin::None {
            return Err(AllowanceError::InternalError(anyhow::anyhow!(
                "member roles are not synthetic"
            )));
        }
        if let Some(role) = self.roles.iter().find(|e| e.value().builtin == builtin) {
            return Ok(role.value().clone());
        }
        let role = Role::builtin(builtin);
        self.roles.insert(role.id, role.clone());
        Ok(role)
    }

    async fn insert_membership(&self, membership: Membership) -> Result<Membership> {
        let duplicate = self.memberships.iter().any(|e| {
            e.value().principal_id == membership.principal_id
                && e.value().project_id == membership.project_id
        });
        if duplicate {
            return Err(AllowanceError::DuplicateMembership {
                principal_id: membership.principal_id,
                project_id: membership.project_id,
            });
        }
        self.memberships.insert(membership.id, membership.clone());
        Ok(membership)
    }

    async fn update_membership(&self, membership: Membership) -> Result<Membership> {
        match self.memberships.get_mut(&membership.id) {
            Some(mut stored) => {
                *stored = membership.clone();
                Ok(membership)
            }
            None => Err(AllowanceError::MembershipNotFound(membership.id)),
        }
    }

    async fn delete_membership(&self, id: Uuid) -> Result<()> {
        self.memberships.remove(&id);
        Ok(())
    }

    async fn memberships_for(&self, principal_id: Uuid) -> Result<Vec<Membership>> {
        Ok(self
            .memberships
            .iter()
            .filter(|e| e.value().principal_id == principal_id)
            .map(|e| e.value().clone())
            .collect())
    }

    async fn memberships_of_project(&self, project_id: Uuid) -> Result<Vec<Membership>> {
        Ok(self
            .memberships
            .iter()
            .filter(|e| e.value().project_id == project_id)
            .map(|e| e.value().clone())
            .collect())
    }

    async fn remove_memberships_for_principal(&self, principal_id: Uuid) -> Result<usize> {
        let before = self.memberships.len();
        self.memberships.retain(|_, m| m.principal_id != principal_id);
        Ok(before - self.memberships.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_builtin_role_is_created_once() {
        let repo = InMemoryMembershipRepository::new();
        let first = repo.builtin_role(RoleBuiltin::NonMember).await.unwrap();
        let second = repo.builtin_role(RoleBuiltin::NonMember).await.unwrap();
        assert_eq!(first.id, second.id);
        assert!(repo.builtin_role(RoleBuiltin::None).await.is_err());
    }

    #[tokio::test]
    async fn test_duplicate_membership_is_rejected() {
        let repo = InMemoryMembershipRepository::new();
        let project = repo.insert_project(Project::new("Tracker", "tracker")).await.unwrap();
        let principal = Uuid::new_v4();

        repo.insert_membership(Membership::new(principal, project.id, vec![]))
            .await
            .unwrap();
        let result = repo
            .insert_membership(Membership::new(principal, project.id, vec![]))
            .await;
        assert!(matches!(result, Err(AllowanceError::DuplicateMembership { .. })));
    }

    #[tokio::test]
    async fn test_descendants_walk_the_tree() {
        let repo = InMemoryMembershipRepository::new();
        let root = repo.insert_project(Project::new("Root", "root")).await.unwrap();
        let child = repo
            .insert_project(Project::new("Child", "child").child_of(&root))
            .await
            .unwrap();
        let grandchild = repo
            .insert_project(Project::new("Grandchild", "grandchild").child_of(&child))
            .await
            .unwrap();
        repo.insert_project(Project::new("Other", "other")).await.unwrap();

        let ids = repo.self_and_descendant_ids(root.id).await.unwrap();
        assert_eq!(ids, vec![root.id, child.id, grandchild.id]);
    }

    #[tokio::test]
    async fn test_active_memberships_skip_archived_projects() {
        let repo = InMemoryMembershipRepository::new();
        let principal = Uuid::new_v4();
        let mut archived = Project::new("Archived", "archived");
        archived.archive();
        let archived = repo.insert_project(archived).await.unwrap();
        let beta = repo.insert_project(Project::new("beta", "beta")).await.unwrap();
        let alpha = repo.insert_project(Project::new("Alpha", "alpha")).await.unwrap();

        for project in [&archived, &beta, &alpha] {
            repo.insert_membership(Membership::new(principal, project.id, vec![]))
                .await
                .unwrap();
        }

        let active = repo.active_memberships_for(principal).await.unwrap();
        let names: Vec<&str> = active.iter().map(|(_, p)| p.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "beta"]);

        assert_eq!(repo.remove_memberships_for_principal(principal).await.unwrap(), 3);
    }
}
