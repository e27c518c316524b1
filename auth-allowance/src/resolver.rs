use auth_identity::{PrincipalRepository, User};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::access_control::AccessControl;
use crate::error::Result;
use crate::evaluator::{AllowanceEvaluator, DefaultEvaluator};
use crate::models::{
    Action, AllowanceContext, AllowanceOptions, Candidate, CandidateKind, Project, Role, RoleBuiltin,
};
use crate::repository::MembershipRepository;

/// Answers "may this user perform this action here"
pub struct PermissionResolver {
    memberships: Arc<dyn MembershipRepository>,
    principals: Arc<dyn PrincipalRepository>,
    access_control: Arc<AccessControl>,
    evaluators: Vec<Arc<dyn AllowanceEvaluator>>,
}

impl PermissionResolver {
    /// Resolver consulting only the default evaluator
    pub fn new(
        memberships: Arc<dyn MembershipRepository>,
        principals: Arc<dyn PrincipalRepository>,
        access_control: Arc<AccessControl>,
    ) -> Self {
        let default: Arc<dyn AllowanceEvaluator> = Arc::new(DefaultEvaluator::new(access_control.clone()));
        Self::with_evaluators(memberships, principals, access_control, vec![default])
    }

    /// Resolver consulting `evaluators` in the given order
    pub fn with_evaluators(
        memberships: Arc<dyn MembershipRepository>,
        principals: Arc<dyn PrincipalRepository>,
        access_control: Arc<AccessControl>,
        evaluators: Vec<Arc<dyn AllowanceEvaluator>>,
    ) -> Self {
        Self {
            memberships,
            principals,
            access_control,
            evaluators,
        }
    }

    /// Append an evaluator after the existing ones
    pub fn with_evaluator(mut self, evaluator: Arc<dyn AllowanceEvaluator>) -> Self {
        self.evaluators.push(evaluator);
        self
    }

    pub fn evaluators(&self) -> &[Arc<dyn AllowanceEvaluator>] {
        &self.evaluators
    }

    pub fn access_control(&self) -> &Arc<AccessControl> {
        &self.access_control
    }

    pub fn memberships(&self) -> &Arc<dyn MembershipRepository> {
        &self.memberships
    }

    pub fn principals(&self) -> &Arc<dyn PrincipalRepository> {
        &self.principals
    }

    // =============================================================================
    // Authorization
    // =============================================================================

    /// Storage failures resolve to `false`
    pub async fn allowed_to(
        &self,
        user: &User,
        action: &Action,
        context: AllowanceContext<'_>,
        options: &AllowanceOptions,
    ) -> bool {
        let result = self.try_allowed_to(user, action, context, options).await;
        self.closed_on_error(user, action, result)
    }

    pub async fn try_allowed_to(
        &self,
        user: &User,
        action: &Action,
        context: AllowanceContext<'_>,
        options: &AllowanceOptions,
    ) -> Result<bool> {
        let action = action.normalized();
        match context {
            AllowanceContext::Project(project) => {
                self.try_allowed_to_in_project(user, &action, project, options).await
            }
            AllowanceContext::Projects(projects) => {
                if projects.is_empty() {
                    return Ok(false);
                }
                for project in projects {
                    if !self.try_allowed_to_in_project(user, &action, project, options).await? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            AllowanceContext::None if options.global => {
                self.try_allowed_to_globally(user, &action, options).await
            }
            AllowanceContext::None => Ok(false),
        }
    }

    pub async fn allowed_to_in_project(
        &self,
        user: &User,
        action: &Action,
        project: &Project,
        options: &AllowanceOptions,
    ) -> bool {
        let result = self.try_allowed_to_in_project(user, action, project, options).await;
        self.closed_on_error(user, action, result)
    }

    pub async fn try_allowed_to_in_project(
        &self,
        user: &User,
        action: &Action,
        project: &Project,
        options: &AllowanceOptions,
    ) -> Result<bool> {
        if !project.is_active() {
            return Ok(false);
        }
        let action = action.normalized();
        if !self.access_control.project_allows(project, &action) {
            return Ok(false);
        }
        if user.is_admin() {
            return Ok(true);
        }

        let candidates = self.project_candidates(user, project).await?;
        let allowed = self.evaluate(
            &candidates,
            |evaluator, candidate| evaluator.denied_for_project(candidate, &action, project, options),
            |evaluator, candidate| evaluator.granted_for_project(candidate, &action, project, options),
        );
        debug!(
            user_id = %user.id,
            project_id = %project.id,
            action = %action,
            candidates = candidates.len(),
            allowed,
            "Project allowance resolved"
        );
        Ok(allowed)
    }

    pub async fn allowed_to_globally(&self, user: &User, action: &Action, options: &AllowanceOptions) -> bool {
        let result = self.try_allowed_to_globally(user, action, options).await;
        self.closed_on_error(user, action, result)
    }

    pub async fn try_allowed_to_globally(
        &self,
        user: &User,
        action: &Action,
        options: &AllowanceOptions,
    ) -> Result<bool> {
        if user.is_admin() {
            return Ok(true);
        }
        let action = action.normalized();

        let candidates = self.global_candidates(user).await?;
        let allowed = self.evaluate(
            &candidates,
            |evaluator, candidate| evaluator.denied_for_global(candidate, &action, options),
            |evaluator, candidate| evaluator.granted_for_global(candidate, &action, options),
        );
        debug!(
            user_id = %user.id,
            action = %action,
            candidates = candidates.len(),
            allowed,
            "Global allowance resolved"
        );
        Ok(allowed)
    }

    fn evaluate<D, G>(&self, candidates: &[Candidate], denied: D, granted: G) -> bool
    where
        D: Fn(&dyn AllowanceEvaluator, &Candidate) -> bool,
        G: Fn(&dyn AllowanceEvaluator, &Candidate) -> bool,
    {
        // A denial from any candidate, group included, denies the user as a whole
        // rather than only removing that candidate from the grant check.
        for candidate in candidates {
            if let Some(evaluator) = self.evaluators.iter().find(|e| denied(e.as_ref(), candidate)) {
                debug!(
                    evaluator = evaluator.name(),
                    principal_id = %candidate.principal_id,
                    "Allowance denied"
                );
                return false;
            }
        }
        candidates
            .iter()
            .any(|candidate| self.evaluators.iter().any(|e| granted(e.as_ref(), candidate)))
    }

    fn closed_on_error(&self, user: &User, action: &Action, result: Result<bool>) -> bool {
        match result {
            Ok(allowed) => allowed,
            Err(error) => {
                warn!(user_id = %user.id, action = %action, error = %error, "Allowance check failed, denying");
                false
            }
        }
    }

    // =============================================================================
    // Candidates
    // =============================================================================

    /// The user plus every group of the user that is a member of `project`
    pub async fn project_candidates(&self, user: &User, project: &Project) -> Result<Vec<Candidate>> {
        let mut candidates = vec![Candidate::new(
            user.id,
            CandidateKind::User,
            self.roles_for_project(user, project).await?,
        )];
        if !project.is_active() {
            return Ok(candidates);
        }

        for group in self.principals.groups_for_user(user.id).await? {
            if let Some(membership) = self.memberships.membership_for_project(group.id, project.id).await? {
                let roles = self.memberships.roles_for_membership(&membership).await?;
                candidates.push(Candidate::new(group.id, CandidateKind::Group, roles));
            }
        }
        Ok(dedup_candidates(candidates))
    }

    /// The user with all its roles plus every group of the user
    pub async fn global_candidates(&self, user: &User) -> Result<Vec<Candidate>> {
        let mut user_roles = self.active_roles_of(user.id).await?;
        user_roles.push(self.fallback_role(user).await?);
        let mut candidates = vec![Candidate::new(user.id, CandidateKind::User, user_roles)];

        for group in self.principals.groups_for_user(user.id).await? {
            let roles = self.active_roles_of(group.id).await?;
            candidates.push(Candidate::new(group.id, CandidateKind::Group, roles));
        }
        Ok(dedup_candidates(candidates))
    }

    async fn active_roles_of(&self, principal_id: Uuid) -> Result<Vec<Role>> {
        let mut roles = Vec::new();
        for (membership, _) in self.memberships.active_memberships_for(principal_id).await? {
            roles.extend(self.memberships.roles_for_membership(&membership).await?);
        }
        Ok(dedup_roles(roles))
    }

    async fn fallback_role(&self, user: &User) -> Result<Role> {
        let builtin = if user.is_logged() {
            RoleBuiltin::NonMember
        } else {
            RoleBuiltin::Anonymous
        };
        self.memberships.builtin_role(builtin).await
    }

    // =============================================================================
    // Role queries
    // =============================================================================

    /// Roles of the user in `project`, including those held through groups
    ///
    /// Empty on inactive projects. Users without a membership get the
    /// `non_member` role when logged in and the `anonymous` role otherwise.
    pub async fn roles_for_project(&self, user: &User, project: &Project) -> Result<Vec<Role>> {
        if !project.is_active() {
            return Ok(Vec::new());
        }
        if !user.is_logged() {
            return Ok(vec![self.memberships.builtin_role(RoleBuiltin::Anonymous).await?]);
        }

        let mut roles = Vec::new();
        if let Some(membership) = self.memberships.membership_for_project(user.id, project.id).await? {
            roles.extend(self.memberships.roles_for_membership(&membership).await?);
        }
        for group in self.principals.groups_for_user(user.id).await? {
            if let Some(membership) = self.memberships.membership_for_project(group.id, project.id).await? {
                roles.extend(self.memberships.roles_for_membership(&membership).await?);
            }
        }

        let mut roles = dedup_roles(roles);
        if roles.is_empty() {
            roles.push(self.memberships.builtin_role(RoleBuiltin::NonMember).await?);
        }
        Ok(roles)
    }

    pub async fn member_of(&self, user: &User, project: &Project) -> Result<bool> {
        Ok(self
            .roles_for_project(user, project)
            .await?
            .iter()
            .any(Role::is_member))
    }

    /// Active projects of the user grouped by role, roles ordered by position
    pub async fn projects_by_role(&self, user: &User) -> Result<Vec<(Role, Vec<Project>)>> {
        let mut grouped: Vec<(Role, Vec<Project>)> = Vec::new();
        for (membership, project) in self.memberships.active_memberships_for(user.id).await? {
            for role in self.memberships.roles_for_membership(&membership).await? {
                match grouped.iter_mut().find(|(r, _)| r.id == role.id) {
                    Some((_, projects)) => {
                        if !projects.contains(&project) {
                            projects.push(project.clone());
                        }
                    }
                    None => grouped.push((role, vec![project.clone()])),
                }
            }
        }
        grouped.sort_by_key(|(role, _)| role.position);
        Ok(grouped)
    }

    /// Public projects plus the user's active memberships; every project for admins
    pub async fn number_of_known_projects(&self, user: &User) -> Result<usize> {
        let projects = self.memberships.list_projects().await?;
        if user.is_admin() {
            return Ok(projects.len());
        }
        let public = projects.iter().filter(|p| p.is_public).count();
        Ok(public + self.memberships.active_memberships_for(user.id).await?.len())
    }

    /// Projects whose every event is mailed to the user
    pub async fn notified_project_ids(&self, user: &User) -> Result<Vec<Uuid>> {
        Ok(self
            .memberships
            .memberships_for(user.id)
            .await?
            .into_iter()
            .filter(|m| m.mail_notification)
            .map(|m| m.project_id)
            .collect())
    }

    pub async fn set_notified_project_ids(&self, user: &User, project_ids: &[Uuid]) -> Result<()> {
        for mut membership in self.memberships.memberships_for(user.id).await? {
            let notified = project_ids.contains(&membership.project_id);
            if membership.mail_notification != notified {
                membership.mail_notification = notified;
                self.memberships.update_membership(membership).await?;
            }
        }
        Ok(())
    }
}

fn dedup_roles(roles: Vec<Role>) -> Vec<Role> {
    let mut seen = HashSet::new();
    let mut roles: Vec<Role> = roles.into_iter().filter(|r| seen.insert(r.id)).collect();
    roles.sort_by_key(|r| r.position);
    roles
}

fn dedup_candidates(candidates: Vec<Candidate>) -> Vec<Candidate> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|c| seen.insert(c.principal_id))
        .collect()
}
