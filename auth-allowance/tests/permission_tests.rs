//! Permission resolution scenarios
//!
//! Covers the resolver contract: archived projects, disabled modules, admins,
//! non-member and anonymous fallbacks, group memberships, project collections,
//! global checks and evaluator aggregation.

use async_trait::async_trait;
use auth_allowance::*;
use auth_identity::{
    Group, InMemoryPrincipalRepository, PrincipalRepository, User, UserKind,
};
use std::sync::Arc;
use uuid::Uuid;

struct Fixture {
    memberships: Arc<InMemoryMembershipRepository>,
    principals: Arc<InMemoryPrincipalRepository>,
    catalog: Arc<AccessControl>,
}

impl Fixture {
    fn new() -> Self {
        Self {
            memberships: Arc::new(InMemoryMembershipRepository::new()),
            principals: Arc::new(InMemoryPrincipalRepository::new()),
            catalog: Arc::new(AccessControl::tracker_default()),
        }
    }

    fn resolver(&self) -> PermissionResolver {
        PermissionResolver::new(
            self.memberships.clone(),
            self.principals.clone(),
            self.catalog.clone(),
        )
    }

    fn resolver_with(&self, evaluators: Vec<Arc<dyn AllowanceEvaluator>>) -> PermissionResolver {
        PermissionResolver::with_evaluators(
            self.memberships.clone(),
            self.principals.clone(),
            self.catalog.clone(),
            evaluators,
        )
    }

    async fn project(&self, project: Project) -> Project {
        self.memberships.insert_project(project).await.unwrap()
    }

    async fn role(&self, name: &str, position: u32, permissions: &[&str]) -> Role {
        let mut role = Role::new(name, position);
        self.catalog.set_role_permissions(&mut role, permissions);
        self.memberships.insert_role(role).await.unwrap()
    }

    async fn builtin(&self, builtin: RoleBuiltin, permissions: &[&str]) -> Role {
        let mut role = self.memberships.builtin_role(builtin).await.unwrap();
        self.catalog.set_role_permissions(&mut role, permissions);
        self.memberships.update_role(role).await.unwrap()
    }

    async fn user(&self, login: &str) -> User {
        let user = User::new(login, "Test", "User", &format!("{}@example.net", login));
        self.principals.insert_user(user).await.unwrap()
    }

    async fn member(&self, principal_id: Uuid, project: &Project, roles: &[&Role]) -> Membership {
        let membership = Membership::new(principal_id, project.id, roles.iter().map(|r| r.id).collect());
        self.memberships.insert_membership(membership).await.unwrap()
    }
}

fn tracker_project(name: &str) -> Project {
    Project::new(name, &name.to_lowercase()).with_modules(["issue_tracking", "time_tracking", "wiki"])
}

fn permission(name: &str) -> Action {
    Action::permission(name)
}

async fn allowed_in(resolver: &PermissionResolver, user: &User, action: &Action, project: &Project) -> bool {
    resolver
        .allowed_to(user, action, AllowanceContext::Project(project), &AllowanceOptions::default())
        .await
}

struct DenyEverything;

impl AllowanceEvaluator for DenyEverything {
    fn name(&self) -> &'static str {
        "deny_everything"
    }

    fn denied_for_project(&self, _: &Candidate, _: &Action, _: &Project, _: &AllowanceOptions) -> bool {
        true
    }

    fn denied_for_global(&self, _: &Candidate, _: &Action, _: &AllowanceOptions) -> bool {
        true
    }
}

/// Denies only group candidates
struct DenyGroups;

impl AllowanceEvaluator for DenyGroups {
    fn name(&self) -> &'static str {
        "deny_groups"
    }

    fn denied_for_project(&self, candidate: &Candidate, _: &Action, _: &Project, _: &AllowanceOptions) -> bool {
        candidate.kind == CandidateKind::Group
    }
}

/// Grants `view_gantt` to everybody
struct GanttForAll;

impl AllowanceEvaluator for GanttForAll {
    fn name(&self) -> &'static str {
        "gantt_for_all"
    }

    fn granted_for_project(&self, _: &Candidate, action: &Action, _: &Project, _: &AllowanceOptions) -> bool {
        *action == Action::permission("view_gantt")
    }
}

#[tokio::test]
async fn test_member_role_grants_in_project() {
    let fx = Fixture::new();
    let project = fx.project(tracker_project("Tracker").private()).await;
    let developer = fx.role("Developer", 1, &["view_issues", "edit_issues"]).await;
    let user = fx.user("dev").await;
    fx.member(user.id, &project, &[&developer]).await;
    let resolver = fx.resolver();

    assert!(allowed_in(&resolver, &user, &permission("view_issues"), &project).await);
    assert!(allowed_in(&resolver, &user, &Action::controller_action("/issues", "bulk_edit"), &project).await);
    assert!(!allowed_in(&resolver, &user, &permission("delete_issues"), &project).await);
}

#[tokio::test]
async fn test_inactive_projects_never_grant() {
    let fx = Fixture::new();
    let mut project = tracker_project("Archived");
    project.archive();
    let project = fx.project(project).await;
    let manager = fx.role("Manager", 1, &["view_issues", "edit_project"]).await;
    let user = fx.user("manager").await;
    fx.member(user.id, &project, &[&manager]).await;

    let mut admin = fx.user("admin").await;
    admin.admin = true;

    let resolver = fx.resolver();
    assert!(!allowed_in(&resolver, &user, &permission("view_issues"), &project).await);
    assert!(!allowed_in(&resolver, &admin, &permission("view_issues"), &project).await);
    assert!(resolver.roles_for_project(&user, &project).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_admins_need_enabled_module() {
    let fx = Fixture::new();
    let project = fx.project(tracker_project("Tracker").private()).await;
    let mut admin = fx.user("admin").await;
    admin.admin = true;
    let resolver = fx.resolver();

    assert!(allowed_in(&resolver, &admin, &permission("edit_issues"), &project).await);
    assert!(allowed_in(&resolver, &admin, &permission("edit_project"), &project).await);
    assert!(!allowed_in(&resolver, &admin, &permission("manage_news"), &project).await);
    assert!(!allowed_in(&resolver, &admin, &permission("unknown_permission"), &project).await);
}

#[tokio::test]
async fn test_non_member_follows_non_member_role_on_public_projects() {
    let fx = Fixture::new();
    let public = fx.project(tracker_project("Public")).await;
    let private = fx.project(tracker_project("Private").private()).await;
    fx.builtin(RoleBuiltin::NonMember, &["view_issues", "log_time"]).await;
    let user = fx.user("visitor").await;
    let resolver = fx.resolver();

    assert!(allowed_in(&resolver, &user, &permission("view_issues"), &public).await);
    assert!(allowed_in(&resolver, &user, &permission("log_time"), &public).await);
    assert!(!allowed_in(&resolver, &user, &permission("edit_issues"), &public).await);
    assert!(!allowed_in(&resolver, &user, &permission("view_issues"), &private).await);

    let roles = resolver.roles_for_project(&user, &public).await.unwrap();
    assert_eq!(roles.len(), 1);
    assert_eq!(roles[0].builtin, RoleBuiltin::NonMember);
    assert!(!resolver.member_of(&user, &public).await.unwrap());
}

#[tokio::test]
async fn test_anonymous_follows_anonymous_role() {
    let fx = Fixture::new();
    let project = fx.project(tracker_project("Public")).await;
    fx.builtin(RoleBuiltin::NonMember, &["view_issues", "add_issues"]).await;
    fx.builtin(RoleBuiltin::Anonymous, &["view_issues", "log_time"]).await;
    let anonymous = User::sentinel(UserKind::Anonymous);
    let resolver = fx.resolver();

    assert!(allowed_in(&resolver, &anonymous, &permission("view_issues"), &project).await);
    // log_time requires login and was dropped from the anonymous role
    assert!(!allowed_in(&resolver, &anonymous, &permission("log_time"), &project).await);
    assert!(!allowed_in(&resolver, &anonymous, &permission("add_issues"), &project).await);
    // public permission
    assert!(allowed_in(&resolver, &anonymous, &permission("view_project"), &project).await);
}

#[tokio::test]
async fn test_group_membership_grants_to_its_users() {
    let fx = Fixture::new();
    let project = fx.project(tracker_project("Private").private()).await;
    let reporter = fx.role("Reporter", 2, &["add_issues"]).await;
    let user = fx.user("grouped").await;
    let mut group = Group::new("Reporters");
    group.user_ids.insert(user.id);
    let group = fx.principals.insert_group(group).await.unwrap();
    fx.member(group.id, &project, &[&reporter]).await;
    let resolver = fx.resolver();

    assert!(allowed_in(&resolver, &user, &permission("add_issues"), &project).await);
    assert!(resolver.member_of(&user, &project).await.unwrap());

    let candidates = resolver.project_candidates(&user, &project).await.unwrap();
    assert_eq!(candidates.len(), 2);
    assert_eq!(candidates[1].kind, CandidateKind::Group);
}

#[tokio::test]
async fn test_denial_cannot_be_overridden() {
    let fx = Fixture::new();
    let project = fx.project(tracker_project("Tracker")).await;
    let developer = fx.role("Developer", 1, &["view_issues"]).await;
    let mut admin_less = fx.user("dev").await;
    admin_less.admin = false;
    fx.member(admin_less.id, &project, &[&developer]).await;

    let default: Arc<dyn AllowanceEvaluator> = Arc::new(DefaultEvaluator::new(fx.catalog.clone()));
    let resolver = fx.resolver_with(vec![default.clone(), Arc::new(DenyEverything)]);

    assert!(!allowed_in(&resolver, &admin_less, &permission("view_issues"), &project).await);
    assert!(
        !resolver
            .allowed_to(&admin_less, &permission("view_issues"), AllowanceContext::None, &AllowanceOptions::global())
            .await
    );
}

#[tokio::test]
async fn test_denying_one_candidate_denies_the_user() {
    let fx = Fixture::new();
    let project = fx.project(tracker_project("Private").private()).await;
    let developer = fx.role("Developer", 1, &["view_issues"]).await;
    let user = fx.user("dev").await;
    fx.member(user.id, &project, &[&developer]).await;
    let mut group = Group::new("Team");
    group.user_ids.insert(user.id);
    let group = fx.principals.insert_group(group).await.unwrap();
    fx.member(group.id, &project, &[&developer]).await;

    let default: Arc<dyn AllowanceEvaluator> = Arc::new(DefaultEvaluator::new(fx.catalog.clone()));
    let resolver = fx.resolver_with(vec![default]).with_evaluator(Arc::new(DenyGroups));

    assert!(!allowed_in(&resolver, &user, &permission("view_issues"), &project).await);
}

#[tokio::test]
async fn test_extra_evaluator_can_grant() {
    let fx = Fixture::new();
    let project = fx.project(tracker_project("Tracker").with_modules(["gantt"]).private()).await;
    let user = fx.user("viewer").await;

    let default_only = fx.resolver();
    assert!(!allowed_in(&default_only, &user, &permission("view_gantt"), &project).await);

    let resolver = fx.resolver().with_evaluator(Arc::new(GanttForAll));
    assert_eq!(resolver.evaluators().len(), 2);
    assert!(allowed_in(&resolver, &user, &permission("view_gantt"), &project).await);
}

#[tokio::test]
async fn test_empty_evaluator_list_never_grants() {
    let fx = Fixture::new();
    let project = fx.project(tracker_project("Tracker")).await;
    fx.builtin(RoleBuiltin::NonMember, &["view_issues"]).await;
    let user = fx.user("visitor").await;
    let resolver = fx.resolver_with(Vec::new());

    assert!(!allowed_in(&resolver, &user, &permission("view_issues"), &project).await);
}

#[tokio::test]
async fn test_project_collections() {
    let fx = Fixture::new();
    let first = fx.project(tracker_project("First").private()).await;
    let second = fx.project(tracker_project("Second").private()).await;
    let developer = fx.role("Developer", 1, &["view_issues"]).await;
    let user = fx.user("dev").await;
    fx.member(user.id, &first, &[&developer]).await;
    let resolver = fx.resolver();
    let options = AllowanceOptions::default();
    let action = permission("view_issues");

    let only_first = vec![first.clone()];
    let both = vec![first.clone(), second.clone()];
    assert!(resolver.allowed_to(&user, &action, AllowanceContext::Projects(&only_first), &options).await);
    assert!(!resolver.allowed_to(&user, &action, AllowanceContext::Projects(&both), &options).await);
    assert!(!resolver.allowed_to(&user, &action, AllowanceContext::Projects(&[]), &options).await);
}

#[tokio::test]
async fn test_global_checks() {
    let fx = Fixture::new();
    let project = fx.project(tracker_project("Private").private()).await;
    let mut archived = tracker_project("Archived").private();
    archived.archive();
    let archived = fx.project(archived).await;
    let manager = fx.role("Manager", 1, &["add_project", "edit_project"]).await;
    let reporter = fx.role("Reporter", 2, &["delete_issues"]).await;
    fx.builtin(RoleBuiltin::NonMember, &["save_queries"]).await;
    let user = fx.user("manager").await;
    fx.member(user.id, &project, &[&manager]).await;
    fx.member(user.id, &archived, &[&reporter]).await;
    let outsider = fx.user("outsider").await;
    let resolver = fx.resolver();
    let global = AllowanceOptions::global();

    assert!(resolver.allowed_to(&user, &permission("edit_project"), AllowanceContext::None, &global).await);
    // roles from archived projects do not count
    assert!(!resolver.allowed_to(&user, &permission("delete_issues"), AllowanceContext::None, &global).await);
    // non-member fallback
    assert!(resolver.allowed_to(&outsider, &permission("save_queries"), AllowanceContext::None, &global).await);
    assert!(!resolver.allowed_to(&outsider, &permission("edit_project"), AllowanceContext::None, &global).await);
    // without the global flag there is no context
    assert!(
        !resolver
            .allowed_to(&user, &permission("edit_project"), AllowanceContext::None, &AllowanceOptions::default())
            .await
    );

    let mut admin = fx.user("admin").await;
    admin.admin = true;
    assert!(resolver.allowed_to(&admin, &permission("anything"), AllowanceContext::None, &global).await);
}

#[tokio::test]
async fn test_membership_queries() {
    let fx = Fixture::new();
    let alpha = fx.project(tracker_project("Alpha").private()).await;
    let beta = fx.project(tracker_project("Beta")).await;
    fx.project(tracker_project("Gamma")).await;
    let manager = fx.role("Manager", 1, &["edit_project"]).await;
    let developer = fx.role("Developer", 2, &["view_issues"]).await;
    let user = fx.user("dev").await;
    fx.member(user.id, &alpha, &[&developer, &manager]).await;
    fx.member(user.id, &beta, &[&developer]).await;
    let resolver = fx.resolver();

    let by_role = resolver.projects_by_role(&user).await.unwrap();
    assert_eq!(by_role.len(), 2);
    assert_eq!(by_role[0].0.name, "Manager");
    assert_eq!(by_role[0].1.len(), 1);
    assert_eq!(by_role[1].1.len(), 2);

    assert_eq!(resolver.number_of_known_projects(&user).await.unwrap(), 4);

    resolver.set_notified_project_ids(&user, &[beta.id]).await.unwrap();
    assert_eq!(resolver.notified_project_ids(&user).await.unwrap(), vec![beta.id]);
    resolver.set_notified_project_ids(&user, &[]).await.unwrap();
    assert!(resolver.notified_project_ids(&user).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_membership_queries_skip_archived_projects() {
    let fx = Fixture::new();
    let mut archived = tracker_project("Archived").private();
    archived.archive();
    let archived = fx.project(archived).await;
    let developer = fx.role("Developer", 1, &["view_issues"]).await;
    let user = fx.user("dev").await;
    fx.member(user.id, &archived, &[&developer]).await;
    let resolver = fx.resolver();

    assert!(resolver.projects_by_role(&user).await.unwrap().is_empty());
    assert_eq!(resolver.number_of_known_projects(&user).await.unwrap(), 0);

    let active = fx.project(tracker_project("Active").private()).await;
    fx.member(user.id, &active, &[&developer]).await;
    let by_role = resolver.projects_by_role(&user).await.unwrap();
    assert_eq!(by_role.len(), 1);
    assert_eq!(by_role[0].1, vec![active]);
    assert_eq!(resolver.number_of_known_projects(&user).await.unwrap(), 1);
}

struct BrokenMemberships;

#[async_trait]
impl MembershipRepository for BrokenMemberships {
    async fn insert_project(&self, _: Project) -> auth_allowance::Result<Project> {
        Err(AllowanceError::RepositoryError("offline".into()))
    }
    async fn update_project(&self, _: Project) -> auth_allowance::Result<Project> {
        Err(AllowanceError::RepositoryError("offline".into()))
    }
    async fn find_project(&self, _: Uuid) -> auth_allowance::Result<Option<Project>> {
        Err(AllowanceError::RepositoryError("offline".into()))
    }
    async fn list_projects(&self) -> auth_allowance::Result<Vec<Project>> {
        Err(AllowanceError::RepositoryError("offline".into()))
    }
    async fn insert_role(&self, _: Role) -> auth_allowance::Result<Role> {
        Err(AllowanceError::RepositoryError("offline".into()))
    }
    async fn update_role(&self, _: Role) -> auth_allowance::Result<Role> {
        Err(AllowanceError::RepositoryError("offline".into()))
    }
    async fn find_role(&self, _: Uuid) -> auth_allowance::Result<Option<Role>> {
        Err(AllowanceError::RepositoryError("offline".into()))
    }
    async fn list_roles(&self) -> auth_allowance::Result<Vec<Role>> {
        Err(AllowanceError::RepositoryError("offline".into()))
    }
    async fn builtin_role(&self, _: RoleBuiltin) -> auth_allowance::Result<Role> {
        Err(AllowanceError::RepositoryError("offline".into()))
    }
    async fn insert_membership(&self, _: Membership) -> auth_allowance::Result<Membership> {
        Err(AllowanceError::RepositoryError("offline".into()))
    }
    async fn update_membership(&self, _: Membership) -> auth_allowance::Result<Membership> {
        Err(AllowanceError::RepositoryError("offline".into()))
    }
    async fn delete_membership(&self, _: Uuid) -> auth_allowance::Result<()> {
        Err(AllowanceError::RepositoryError("offline".into()))
    }
    async fn memberships_for(&self, _: Uuid) -> auth_allowance::Result<Vec<Membership>> {
        Err(AllowanceError::RepositoryError("offline".into()))
    }
    async fn memberships_of_project(&self, _: Uuid) -> auth_allowance::Result<Vec<Membership>> {
        Err(AllowanceError::RepositoryError("offline".into()))
    }
    async fn remove_memberships_for_principal(&self, _: Uuid) -> auth_allowance::Result<usize> {
        Err(AllowanceError::RepositoryError("offline".into()))
    }
}

#[tokio::test]
async fn test_storage_failure_denies() {
    let principals = Arc::new(InMemoryPrincipalRepository::new());
    let resolver = PermissionResolver::new(
        Arc::new(BrokenMemberships),
        principals,
        Arc::new(AccessControl::tracker_default()),
    );
    let project = tracker_project("Tracker");
    let user = User::new("dev", "Dev", "Eloper", "dev@example.net");

    assert!(!allowed_in(&resolver, &user, &permission("view_issues"), &project).await);
    assert!(resolver
        .try_allowed_to_in_project(&user, &permission("view_issues"), &project, &AllowanceOptions::default())
        .await
        .is_err());
}
