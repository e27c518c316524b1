use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::models::{Action, Project, Role, RoleBuiltin};

/// Who a permission can be given to at all
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Requirement {
    #[default]
    None,
    /// Never given to anonymous visitors
    LoggedIn,
    /// Only given through a project membership
    Member,
}

/// A named permission and the controller actions it opens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub name: String,
    pub project_module: Option<String>,
    /// `controller/action` routes
    pub actions: Vec<String>,
    /// Held implicitly by every role
    pub public: bool,
    pub require: Requirement,
}

impl Permission {
    pub fn new(name: &str, actions: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            project_module: None,
            actions: actions.iter().map(|a| a.to_string()).collect(),
            public: false,
            require: Requirement::None,
        }
    }

    pub fn public(mut self) -> Self {
        self.public = true;
        self
    }

    pub fn require(mut self, requirement: Requirement) -> Self {
        self.require = requirement;
        self
    }
}

/// The permission catalog
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccessControl {
    permissions: Vec<Permission>,
}

impl AccessControl {
    pub fn new() -> Self {
        Self {
            permissions: Vec::new(),
        }
    }

    /// Register permissions that are always available in a project
    pub fn core(mut self, permissions: Vec<Permission>) -> Self {
        self.permissions.extend(permissions);
        self
    }

    /// Register permissions that belong to a project module
    pub fn project_module(mut self, module: &str, permissions: Vec<Permission>) -> Self {
        self.permissions.extend(permissions.into_iter().map(|mut permission| {
            permission.project_module = Some(module.to_string());
            permission
        }));
        self
    }

    pub fn permissions(&self) -> &[Permission] {
        &self.permissions
    }

    pub fn permission(&self, name: &str) -> Option<&Permission> {
        self.permissions.iter().find(|p| p.name == name)
    }

    pub fn allowed_actions(&self, permission_name: &str) -> &[String] {
        self.permission(permission_name)
            .map(|p| p.actions.as_slice())
            .unwrap_or(&[])
    }

    pub fn public_permissions(&self) -> impl Iterator<Item = &Permission> {
        self.permissions.iter().filter(|p| p.public)
    }

    pub fn available_project_modules(&self) -> Vec<&str> {
        let mut modules: Vec<&str> = Vec::new();
        for module in self.permissions.iter().filter_map(|p| p.project_module.as_deref()) {
            if !modules.contains(&module) {
                modules.push(module);
            }
        }
        modules
    }

    /// Permissions available when `modules` are enabled, core permissions included
    pub fn modules_permissions<'a>(
        &'a self,
        modules: &'a BTreeSet<String>,
    ) -> impl Iterator<Item = &'a Permission> + 'a {
        self.permissions.iter().filter(move |p| match &p.project_module {
            None => true,
            Some(module) => modules.contains(module),
        })
    }

    /// Permissions that may be stored on a role of this kind
    pub fn setable_permissions(&self, builtin: RoleBuiltin) -> Vec<&Permission> {
        self.permissions
            .iter()
            .filter(|p| !p.public)
            .filter(|p| match builtin {
                RoleBuiltin::None => true,
                RoleBuiltin::NonMember => p.require != Requirement::Member,
                RoleBuiltin::Anonymous => p.require == Requirement::None,
            })
            .collect()
    }

    /// Replace the role's permissions, dropping those it cannot hold
    pub fn set_role_permissions<S: AsRef<str>>(&self, role: &mut Role, names: &[S]) {
        let setable: BTreeSet<&str> = self
            .setable_permissions(role.builtin)
            .into_iter()
            .map(|p| p.name.as_str())
            .collect();
        role.permissions = names
            .iter()
            .map(|name| name.as_ref())
            .filter(|name| setable.contains(name))
            .map(str::to_string)
            .collect();
    }

    /// The action is covered by a permission of an enabled module
    pub fn project_allows(&self, project: &Project, action: &Action) -> bool {
        let mut available = self.modules_permissions(&project.enabled_modules);
        match action.route() {
            None => {
                let name = action.to_string();
                available.any(|p| p.name == name)
            }
            Some(route) => available.any(|p| p.actions.iter().any(|a| *a == route)),
        }
    }

    /// The role holds the action directly or through a public permission
    pub fn role_allows(&self, role: &Role, action: &Action) -> bool {
        match action {
            Action::Permission(name) => {
                role.has_permission(name) || self.public_permissions().any(|p| p.name == *name)
            }
            Action::ControllerAction { .. } => {
                let route = match action.route() {
                    Some(route) => route,
                    None => return false,
                };
                role.permissions
                    .iter()
                    .flat_map(|name| self.allowed_actions(name).iter())
                    .chain(self.public_permissions().flat_map(|p| p.actions.iter()))
                    .any(|a| *a == route)
            }
        }
    }

    /// Catalog of the stock tracker modules
    pub fn tracker_default() -> Self {
        use Requirement::{LoggedIn, Member};

        AccessControl::new()
            .core(vec![
                Permission::new("view_project", &["projects/show", "projects/activity"]).public(),
                Permission::new("search_project", &["search/index"]).public(),
                Permission::new("add_project", &["projects/new", "projects/create"]).require(LoggedIn),
                Permission::new("edit_project", &["projects/settings", "projects/edit", "projects/update"])
                    .require(Member),
                Permission::new("select_project_modules", &["projects/modules"]).require(Member),
                Permission::new(
                    "manage_members",
                    &["projects/settings", "members/new", "members/edit", "members/destroy", "members/autocomplete"],
                )
                .require(Member),
                Permission::new(
                    "manage_versions",
                    &[
                        "projects/settings",
                        "versions/new",
                        "versions/create",
                        "versions/edit",
                        "versions/update",
                        "versions/close_completed",
                        "versions/destroy",
                    ],
                )
                .require(Member),
                Permission::new("add_subprojects", &["projects/new", "projects/create"]).require(Member),
            ])
            .project_module(
                "issue_tracking",
                vec![
                    Permission::new(
                        "manage_categories",
                        &[
                            "projects/settings",
                            "issue_categories/new",
                            "issue_categories/create",
                            "issue_categories/edit",
                            "issue_categories/update",
                            "issue_categories/destroy",
                        ],
                    )
                    .require(Member),
                    Permission::new(
                        "view_issues",
                        &[
                            "issues/index",
                            "issues/show",
                            "issues/context_menu",
                            "versions/index",
                            "versions/show",
                            "journals/index",
                            "journals/diff",
                            "reports/issue_report",
                            "reports/issue_report_details",
                        ],
                    ),
                    Permission::new("add_issues", &["issues/new", "issues/create", "issues/update_form"]),
                    Permission::new(
                        "edit_issues",
                        &[
                            "issues/edit",
                            "issues/update",
                            "issues/bulk_edit",
                            "issues/bulk_update",
                            "issues/update_form",
                            "journals/new",
                        ],
                    ),
                    Permission::new("manage_issue_relations", &["issue_relations/create", "issue_relations/destroy"]),
                    Permission::new("manage_subtasks", &[]),
                    Permission::new("add_issue_notes", &["issues/edit", "issues/update", "journals/new"]),
                    Permission::new("edit_issue_notes", &["journals/edit"]).require(LoggedIn),
                    Permission::new("edit_own_issue_notes", &["journals/edit"]).require(LoggedIn),
                    Permission::new("move_issues", &["issue_moves/new", "issue_moves/create"]).require(LoggedIn),
                    Permission::new("delete_issues", &["issues/destroy"]).require(Member),
                    Permission::new("manage_public_queries", &["queries/new", "queries/edit", "queries/destroy"])
                        .require(Member),
                    Permission::new("save_queries", &["queries/new", "queries/edit", "queries/destroy"])
                        .require(LoggedIn),
                    Permission::new("view_issue_watchers", &[]),
                    Permission::new("add_issue_watchers", &["watchers/new"]),
                    Permission::new("delete_issue_watchers", &["watchers/destroy"]),
                ],
            )
            .project_module(
                "time_tracking",
                vec![
                    Permission::new("log_time", &["timelog/new", "timelog/create", "timelog/edit"]).require(LoggedIn),
                    Permission::new(
                        "view_time_entries",
                        &["timelog/index", "timelog/show", "time_entry_reports/report"],
                    ),
                    Permission::new(
                        "edit_time_entries",
                        &["timelog/edit", "timelog/update", "timelog/destroy", "timelog/bulk_edit"],
                    )
                    .require(Member),
                    Permission::new(
                        "edit_own_time_entries",
                        &["timelog/edit", "timelog/update", "timelog/destroy", "timelog/bulk_edit"],
                    )
                    .require(LoggedIn),
                    Permission::new(
                        "manage_project_activities",
                        &["project_enumerations/update", "project_enumerations/destroy"],
                    )
                    .require(Member),
                ],
            )
            .project_module(
                "news",
                vec![
                    Permission::new(
                        "manage_news",
                        &["news/new", "news/create", "news/edit", "news/update", "news/destroy", "comments/destroy"],
                    )
                    .require(Member),
                    Permission::new("view_news", &["news/index", "news/show"]).public(),
                    Permission::new("comment_news", &["comments/create"]),
                ],
            )
            .project_module(
                "documents",
                vec![
                    Permission::new(
                        "manage_documents",
                        &["documents/new", "documents/edit", "documents/destroy", "documents/add_attachment"],
                    )
                    .require(LoggedIn),
                    Permission::new("view_documents", &["documents/index", "documents/show", "documents/download"]),
                ],
            )
            .project_module(
                "files",
                vec![
                    Permission::new("manage_files", &["files/new", "files/create"]).require(LoggedIn),
                    Permission::new("view_files", &["files/index", "versions/download"]),
                ],
            )
            .project_module(
                "wiki",
                vec![
                    Permission::new("manage_wiki", &["wikis/edit", "wikis/destroy"]).require(Member),
                    Permission::new("rename_wiki_pages", &["wiki/rename"]).require(Member),
                    Permission::new("delete_wiki_pages", &["wiki/destroy"]).require(Member),
                    Permission::new("view_wiki_pages", &["wiki/index", "wiki/show", "wiki/special", "wiki/date_index"]),
                    Permission::new("export_wiki_pages", &["wiki/export"]),
                    Permission::new("view_wiki_edits", &["wiki/history", "wiki/diff", "wiki/annotate"]),
                    Permission::new("edit_wiki_pages", &["wiki/edit", "wiki/update", "wiki/preview", "wiki/add_attachment"]),
                    Permission::new("delete_wiki_pages_attachments", &["attachments/destroy"]),
                    Permission::new("protect_wiki_pages", &["wiki/protect"]).require(Member),
                ],
            )
            .project_module(
                "repository",
                vec![
                    Permission::new(
                        "manage_repository",
                        &["repositories/edit", "repositories/committers", "repositories/destroy"],
                    )
                    .require(Member),
                    Permission::new(
                        "browse_repository",
                        &[
                            "repositories/show",
                            "repositories/browse",
                            "repositories/entry",
                            "repositories/annotate",
                            "repositories/changes",
                            "repositories/diff",
                            "repositories/stats",
                            "repositories/graph",
                        ],
                    ),
                    Permission::new(
                        "view_changesets",
                        &["repositories/show", "repositories/revisions", "repositories/revision"],
                    ),
                    Permission::new("commit_access", &[]),
                ],
            )
            .project_module(
                "boards",
                vec![
                    Permission::new("manage_boards", &["boards/new", "boards/edit", "boards/destroy"]).require(Member),
                    Permission::new("view_messages", &["boards/index", "boards/show", "messages/show"]).public(),
                    Permission::new("add_messages", &["messages/new", "messages/reply", "messages/quote"]),
                    Permission::new("edit_messages", &["messages/edit"]).require(Member),
                    Permission::new("edit_own_messages", &["messages/edit"]).require(LoggedIn),
                    Permission::new("delete_messages", &["messages/destroy"]).require(Member),
                    Permission::new("delete_own_messages", &["messages/destroy"]).require(LoggedIn),
                ],
            )
            .project_module("calendar", vec![Permission::new("view_calendar", &["calendars/show", "calendars/update"])])
            .project_module("gantt", vec![Permission::new("view_gantt", &["gantts/show", "gantts/update"])])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> AccessControl {
        AccessControl::tracker_default()
    }

    #[test]
    fn test_default_modules() {
        assert_eq!(
            catalog().available_project_modules(),
            vec![
                "issue_tracking",
                "time_tracking",
                "news",
                "documents",
                "files",
                "wiki",
                "repository",
                "boards",
                "calendar",
                "gantt"
            ]
        );
    }

    #[test]
    fn test_project_allows_only_enabled_modules() {
        let catalog = catalog();
        let project = Project::new("Tracker", "tracker").with_modules(["issue_tracking"]);

        assert!(catalog.project_allows(&project, &Action::permission("view_issues")));
        assert!(catalog.project_allows(&project, &Action::permission("edit_project")));
        assert!(!catalog.project_allows(&project, &Action::permission("view_wiki_pages")));
        assert!(!catalog.project_allows(&project, &Action::permission("no_such_permission")));
        assert!(catalog.project_allows(&project, &Action::controller_action("/issues", "show")));
        assert!(!catalog.project_allows(&project, &Action::controller_action("wiki", "show")));
    }

    #[test]
    fn test_public_permissions_are_held_by_every_role() {
        let catalog = catalog();
        let role = Role::new("Empty", 1);

        assert!(catalog.role_allows(&role, &Action::permission("view_project")));
        assert!(catalog.role_allows(&role, &Action::controller_action("news", "index")));
        assert!(!catalog.role_allows(&role, &Action::permission("view_issues")));
    }

    #[test]
    fn test_role_allows_routes_of_held_permissions() {
        let catalog = catalog();
        let mut role = Role::new("Developer", 1);
        catalog.set_role_permissions(&mut role, &["edit_issues"]);

        assert!(catalog.role_allows(&role, &Action::controller_action("issues", "bulk_edit")));
        assert!(!catalog.role_allows(&role, &Action::controller_action("issues", "destroy")));
    }

    #[test]
    fn test_builtin_roles_drop_restricted_permissions() {
        let catalog = catalog();
        let names = ["view_issues", "log_time", "edit_project", "view_project"];

        let mut anonymous = Role::builtin(RoleBuiltin::Anonymous);
        catalog.set_role_permissions(&mut anonymous, &names);
        assert_eq!(anonymous.permissions, BTreeSet::from(["view_issues".to_string()]));

        let mut non_member = Role::builtin(RoleBuiltin::NonMember);
        catalog.set_role_permissions(&mut non_member, &names);
        assert!(non_member.has_permission("log_time"));
        assert!(!non_member.has_permission("edit_project"));

        let mut manager = Role::new("Manager", 1);
        catalog.set_role_permissions(&mut manager, &names);
        assert_eq!(manager.permissions.len(), 3);
    }
}
