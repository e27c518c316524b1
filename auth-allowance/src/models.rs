use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

/// What is being authorized: a named permission or a controller/action pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Action {
    Permission(String),
    ControllerAction { controller: String, action: String },
}

impl Action {
    pub fn permission(name: impl Into<String>) -> Self {
        Action::Permission(name.into())
    }

    /// A leading `/` on the controller is dropped
    pub fn controller_action(controller: &str, action: &str) -> Self {
        Action::ControllerAction {
            controller: controller.strip_prefix('/').unwrap_or(controller).to_string(),
            action: action.to_string(),
        }
    }

    /// Same action with the controller path normalized
    pub fn normalized(&self) -> Action {
        match self {
            Action::ControllerAction { controller, action } if controller.starts_with('/') => {
                Action::controller_action(controller, action)
            }
            other => other.clone(),
        }
    }

    /// `controller/action` key for controller actions
    pub fn route(&self) -> Option<String> {
        match self {
            Action::Permission(_) => None,
            Action::ControllerAction { controller, action } => {
                Some(format!("{}/{}", controller, action))
            }
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Permission(name) => write!(f, "{}", name),
            Action::ControllerAction { controller, action } => write!(f, "{}/{}", controller, action),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Active,
    Archived,
}

impl ProjectStatus {
    pub fn code(self) -> u8 {
        match self {
            ProjectStatus::Active => 1,
            ProjectStatus::Archived => 9,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub identifier: String,
    pub status: ProjectStatus,
    pub is_public: bool,
    pub parent_id: Option<Uuid>,
    pub enabled_modules: BTreeSet<String>,
    pub created_on: DateTime<Utc>,
}

impl Project {
    /// Active public project with no modules enabled
    pub fn new(name: &str, identifier: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            identifier: identifier.to_string(),
            status: ProjectStatus::Active,
            is_public: true,
            parent_id: None,
            enabled_modules: BTreeSet::new(),
            created_on: Utc::now(),
        }
    }

    pub fn with_modules<I, S>(mut self, modules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enabled_modules = modules.into_iter().map(Into::into).collect();
        self
    }

    pub fn private(mut self) -> Self {
        self.is_public = false;
        self
    }

    pub fn child_of(mut self, parent: &Project) -> Self {
        self.parent_id = Some(parent.id);
        self
    }

    pub fn is_active(&self) -> bool {
        self.status == ProjectStatus::Active
    }

    pub fn archive(&mut self) {
        self.status = ProjectStatus::Archived;
    }

    pub fn unarchive(&mut self) {
        self.status = ProjectStatus::Active;
    }

    pub fn module_enabled(&self, module: &str) -> bool {
        self.enabled_modules.contains(module)
    }
}

impl PartialEq for Project {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Project {}

/// Marks the synthetic roles that exist outside the membership table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleBuiltin {
    None,
    NonMember,
    Anonymous,
}

impl RoleBuiltin {
    pub fn default_name(self) -> &'static str {
        match self {
            RoleBuiltin::None => "Role",
            RoleBuiltin::NonMember => "Non member",
            RoleBuiltin::Anonymous => "Anonymous",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub id: Uuid,
    pub name: String,
    pub position: u32,
    pub builtin: RoleBuiltin,
    pub assignable: bool,
    pub permissions: BTreeSet<String>,
}

impl Role {
    pub fn new(name: &str, position: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            position,
            builtin: RoleBuiltin::None,
            assignable: true,
            permissions: BTreeSet::new(),
        }
    }

    pub fn builtin(builtin: RoleBuiltin) -> Self {
        let mut role = Self::new(builtin.default_name(), 0);
        role.builtin = builtin;
        role.assignable = false;
        role
    }

    /// Given through a project membership
    pub fn is_member(&self) -> bool {
        self.builtin == RoleBuiltin::None
    }

    pub fn is_builtin(&self) -> bool {
        !self.is_member()
    }

    pub fn has_permission(&self, name: &str) -> bool {
        self.permissions.contains(name)
    }
}

impl PartialEq for Role {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Role {}

/// A principal's roles in one project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Membership {
    pub id: Uuid,
    pub principal_id: Uuid,
    pub project_id: Uuid,
    pub role_ids: Vec<Uuid>,
    /// Mail the principal about every event in this project
    pub mail_notification: bool,
    pub created_on: DateTime<Utc>,
}

impl Membership {
    pub fn new(principal_id: Uuid, project_id: Uuid, role_ids: Vec<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            principal_id,
            project_id,
            role_ids,
            mail_notification: false,
            created_on: Utc::now(),
        }
    }
}

/// Where an action is being authorized
#[derive(Debug, Clone, Copy)]
pub enum AllowanceContext<'a> {
    Project(&'a Project),
    /// Granted only when every project grants
    Projects(&'a [Project]),
    None,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowanceOptions {
    /// Check across all projects when no context is given
    pub global: bool,
}

impl AllowanceOptions {
    pub fn global() -> Self {
        Self { global: true }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CandidateKind {
    User,
    Group,
}

/// A principal whose roles may grant an action on behalf of a user
#[derive(Debug, Clone)]
pub struct Candidate {
    pub principal_id: Uuid,
    pub kind: CandidateKind,
    pub roles: Vec<Role>,
}

impl Candidate {
    pub fn new(principal_id: Uuid, kind: CandidateKind, roles: Vec<Role>) -> Self {
        Self {
            principal_id,
            kind,
            roles,
        }
    }
}
