use std::sync::Arc;

use crate::access_control::AccessControl;
use crate::models::{Action, AllowanceOptions, Candidate, Project};

/// A strategy contributing grant and deny decisions
///
/// Every predicate defaults to `false`, so an evaluator only overrides the
/// decisions it cares about. A single denial from any evaluator for any
/// candidate cannot be overridden by a grant.
pub trait AllowanceEvaluator: Send + Sync {
    /// Used in debug traces
    fn name(&self) -> &'static str;

    fn denied_for_project(
        &self,
        _candidate: &Candidate,
        _action: &Action,
        _project: &Project,
        _options: &AllowanceOptions,
    ) -> bool {
        false
    }

    fn granted_for_project(
        &self,
        _candidate: &Candidate,
        _action: &Action,
        _project: &Project,
        _options: &AllowanceOptions,
    ) -> bool {
        false
    }

    fn denied_for_global(&self, _candidate: &Candidate, _action: &Action, _options: &AllowanceOptions) -> bool {
        false
    }

    fn granted_for_global(&self, _candidate: &Candidate, _action: &Action, _options: &AllowanceOptions) -> bool {
        false
    }
}

/// Grants when one of the candidate's roles allows the action
pub struct DefaultEvaluator {
    access_control: Arc<AccessControl>,
}

impl DefaultEvaluator {
    pub fn new(access_control: Arc<AccessControl>) -> Self {
        Self { access_control }
    }
}

impl AllowanceEvaluator for DefaultEvaluator {
    fn name(&self) -> &'static str {
        "default"
    }

    fn granted_for_project(
        &self,
        candidate: &Candidate,
        action: &Action,
        project: &Project,
        _options: &AllowanceOptions,
    ) -> bool {
        // non-member and anonymous roles only reach public projects
        candidate
            .roles
            .iter()
            .any(|role| (project.is_public || role.is_member()) && self.access_control.role_allows(role, action))
    }

    fn granted_for_global(&self, candidate: &Candidate, action: &Action, _options: &AllowanceOptions) -> bool {
        candidate
            .roles
            .iter()
            .any(|role| self.access_control.role_allows(role, action))
    }
}
