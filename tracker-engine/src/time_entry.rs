use auth_allowance::{Action, AllowanceOptions, MembershipRepository, PermissionResolver, Project};
use auth_identity::User;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use error_common::{ErrorKind, ValidationErrors};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::error::{Result, TrackerEngineError};
use crate::hours::parse_hours;
use crate::repository::TrackerRepository;
use crate::time_report::{Criterion, Period, ReportLookup, TimeReport};

pub const MAX_HOURS: f64 = 1000.0;
pub const COMMENTS_MAX_LENGTH: usize = 255;

/// Time spent by a user on a project, optionally on an issue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeEntry {
    pub id: Uuid,
    pub project_id: Option<Uuid>,
    pub issue_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub activity_id: Option<Uuid>,
    hours: Option<f64>,
    /// Raw input that did not parse as hours
    #[serde(skip)]
    unparsed_hours: Option<String>,
    spent_on: Option<NaiveDate>,
    tyear: Option<i32>,
    tmonth: Option<u32>,
    tweek: Option<u32>,
    pub comments: String,
    pub created_on: DateTime<Utc>,
    pub updated_on: DateTime<Utc>,
}

impl TimeEntry {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            project_id: None,
            issue_id: None,
            user_id: None,
            activity_id: None,
            hours: None,
            unparsed_hours: None,
            spent_on: None,
            tyear: None,
            tmonth: None,
            tweek: None,
            comments: String::new(),
            created_on: now,
            updated_on: now,
        }
    }

    pub fn hours(&self) -> Option<f64> {
        self.hours
    }

    pub fn set_hours(&mut self, hours: Option<f64>) {
        self.hours = hours;
        self.unparsed_hours = None;
    }

    /// Accepts anything [`parse_hours`] understands; blank input clears the hours
    pub fn set_hours_from_str(&mut self, input: &str) {
        if input.trim().is_empty() {
            self.set_hours(None);
            return;
        }
        match parse_hours(input) {
            Some(hours) => self.set_hours(Some(hours)),
            None => {
                self.hours = None;
                self.unparsed_hours = Some(input.to_string());
            }
        }
    }

    pub fn has_unparsed_hours(&self) -> bool {
        self.unparsed_hours.is_some()
    }

    pub fn spent_on(&self) -> Option<NaiveDate> {
        self.spent_on
    }

    /// Derived fields follow on the next [`TimeEntry::recompute_derived_fields`]
    pub fn set_spent_on(&mut self, spent_on: Option<NaiveDate>) {
        self.spent_on = spent_on;
    }

    pub fn tyear(&self) -> Option<i32> {
        self.tyear
    }

    pub fn tmonth(&self) -> Option<u32> {
        self.tmonth
    }

    /// ISO week number of `spent_on`
    pub fn tweek(&self) -> Option<u32> {
        self.tweek
    }

    pub fn recompute_derived_fields(&mut self) {
        match self.spent_on {
            Some(date) => {
                self.tyear = Some(date.year());
                self.tmonth = Some(date.month());
                self.tweek = Some(date.iso_week().week());
            }
            None => {
                self.tyear = None;
                self.tmonth = None;
                self.tweek = None;
            }
        }
    }
}

impl Default for TimeEntry {
    fn default() -> Self {
        Self::new()
    }
}

pub struct TimeEntryService {
    tracker: Arc<dyn TrackerRepository>,
    resolver: Arc<PermissionResolver>,
}

impl TimeEntryService {
    pub fn new(tracker: Arc<dyn TrackerRepository>, resolver: Arc<PermissionResolver>) -> Self {
        Self { tracker, resolver }
    }

    /// Unsaved entry with the default activity preselected
    pub async fn new_entry(&self, project_id: Option<Uuid>, user_id: Uuid) -> Result<TimeEntry> {
        let mut entry = TimeEntry::new();
        entry.project_id = project_id;
        entry.user_id = Some(user_id);
        entry.activity_id = self.tracker.default_activity().await?.map(|a| a.id);
        Ok(entry)
    }

    /// Fills a missing project from the issue, then checks the entry
    pub async fn validate(&self, entry: &mut TimeEntry) -> Result<ValidationErrors> {
        let issue = match entry.issue_id {
            Some(issue_id) => self.tracker.find_issue(issue_id).await?,
            None => None,
        };
        if entry.project_id.is_none() {
            entry.project_id = issue.as_ref().map(|i| i.project_id);
        }

        let mut errors = ValidationErrors::new();
        if entry.user_id.is_none() {
            errors.add("user_id", ErrorKind::Blank);
        }
        if entry.activity_id.is_none() {
            errors.add("activity_id", ErrorKind::Blank);
        }
        if entry.project_id.is_none() {
            errors.add("project_id", ErrorKind::Blank);
        }
        if entry.spent_on.is_none() {
            errors.add("spent_on", ErrorKind::Blank);
        }

        if entry.has_unparsed_hours() {
            errors.add("hours", ErrorKind::Invalid);
        } else {
            match entry.hours {
                None => errors.add("hours", ErrorKind::Blank),
                Some(hours) if !(0.0..MAX_HOURS).contains(&hours) => {
                    errors.add("hours", ErrorKind::Invalid)
                }
                Some(_) => {}
            }
        }

        if entry.comments.chars().count() > COMMENTS_MAX_LENGTH {
            errors.add(
                "comments",
                ErrorKind::TooLong {
                    max: COMMENTS_MAX_LENGTH,
                },
            );
        }

        let project = match entry.project_id {
            Some(project_id) => self.resolver.memberships().find_project(project_id).await?,
            None => None,
        };
        if project.is_none() {
            errors.add("project_id", ErrorKind::Invalid);
        }

        if entry.issue_id.is_some() {
            let matches_project = match (&issue, &project) {
                (Some(issue), Some(project)) => issue.project_id == project.id,
                _ => false,
            };
            if !matches_project {
                errors.add("issue_id", ErrorKind::Invalid);
            }
        }
        Ok(errors)
    }

    pub async fn save(&self, mut entry: TimeEntry) -> Result<TimeEntry> {
        let errors = self.validate(&mut entry).await?;
        if !errors.is_empty() {
            return Err(TrackerEngineError::Validation(errors));
        }
        let entry = self.tracker.save_time_entry(entry).await?;
        debug!(time_entry_id = %entry.id, hours = ?entry.hours, "Time entry saved");
        Ok(entry)
    }

    /// Entries in projects where `user` may view time entries
    pub async fn visible(&self, user: &User) -> Result<Vec<TimeEntry>> {
        let mut decisions: HashMap<Uuid, bool> = HashMap::new();
        let mut visible = Vec::new();
        for entry in self.tracker.list_time_entries().await? {
            let project_id = match entry.project_id {
                Some(project_id) => project_id,
                None => continue,
            };
            let allowed = match decisions.get(&project_id) {
                Some(allowed) => *allowed,
                None => {
                    let allowed = self.allowed(user, "view_time_entries", project_id).await?;
                    decisions.insert(project_id, allowed);
                    allowed
                }
            };
            if allowed {
                visible.push(entry);
            }
        }
        Ok(visible)
    }

    pub async fn earliest_date_for_project(
        &self,
        user: &User,
        project_id: Uuid,
    ) -> Result<Option<NaiveDate>> {
        Ok(self
            .visible_in_hierarchy(user, project_id)
            .await?
            .iter()
            .filter_map(TimeEntry::spent_on)
            .min())
    }

    pub async fn latest_date_for_project(
        &self,
        user: &User,
        project_id: Uuid,
    ) -> Result<Option<NaiveDate>> {
        Ok(self
            .visible_in_hierarchy(user, project_id)
            .await?
            .iter()
            .filter_map(TimeEntry::spent_on)
            .max())
    }

    async fn visible_in_hierarchy(&self, user: &User, project_id: Uuid) -> Result<Vec<TimeEntry>> {
        let scope: HashSet<Uuid> = self
            .resolver
            .memberships()
            .self_and_descendant_ids(project_id)
            .await?
            .into_iter()
            .collect();
        Ok(self
            .visible(user)
            .await?
            .into_iter()
            .filter(|e| e.project_id.map_or(false, |id| scope.contains(&id)))
            .collect())
    }

    pub async fn editable_by(&self, entry: &TimeEntry, user: &User) -> Result<bool> {
        let project_id = match entry.project_id {
            Some(project_id) => project_id,
            None => return Ok(false),
        };
        if entry.user_id == Some(user.id)
            && self.allowed(user, "edit_own_time_entries", project_id).await?
        {
            return Ok(true);
        }
        self.allowed(user, "edit_time_entries", project_id).await
    }

    /// Hours of the visible entries grouped by `criteria` and `period`
    pub async fn report(
        &self,
        user: &User,
        project_id: Option<Uuid>,
        criteria: &[Criterion],
        period: Period,
    ) -> Result<TimeReport> {
        let entries = match project_id {
            Some(project_id) => self.visible_in_hierarchy(user, project_id).await?,
            None => self.visible(user).await?,
        };

        let mut lookup = ReportLookup::default();
        for project in self.resolver.memberships().list_projects().await? {
            lookup.projects.insert(project.id, project);
        }
        for issue_id in entries.iter().filter_map(|e| e.issue_id) {
            if let Some(issue) = self.tracker.find_issue(issue_id).await? {
                lookup.issues.insert(issue.id, issue);
            }
        }
        Ok(TimeReport::build(&entries, &lookup, criteria, period))
    }

    async fn allowed(&self, user: &User, permission: &str, project_id: Uuid) -> Result<bool> {
        let project: Project = match self.resolver.memberships().find_project(project_id).await? {
            Some(project) => project,
            None => return Ok(false),
        };
        Ok(self
            .resolver
            .try_allowed_to_in_project(
                user,
                &Action::permission(permission),
                &project,
                &AllowanceOptions::default(),
            )
            .await?)
    }
}
