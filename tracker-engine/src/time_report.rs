use auth_allowance::Project;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use uuid::Uuid;

use crate::models::Issue;
use crate::time_entry::TimeEntry;

/// A column entries can be grouped by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    Project,
    /// The entry's project when it has a parent
    Subproject,
    Version,
    Category,
    Member,
    Tracker,
    Activity,
    Issue,
    Priority,
    Author,
    Assignee,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Year,
    Month,
    Week,
    Day,
}

impl Period {
    /// Column key: `2024`, `2024-3`, `2024-12` (ISO week) or `2024-03-05`
    pub fn key(self, entry: &TimeEntry) -> Option<String> {
        match self {
            Period::Year => entry.tyear().map(|y| y.to_string()),
            Period::Month => Some(format!("{}-{}", entry.tyear()?, entry.tmonth()?)),
            Period::Week => Some(format!("{}-{}", entry.tyear()?, entry.tweek()?)),
            Period::Day => entry.spent_on().map(|d| d.format("%Y-%m-%d").to_string()),
        }
    }
}

/// Records referenced by the entries of a report
#[derive(Debug, Clone, Default)]
pub struct ReportLookup {
    pub projects: HashMap<Uuid, Project>,
    pub issues: HashMap<Uuid, Issue>,
}

impl ReportLookup {
    fn value(&self, criterion: Criterion, entry: &TimeEntry) -> Option<String> {
        let issue = entry.issue_id.and_then(|id| self.issues.get(&id));
        match criterion {
            Criterion::Project => entry.project_id.map(|id| id.to_string()),
            Criterion::Subproject => entry
                .project_id
                .and_then(|id| self.projects.get(&id))
                .filter(|p| p.parent_id.is_some())
                .map(|p| p.id.to_string()),
            Criterion::Version => issue?.fixed_version_id.map(|id| id.to_string()),
            Criterion::Category => issue?.category_id.map(|id| id.to_string()),
            Criterion::Member => entry.user_id.map(|id| id.to_string()),
            Criterion::Tracker => issue.map(|i| i.tracker.clone()),
            Criterion::Activity => entry.activity_id.map(|id| id.to_string()),
            Criterion::Issue => entry.issue_id.map(|id| id.to_string()),
            Criterion::Priority => issue.map(|i| i.priority.clone()),
            Criterion::Author => issue.map(|i| i.author_id.to_string()),
            Criterion::Assignee => issue?.assigned_to_id.map(|id| id.to_string()),
        }
    }
}

/// One combination of criteria values; `None` stands for "none"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    pub values: Vec<Option<String>>,
    pub hours: BTreeMap<String, f64>,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeReport {
    pub criteria: Vec<Criterion>,
    pub period: Period,
    /// Period keys in chronological order
    pub periods: Vec<String>,
    pub rows: Vec<ReportRow>,
    pub totals: BTreeMap<String, f64>,
    pub total: f64,
}

impl TimeReport {
    pub fn build(
        entries: &[TimeEntry],
        lookup: &ReportLookup,
        criteria: &[Criterion],
        period: Period,
    ) -> Self {
        let mut rows: BTreeMap<Vec<Option<String>>, ReportRow> = BTreeMap::new();
        let mut periods: BTreeSet<(Vec<u32>, String)> = BTreeSet::new();
        let mut totals: BTreeMap<String, f64> = BTreeMap::new();
        let mut total = 0.0;

        for entry in entries {
            let (hours, key) = match (entry.hours(), period.key(entry)) {
                (Some(hours), Some(key)) => (hours, key),
                _ => continue,
            };
            let values: Vec<Option<String>> =
                criteria.iter().map(|c| lookup.value(*c, entry)).collect();

            let row = rows.entry(values.clone()).or_insert_with(|| ReportRow {
                values,
                hours: BTreeMap::new(),
                total: 0.0,
            });
            *row.hours.entry(key.clone()).or_insert(0.0) += hours;
            row.total += hours;

            *totals.entry(key.clone()).or_insert(0.0) += hours;
            total += hours;
            periods.insert((chronological(&key), key));
        }

        Self {
            criteria: criteria.to_vec(),
            period,
            periods: periods.into_iter().map(|(_, key)| key).collect(),
            rows: rows.into_values().collect(),
            totals,
            total,
        }
    }

    pub fn hours_for(&self, values: &[Option<&str>], period_key: &str) -> f64 {
        self.rows
            .iter()
            .find(|row| {
                row.values.len() == values.len()
                    && row.values.iter().zip(values).all(|(a, b)| a.as_deref() == *b)
            })
            .and_then(|row| row.hours.get(period_key).copied())
            .unwrap_or(0.0)
    }
}

// "2024-12" must sort after "2024-3"
fn chronological(key: &str) -> Vec<u32> {
    key.split('-').filter_map(|part| part.parse().ok()).collect()
}
