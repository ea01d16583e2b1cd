use bson::{DateTime, Uuid};
use bugdesk_store::{document::Document, query::Expr};
use serde::{Deserialize, Serialize};

use super::{
    FieldEnum, ParamValue, Violations, append_param, double_option, equality_filter, field_enum, trimmed,
    trimmed_all,
};

pub const DEFAULT_PROJECT: &str = "General";
const MAX_TITLE_CHARS: usize = 200;

field_enum! {
    pub enum BugStatus in "status" {
        Open => "open",
        InProgress => "in-progress",
        Resolved => "resolved",
        Closed => "closed",
    }
}

field_enum! {
    pub enum Priority in "priority" {
        Low => "low",
        Medium => "medium",
        High => "high",
        Critical => "critical",
    }
}

/// A stored bug report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bug {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub status: BugStatus,
    pub priority: Priority,
    pub assigned_to: Option<String>,
    pub reported_by: String,
    pub project: String,
    pub tags: Vec<String>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl Document for Bug {
    fn id(&self) -> &Uuid {
        &self.id
    }

    fn collection_name() -> &'static str {
        "bugs"
    }
}

impl Bug {
    pub fn new(fields: BugFields) -> Self {
        let now = DateTime::now();

        Self {
            id: Uuid::new(),
            title: fields.title,
            description: fields.description,
            status: fields.status,
            priority: fields.priority,
            assigned_to: fields.assigned_to,
            reported_by: fields.reported_by,
            project: fields.project,
            tags: fields.tags,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replaces every field with `fields` and refreshes `updated_at`.
    pub fn apply(&mut self, fields: BugFields) {
        self.title = fields.title;
        self.description = fields.description;
        self.status = fields.status;
        self.priority = fields.priority;
        self.assigned_to = fields.assigned_to;
        self.reported_by = fields.reported_by;
        self.project = fields.project;
        self.tags = fields.tags;
        self.updated_at = DateTime::now();
    }
}

/// Validated bug fields, ready to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct BugFields {
    pub title: String,
    pub description: String,
    pub status: BugStatus,
    pub priority: Priority,
    pub assigned_to: Option<String>,
    pub reported_by: String,
    pub project: String,
    pub tags: Vec<String>,
}

/// Request body for creating or updating a bug. Every field is optional here;
/// validation decides what is required. `Some(None)` is an explicit `null`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BugPayload {
    #[serde(default, deserialize_with = "double_option")]
    pub title: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub status: Option<String>,
    pub priority: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub assigned_to: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub reported_by: Option<Option<String>>,
    pub project: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl BugPayload {
    /// Overlays this payload onto `base`. Fields present here win, including an
    /// explicit `null`.
    pub fn overlay(self, base: BugPayload) -> BugPayload {
        BugPayload {
            title: self.title.or(base.title),
            description: self.description.or(base.description),
            status: self.status.or(base.status),
            priority: self.priority.or(base.priority),
            assigned_to: self.assigned_to.or(base.assigned_to),
            reported_by: self.reported_by.or(base.reported_by),
            project: self.project.or(base.project),
            tags: self.tags.or(base.tags),
        }
    }

    pub fn validate(self) -> Result<BugFields, Vec<String>> {
        let mut violations = Violations::default();

        let title = violations.required(self.title.flatten(), "Bug title is required");
        violations.max_chars(&title, MAX_TITLE_CHARS, "Title cannot exceed 200 characters");
        let description = violations.required(self.description.flatten(), "Bug description is required");
        let status = violations.one_of(self.status, BugStatus::Open);
        let priority = violations.one_of(self.priority, Priority::Medium);
        let assigned_to = self.assigned_to.flatten().map(trimmed);
        let reported_by = violations.required(self.reported_by.flatten(), "Reporter name is required");
        let project = self
            .project
            .map(trimmed)
            .unwrap_or_else(|| DEFAULT_PROJECT.to_string());
        let tags = trimmed_all(self.tags.unwrap_or_default());

        violations.finish(BugFields {
            title,
            description,
            status,
            priority,
            assigned_to,
            reported_by,
            project,
            tags,
        })
    }
}

impl From<&Bug> for BugPayload {
    fn from(bug: &Bug) -> Self {
        BugPayload {
            title: Some(Some(bug.title.clone())),
            description: Some(Some(bug.description.clone())),
            status: Some(bug.status.as_str().to_string()),
            priority: Some(bug.priority.as_str().to_string()),
            assigned_to: Some(bug.assigned_to.clone()),
            reported_by: Some(Some(bug.reported_by.clone())),
            project: Some(bug.project.clone()),
            tags: Some(bug.tags.clone()),
        }
    }
}

/// Query-string filters for listing bugs. Unknown parameters are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "Vec<(String, String)>")]
pub struct BugFilter {
    pub status: Option<ParamValue>,
    pub priority: Option<ParamValue>,
    pub project: Option<ParamValue>,
}

impl BugFilter {
    pub fn to_expr(&self) -> Option<Expr> {
        equality_filter([
            ("status", self.status.as_ref()),
            ("priority", self.priority.as_ref()),
            ("project", self.project.as_ref()),
        ])
    }
}

impl From<Vec<(String, String)>> for BugFilter {
    fn from(params: Vec<(String, String)>) -> Self {
        let mut filter = BugFilter::default();

        for (name, value) in params {
            let slot = match name.as_str() {
                "status" => &mut filter.status,
                "priority" => &mut filter.priority,
                "project" => &mut filter.project,
                _ => continue,
            };
            append_param(slot, value);
        }

        filter
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BugStats {
    pub total: u64,
    pub open: u64,
    pub in_progress: u64,
    pub resolved: u64,
    pub closed: u64,
    pub critical: u64,
    pub high: u64,
    pub medium: u64,
    pub low: u64,
}

impl<'a> FromIterator<&'a Bug> for BugStats {
    fn from_iter<I: IntoIterator<Item = &'a Bug>>(bugs: I) -> Self {
        bugs.into_iter().fold(BugStats::default(), |mut stats, bug| {
            stats.total += 1;

            match bug.status {
                BugStatus::Open => stats.open += 1,
                BugStatus::InProgress => stats.in_progress += 1,
                BugStatus::Resolved => stats.resolved += 1,
                BugStatus::Closed => stats.closed += 1,
            }

            match bug.priority {
                Priority::Critical => stats.critical += 1,
                Priority::High => stats.high += 1,
                Priority::Medium => stats.medium += 1,
                Priority::Low => stats.low += 1,
            }

            stats
        })
    }
}
