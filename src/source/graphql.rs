//! Raw GraphQL node shapes and their conversion into the domain model
//!
//! Every field the API may omit is optional here; the conversion decides
//! whether a gap is tolerable or makes the record malformed.

use crate::error::{malformed, RecordKind, SkipReport};
use crate::model::{
    Interval, Issue, IssueIteration, IssueRef, MergeRequest, PipelineStatus, TimeLogEntry,
};
use crate::timestamp::parse_optional;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::HashMap;

/// A list that arrives bare, wrapped as a `{ "nodes": [...] }` connection, or `null`
///
/// Elements that do not fit `T` are dropped one by one; their reasons stay in
/// `rejected` so the conversion can count them.
#[derive(Debug, Clone)]
pub struct Nodes<T> {
    items: Vec<T>,
    rejected: Vec<String>,
}

impl<T> Default for Nodes<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            rejected: Vec::new(),
        }
    }
}

impl<T> From<Vec<T>> for Nodes<T> {
    fn from(items: Vec<T>) -> Self {
        Self {
            items,
            rejected: Vec::new(),
        }
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Nodes<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let elements = match Value::deserialize(deserializer)? {
            Value::Null => Vec::new(),
            Value::Array(elements) => elements,
            Value::Object(mut connection) => match connection.remove("nodes") {
                None | Some(Value::Null) => Vec::new(),
                Some(Value::Array(elements)) => elements,
                Some(other) => {
                    return Ok(Self {
                        items: Vec::new(),
                        rejected: vec![format!("expected a nodes list, got {}", other)],
                    })
                }
            },
            other => {
                return Ok(Self {
                    items: Vec::new(),
                    rejected: vec![format!("expected a list, got {}", other)],
                })
            }
        };

        let mut nodes = Self::default();
        for element in elements {
            match serde_json::from_value(element) {
                Ok(item) => nodes.items.push(item),
                Err(e) => nodes.rejected.push(e.to_string()),
            }
        }
        Ok(nodes)
    }
}

impl<T> Nodes<T> {
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Why each dropped element did not deserialize
    pub fn rejected(&self) -> &[String] {
        &self.rejected
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn record_rejected(&self, kind: RecordKind, owner: &str, skipped: &mut SkipReport) {
        for reason in &self.rejected {
            skipped.record(malformed(kind, owner, reason.as_str()));
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawIteration {
    pub id: Option<String>,
    pub title: Option<String>,
    pub start_date: Option<String>,
    pub due_date: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawUser {
    pub username: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawTimelog {
    pub time_spent: Option<f64>,
    pub spent_at: Option<String>,
    pub user: Option<RawUser>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawIssueRef {
    pub id: Option<String>,
    pub closed_at: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawIssueIteration {
    pub id: Option<String>,
    pub title: Option<String>,
    pub start_date: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawIssue {
    pub id: Option<String>,
    pub title: Option<String>,
    pub weight: Option<f64>,
    pub created_at: Option<String>,
    pub closed_at: Option<String>,
    /// Numeric or string project id
    pub project_id: Option<Value>,
    pub iteration: Option<RawIssueIteration>,
    pub assignees: Nodes<RawUser>,
    pub timelogs: Nodes<RawTimelog>,
    pub blocked_by_issues: Nodes<RawIssueRef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPipeline {
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawMergeRequest {
    pub title: Option<String>,
    pub created_at: Option<String>,
    pub merged_at: Option<String>,
    /// Only the count matters
    pub notes: Nodes<Value>,
    pub pipelines: Nodes<RawPipeline>,
    pub approved_by: Nodes<Value>,
}

/// Converted records plus whatever had to be dropped on the way
#[derive(Debug, Clone, PartialEq)]
pub struct Converted<T> {
    pub records: Vec<T>,
    pub skipped: SkipReport,
}

impl<T> Default for Converted<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            skipped: SkipReport::default(),
        }
    }
}

pub fn convert_iterations(raw: &Nodes<RawIteration>) -> Converted<Interval> {
    let mut out = Converted::default();
    raw.record_rejected(RecordKind::Iteration, "<unknown>", &mut out.skipped);

    for iteration in raw.items() {
        let Some(id) = iteration.id.as_deref().filter(|id| !id.trim().is_empty()) else {
            out.skipped
                .record(malformed(RecordKind::Iteration, "<unknown>", "missing id"));
            continue;
        };

        let start = match parse_optional(iteration.start_date.as_deref()) {
            Ok(start) => start,
            Err(bad) => {
                out.skipped.record(malformed(
                    RecordKind::Iteration,
                    id,
                    format!("unparseable startDate '{}'", bad),
                ));
                continue;
            }
        };
        let end = match parse_optional(iteration.due_date.as_deref()) {
            Ok(end) => end,
            Err(bad) => {
                out.skipped.record(malformed(
                    RecordKind::Iteration,
                    id,
                    format!("unparseable dueDate '{}'", bad),
                ));
                continue;
            }
        };

        out.records.push(Interval::new(
            id,
            iteration.title.as_deref(),
            iteration.start_date.as_deref(),
            start,
            end,
        ));
    }

    out
}

/// Convert issues; `labels` maps known iteration ids to their index label
pub fn convert_issues(
    raw: &Nodes<RawIssue>,
    labels: &HashMap<String, String>,
) -> Converted<Issue> {
    let mut out = Converted::default();
    raw.record_rejected(RecordKind::Issue, "<unknown>", &mut out.skipped);

    for issue in raw.items() {
        let Some(id) = issue.id.as_deref().filter(|id| !id.trim().is_empty()) else {
            out.skipped
                .record(malformed(RecordKind::Issue, "<unknown>", "missing id"));
            continue;
        };

        let created_at = match parse_optional(issue.created_at.as_deref()) {
            Ok(t) => t,
            Err(bad) => {
                out.skipped.record(malformed(
                    RecordKind::Issue,
                    id,
                    format!("unparseable createdAt '{}'", bad),
                ));
                continue;
            }
        };
        let closed_at = match parse_optional(issue.closed_at.as_deref()) {
            Ok(t) => t,
            Err(bad) => {
                out.skipped.record(malformed(
                    RecordKind::Issue,
                    id,
                    format!("unparseable closedAt '{}'", bad),
                ));
                continue;
            }
        };

        let mut converted = Issue::new(id, issue.title.clone().unwrap_or_default())
            .with_assignees(
                issue
                    .assignees
                    .items()
                    .iter()
                    .filter_map(|user| user.username.clone()),
            );
        converted.weight = issue.weight;
        converted.created_at = created_at;
        converted.closed_at = closed_at;
        converted.project = issue.project_id.as_ref().and_then(project_key);
        converted.iteration = issue
            .iteration
            .as_ref()
            .and_then(|iteration| convert_issue_iteration(iteration, labels));

        issue
            .timelogs
            .record_rejected(RecordKind::TimeLog, id, &mut out.skipped);
        for log in issue.timelogs.items() {
            match convert_timelog(log) {
                Ok(entry) => converted.time_logs.push(entry),
                Err(reason) => out
                    .skipped
                    .record(malformed(RecordKind::TimeLog, id, reason)),
            }
        }

        for reason in issue.blocked_by_issues.rejected() {
            tracing::debug!("dropping blocker of {}: {}", id, reason);
        }
        for blocker in issue.blocked_by_issues.items() {
            let Some(blocker_id) = blocker.id.clone() else {
                continue;
            };
            match parse_optional(blocker.closed_at.as_deref()) {
                Ok(closed_at) => converted.blocked_by.push(IssueRef {
                    id: blocker_id,
                    closed_at,
                }),
                Err(bad) => tracing::debug!(
                    "dropping blocker {} of {}: unparseable closedAt '{}'",
                    blocker_id,
                    id,
                    bad
                ),
            }
        }

        out.records.push(converted);
    }

    out
}

fn project_key(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn convert_issue_iteration(
    raw: &RawIssueIteration,
    labels: &HashMap<String, String>,
) -> Option<IssueIteration> {
    let id = raw.id.clone()?;
    let start = parse_optional(raw.start_date.as_deref()).ok().flatten();
    let label = match labels.get(&id) {
        Some(label) => label.clone(),
        None => {
            Interval::new(id.as_str(), raw.title.as_deref(), raw.start_date.as_deref(), None, None)
                .label
        }
    };

    Some(IssueIteration { id, label, start })
}

fn convert_timelog(raw: &RawTimelog) -> std::result::Result<TimeLogEntry, String> {
    let seconds = raw.time_spent.ok_or("missing timeSpent")?;
    if !(seconds.is_finite() && seconds > 0.0) {
        return Err(format!("timeSpent must be positive, got {}", seconds));
    }

    let logged_at = match parse_optional(raw.spent_at.as_deref()) {
        Ok(Some(t)) => t,
        Ok(None) => return Err("missing spentAt".to_string()),
        Err(bad) => return Err(format!("unparseable spentAt '{}'", bad)),
    };

    let owner_username = raw
        .user
        .as_ref()
        .and_then(|user| user.username.clone())
        .ok_or("missing user")?;

    Ok(TimeLogEntry {
        seconds,
        logged_at,
        owner_username,
    })
}

pub fn convert_merge_requests(raw: &Nodes<RawMergeRequest>) -> Converted<MergeRequest> {
    let mut out = Converted::default();
    raw.record_rejected(RecordKind::MergeRequest, "<unknown>", &mut out.skipped);

    for mr in raw.items() {
        let title = mr
            .title
            .clone()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| "Untitled".to_string());

        let created_at = match parse_optional(mr.created_at.as_deref()) {
            Ok(Some(t)) => t,
            Ok(None) => {
                out.skipped.record(malformed(
                    RecordKind::MergeRequest,
                    &title,
                    "missing createdAt",
                ));
                continue;
            }
            Err(bad) => {
                out.skipped.record(malformed(
                    RecordKind::MergeRequest,
                    &title,
                    format!("unparseable createdAt '{}'", bad),
                ));
                continue;
            }
        };
        let merged_at = match parse_optional(mr.merged_at.as_deref()) {
            Ok(t) => t,
            Err(bad) => {
                out.skipped.record(malformed(
                    RecordKind::MergeRequest,
                    &title,
                    format!("unparseable mergedAt '{}'", bad),
                ));
                continue;
            }
        };

        out.records.push(MergeRequest {
            title,
            created_at,
            merged_at,
            note_count: mr.notes.len(),
            approval_count: mr.approved_by.len(),
            pipeline_statuses: mr
                .pipelines
                .items()
                .iter()
                .filter_map(|p| p.status.as_deref())
                .map(PipelineStatus::from_api)
                .collect(),
        });
    }

    out
}
