//! Domain model shared by all engines
//!
//! These are the validated, already-parsed forms of the tracker records.
//! Every entity is rebuilt from a fresh fetch for each aggregation pass.

use crate::timestamp::Timestamp;
use serde::Serialize;

/// A named time window (iteration / sprint)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Interval {
    /// Opaque tracker id (e.g. `gid://gitlab/Iteration/42`)
    pub id: String,
    /// Title, or the start date when the iteration has no title
    pub label: String,
    pub start: Option<Timestamp>,
    pub end: Option<Timestamp>,
}

impl Interval {
    /// Build an interval, deriving the label from `title`, then `start_raw`, then `id`
    pub fn new(
        id: impl Into<String>,
        title: Option<&str>,
        start_raw: Option<&str>,
        start: Option<Timestamp>,
        end: Option<Timestamp>,
    ) -> Self {
        let id = id.into();
        let label = title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .or(start_raw.map(str::trim).filter(|s| !s.is_empty()))
            .unwrap_or(id.as_str())
            .to_string();

        Self {
            id,
            label,
            start,
            end,
        }
    }

    /// Both ends present; only bounded intervals take part in matching
    pub fn is_bounded(&self) -> bool {
        self.start.is_some() && self.end.is_some()
    }

    /// Inclusive containment test; unbounded intervals never match
    pub fn contains(&self, t: Timestamp) -> bool {
        match (self.start, self.end) {
            (Some(start), Some(end)) => start <= t && t <= end,
            _ => false,
        }
    }
}

/// Seconds logged against an issue at one instant
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeLogEntry {
    pub seconds: f64,
    pub logged_at: Timestamp,
    pub owner_username: String,
}

/// Reference to a blocking issue, carrying enough state to test liveness
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssueRef {
    pub id: String,
    pub closed_at: Option<Timestamp>,
}

impl IssueRef {
    pub fn is_open(&self) -> bool {
        self.closed_at.is_none()
    }
}

/// The iteration an issue is scheduled in
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssueIteration {
    pub id: String,
    pub label: String,
    pub start: Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Issue {
    pub id: String,
    pub title: String,
    pub weight: Option<f64>,
    pub created_at: Option<Timestamp>,
    pub closed_at: Option<Timestamp>,
    /// Project the issue lives in, when the source exposes it
    pub project: Option<String>,
    pub iteration: Option<IssueIteration>,
    /// Assignee usernames in delivery order, without duplicates
    pub assignees: Vec<String>,
    pub time_logs: Vec<TimeLogEntry>,
    pub blocked_by: Vec<IssueRef>,
}

impl Issue {
    /// Minimal open issue, convenient for building fixtures
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            weight: None,
            created_at: None,
            closed_at: None,
            project: None,
            iteration: None,
            assignees: Vec::new(),
            time_logs: Vec::new(),
            blocked_by: Vec::new(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.closed_at.is_none()
    }

    /// Add assignees, dropping duplicates while keeping first-seen order
    pub fn with_assignees<I, S>(mut self, usernames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in usernames {
            let name = name.into();
            if !self.assignees.contains(&name) {
                self.assignees.push(name);
            }
        }
        self
    }

    pub fn with_time_log(mut self, entry: TimeLogEntry) -> Self {
        self.time_logs.push(entry);
        self
    }

    pub fn blocked_by(mut self, blocker: IssueRef) -> Self {
        self.blocked_by.push(blocker);
        self
    }

    pub fn iteration_label(&self) -> Option<&str> {
        self.iteration.as_ref().map(|it| it.label.as_str())
    }
}

/// CI pipeline outcome as reported by the tracker
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineStatus {
    Created,
    WaitingForResource,
    Preparing,
    Pending,
    Running,
    Success,
    Failed,
    Canceled,
    Skipped,
    Manual,
    Scheduled,
    Other(String),
}

impl PipelineStatus {
    /// Parse the GraphQL enum name; unknown names are kept verbatim
    pub fn from_api(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "CREATED" => Self::Created,
            "WAITING_FOR_RESOURCE" => Self::WaitingForResource,
            "PREPARING" => Self::Preparing,
            "PENDING" => Self::Pending,
            "RUNNING" => Self::Running,
            "SUCCESS" => Self::Success,
            "FAILED" => Self::Failed,
            "CANCELED" => Self::Canceled,
            "SKIPPED" => Self::Skipped,
            "MANUAL" => Self::Manual,
            "SCHEDULED" => Self::Scheduled,
            _ => Self::Other(raw.to_string()),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergeRequest {
    pub title: String,
    pub created_at: Timestamp,
    pub merged_at: Option<Timestamp>,
    pub note_count: usize,
    pub approval_count: usize,
    pub pipeline_statuses: Vec<PipelineStatus>,
}

impl MergeRequest {
    pub fn failed_pipelines(&self) -> usize {
        self.pipeline_statuses.iter().filter(|s| s.is_failed()).count()
    }

    /// Hours from creation to merge, clamped at zero; `None` while unmerged
    pub fn merge_duration_hours(&self) -> Option<f64> {
        self.merged_at
            .map(|merged| crate::timestamp::hours_between(self.created_at, merged).max(0.0))
    }
}
