//! Error types for the aggregation engines
//!
//! Per-record problems are recovered locally and reported through
//! [`SkipReport`]; structural problems abort the pass with an
//! [`AnalyticsError`].

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Errors surfaced by the aggregation and graph engines
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyticsError {
    #[error("Malformed {kind} record '{id}': {reason}")]
    MalformedRecord {
        kind: RecordKind,
        id: String,
        reason: String,
    },

    #[error("Issue ids '{first}' and '{second}' both map to graph node {node_id}")]
    DataIntegrity {
        first: String,
        second: String,
        node_id: u64,
    },

    #[error("Graph too large to layer: {nodes} nodes exceeds limit of {limit}")]
    GraphTooLarge { nodes: usize, limit: usize },
}

pub type Result<T> = std::result::Result<T, AnalyticsError>;

/// Kind of source record, used in error messages and skip counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Iteration,
    Issue,
    TimeLog,
    MergeRequest,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecordKind::Iteration => "iteration",
            RecordKind::Issue => "issue",
            RecordKind::TimeLog => "time log",
            RecordKind::MergeRequest => "merge request",
        };
        f.write_str(name)
    }
}

/// Records dropped from an aggregation pass because they were malformed
///
/// Skipped records never touch running totals; the caller gets the counts so
/// it can show a degraded-data notice.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SkipReport {
    pub iterations: usize,
    pub issues: usize,
    pub time_logs: usize,
    pub merge_requests: usize,
    #[serde(skip)]
    pub errors: Vec<AnalyticsError>,
}

impl SkipReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a skipped record and keep the error for diagnostics
    pub fn record(&mut self, error: AnalyticsError) {
        if let AnalyticsError::MalformedRecord { kind, .. } = &error {
            match kind {
                RecordKind::Iteration => self.iterations += 1,
                RecordKind::Issue => self.issues += 1,
                RecordKind::TimeLog => self.time_logs += 1,
                RecordKind::MergeRequest => self.merge_requests += 1,
            }
        }
        tracing::debug!("skipping record: {}", error);
        self.errors.push(error);
    }

    pub fn total(&self) -> usize {
        self.iterations + self.issues + self.time_logs + self.merge_requests
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Fold another report into this one
    pub fn merge(&mut self, other: SkipReport) {
        self.iterations += other.iterations;
        self.issues += other.issues;
        self.time_logs += other.time_logs;
        self.merge_requests += other.merge_requests;
        self.errors.extend(other.errors);
    }
}

pub(crate) fn malformed(kind: RecordKind, id: &str, reason: impl Into<String>) -> AnalyticsError {
    AnalyticsError::MalformedRecord {
        kind,
        id: id.to_string(),
        reason: reason.into(),
    }
}
