// Record sources
//
// A source hands over fully-paginated iteration, issue and merge-request
// records. Fetching (GraphQL, pagination, auth) happens before this layer;
// the bundled JsonExportSource reads an export of those responses.

pub mod graphql;

use crate::error::SkipReport;
use crate::model::{Interval, Issue, MergeRequest};
use anyhow::{Context, Result};
use graphql::{Nodes, RawIssue, RawIteration, RawMergeRequest};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

pub use graphql::Converted;

/// Everything one aggregation pass needs
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub intervals: Vec<Interval>,
    pub issues: Vec<Issue>,
    pub merge_requests: Vec<MergeRequest>,
    pub skipped: SkipReport,
}

/// Supplier of already-paginated tracker records
pub trait RecordSource {
    fn iterations(&self) -> Result<Converted<Interval>>;

    fn issues(&self) -> Result<Converted<Issue>>;

    fn merge_requests(&self) -> Result<Converted<MergeRequest>>;

    /// Fetch all three record kinds, folding their skip reports together
    fn load(&self) -> Result<Dataset> {
        let iterations = self.iterations()?;
        let issues = self.issues()?;
        let merge_requests = self.merge_requests()?;

        let mut skipped = iterations.skipped;
        skipped.merge(issues.skipped);
        skipped.merge(merge_requests.skipped);

        if !skipped.is_empty() {
            tracing::warn!(
                "skipped {} malformed records ({} iterations, {} issues, {} time logs, {} merge requests)",
                skipped.total(),
                skipped.iterations,
                skipped.issues,
                skipped.time_logs,
                skipped.merge_requests
            );
        }

        Ok(Dataset {
            intervals: iterations.records,
            issues: issues.records,
            merge_requests: merge_requests.records,
            skipped,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawExport {
    iterations: Nodes<RawIteration>,
    issues: Nodes<RawIssue>,
    merge_requests: Nodes<RawMergeRequest>,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    data: EnvelopeData,
}

#[derive(Debug, Deserialize)]
struct EnvelopeData {
    group: RawExport,
}

/// Reads a JSON export of the group's iterations, issues and merge requests
///
/// Accepts either a flat document
/// `{ "iterations": [...], "issues": [...], "mergeRequests": [...] }`
/// or a raw GraphQL response `{ "data": { "group": { ... } } }`. Each list
/// may be bare or wrapped in `{ "nodes": [...] }`.
#[derive(Debug, Clone, Default)]
pub struct JsonExportSource {
    raw: RawExport,
}

impl JsonExportSource {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read export {}", path.display()))?;

        Self::from_json_str(&content).with_context(|| format!("Invalid export {}", path.display()))
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let value: serde_json::Value =
            serde_json::from_str(content).context("Failed to parse JSON")?;

        let raw = if value.get("data").is_some() {
            let envelope: Envelope =
                serde_json::from_value(value).context("Unexpected GraphQL response shape")?;
            envelope.data.group
        } else {
            serde_json::from_value(value).context("Unexpected export shape")?
        };

        tracing::debug!(
            "export holds {} iterations, {} issues, {} merge requests",
            raw.iterations.len(),
            raw.issues.len(),
            raw.merge_requests.len()
        );
        Ok(Self { raw })
    }

    fn iteration_labels(&self) -> HashMap<String, String> {
        graphql::convert_iterations(&self.raw.iterations)
            .records
            .into_iter()
            .map(|interval| (interval.id, interval.label))
            .collect()
    }
}

impl RecordSource for JsonExportSource {
    fn iterations(&self) -> Result<Converted<Interval>> {
        Ok(graphql::convert_iterations(&self.raw.iterations))
    }

    fn issues(&self) -> Result<Converted<Issue>> {
        Ok(graphql::convert_issues(
            &self.raw.issues,
            &self.iteration_labels(),
        ))
    }

    fn merge_requests(&self) -> Result<Converted<MergeRequest>> {
        Ok(graphql::convert_merge_requests(&self.raw.merge_requests))
    }
}
