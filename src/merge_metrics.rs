//! Merge request quality metrics per iteration
//!
//! Each merge request belongs to at most one iteration: the first one (in
//! definition order) whose window contains its creation time. Time logs may
//! land in several overlapping windows, merge requests never do.

use crate::interval_index::IntervalIndex;
use crate::model::MergeRequest;
use crate::timestamp::Timestamp;
use serde::Serialize;
use std::collections::HashMap;

/// Averages for the merge requests created in one iteration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntervalMergeStats {
    pub count: usize,
    pub avg_comments: f64,
    pub avg_pipeline_failures: f64,
}

/// Merge metrics keyed by iteration label, in iteration definition order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MergeMetrics {
    /// Iterations with at least one merge request
    pub per_interval: Vec<(String, IntervalMergeStats)>,

    /// Average hours from creation to merge; iterations with no merged request are absent
    pub per_interval_duration: Vec<(String, f64)>,

    /// Merge requests created outside every window
    pub unassigned: usize,
}

impl MergeMetrics {
    pub fn stats(&self, label: &str) -> Option<&IntervalMergeStats> {
        self.per_interval
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, stats)| stats)
    }

    pub fn avg_merge_duration_hours(&self, label: &str) -> Option<f64> {
        self.per_interval_duration
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, hours)| *hours)
    }
}

#[derive(Default)]
struct Accumulator {
    count: usize,
    comments: usize,
    pipeline_failures: usize,
    merge_hours: f64,
    merged: usize,
}

/// Aggregate merge request metrics per iteration
///
/// # Example
/// ```
/// use sprintlens::interval_index::IntervalIndex;
/// use sprintlens::merge_metrics::aggregate;
/// use sprintlens::model::{Interval, MergeRequest, PipelineStatus};
/// use sprintlens::timestamp::parse_timestamp;
///
/// let index = IntervalIndex::build(vec![Interval::new(
///     "it-1", Some("S1"), None,
///     parse_timestamp("2024-01-01"), parse_timestamp("2024-01-14"),
/// )]);
/// let mr = MergeRequest {
///     title: "Cache tokens".to_string(),
///     created_at: parse_timestamp("2024-01-02").unwrap(),
///     merged_at: parse_timestamp("2024-01-04"),
///     note_count: 3,
///     approval_count: 1,
///     pipeline_statuses: vec![PipelineStatus::Failed, PipelineStatus::Success],
/// };
///
/// let metrics = aggregate(&[mr], &index);
/// let s1 = metrics.stats("S1").unwrap();
/// assert_eq!(s1.avg_comments, 3.0);
/// assert_eq!(s1.avg_pipeline_failures, 1.0);
/// assert_eq!(metrics.avg_merge_duration_hours("S1"), Some(48.0));
/// ```
pub fn aggregate(mrs: &[MergeRequest], index: &IntervalIndex) -> MergeMetrics {
    // Keyed by position so same-titled iterations stay distinct until output
    let mut by_position: HashMap<usize, Accumulator> = HashMap::new();
    let mut unassigned = 0;

    for mr in mrs {
        let Some(position) = index.first_position(mr.created_at) else {
            unassigned += 1;
            continue;
        };

        let acc = by_position.entry(position).or_default();
        acc.count += 1;
        acc.comments += mr.note_count;
        acc.pipeline_failures += mr.failed_pipelines();
        if let Some(hours) = mr.merge_duration_hours() {
            acc.merge_hours += hours;
            acc.merged += 1;
        }
    }

    let mut metrics = MergeMetrics {
        unassigned,
        ..MergeMetrics::default()
    };

    for (position, interval) in index.intervals().iter().enumerate() {
        let Some(acc) = by_position.get(&position) else {
            continue;
        };

        if acc.count > 0 {
            metrics.per_interval.push((
                interval.label.clone(),
                IntervalMergeStats {
                    count: acc.count,
                    avg_comments: acc.comments as f64 / acc.count as f64,
                    avg_pipeline_failures: acc.pipeline_failures as f64 / acc.count as f64,
                },
            ));
        }
        if acc.merged > 0 {
            metrics
                .per_interval_duration
                .push((interval.label.clone(), acc.merge_hours / acc.merged as f64));
        }
    }

    tracing::debug!(
        "merge metrics: {} iterations with merge requests, {} unassigned",
        metrics.per_interval.len(),
        metrics.unassigned
    );
    metrics
}

/// One row of the merge request table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergeRequestRow {
    pub title: String,
    pub created_at: Timestamp,
    /// `None` for requests that are not merged yet
    pub merge_duration_hours: Option<f64>,
    pub approvals: usize,
    pub comments: usize,
}

/// Table rows for every merge request, newest first
pub fn merge_request_rows(mrs: &[MergeRequest]) -> Vec<MergeRequestRow> {
    let mut rows: Vec<MergeRequestRow> = mrs
        .iter()
        .map(|mr| MergeRequestRow {
            title: mr.title.clone(),
            created_at: mr.created_at,
            merge_duration_hours: mr.merge_duration_hours(),
            approvals: mr.approval_count,
            comments: mr.note_count,
        })
        .collect();

    rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Interval, PipelineStatus};
    use crate::timestamp::parse_timestamp;

    fn ts(raw: &str) -> Timestamp {
        parse_timestamp(raw).unwrap()
    }

    fn mr(created: &str, merged: Option<&str>, notes: usize, statuses: &[&str]) -> MergeRequest {
        MergeRequest {
            title: format!("MR {}", created),
            created_at: ts(created),
            merged_at: merged.map(ts),
            note_count: notes,
            approval_count: 0,
            pipeline_statuses: statuses.iter().map(|s| PipelineStatus::from_api(s)).collect(),
        }
    }

    fn index() -> IntervalIndex {
        IntervalIndex::build(vec![
            Interval::new("it-1", Some("S1"), None, Some(ts("2024-01-01")), Some(ts("2024-01-14"))),
            Interval::new("it-2", Some("S2"), None, Some(ts("2024-01-10")), Some(ts("2024-01-28"))),
        ])
    }

    #[test]
    fn test_single_merge_request() {
        let merged = mr("2024-01-02", Some("2024-01-04"), 3, &["FAILED", "SUCCESS"]);
        let metrics = aggregate(&[merged], &index());

        let s1 = metrics.stats("S1").unwrap();
        assert_eq!(s1.count, 1);
        assert_eq!(s1.avg_comments, 3.0);
        assert_eq!(s1.avg_pipeline_failures, 1.0);
        assert_eq!(metrics.avg_merge_duration_hours("S1"), Some(48.0));
    }

    #[test]
    fn test_overlap_goes_to_first_interval() {
        // 2024-01-12 is inside both S1 and S2
        let metrics = aggregate(&[mr("2024-01-12", None, 1, &[])], &index());

        assert_eq!(metrics.stats("S1").unwrap().count, 1);
        assert!(metrics.stats("S2").is_none());
    }

    #[test]
    fn test_unmerged_excluded_from_duration_only() {
        let metrics = aggregate(
            &[
                mr("2024-01-02", Some("2024-01-03"), 2, &["FAILED", "FAILED"]),
                mr("2024-01-05", None, 4, &["SUCCESS"]),
                mr("2024-01-20", None, 0, &[]),
            ],
            &index(),
        );

        let s1 = metrics.stats("S1").unwrap();
        assert_eq!(s1.count, 2);
        assert_eq!(s1.avg_comments, 3.0);
        assert_eq!(s1.avg_pipeline_failures, 1.0);
        assert_eq!(metrics.avg_merge_duration_hours("S1"), Some(24.0));

        assert_eq!(metrics.stats("S2").unwrap().count, 1);
        assert_eq!(metrics.avg_merge_duration_hours("S2"), None);
    }

    #[test]
    fn test_outside_windows_unassigned() {
        let metrics = aggregate(&[mr("2023-06-01", Some("2023-06-02"), 1, &[])], &index());
        assert!(metrics.per_interval.is_empty());
        assert!(metrics.per_interval_duration.is_empty());
        assert_eq!(metrics.unassigned, 1);
    }

    #[test]
    fn test_output_in_definition_order() {
        let metrics = aggregate(
            &[mr("2024-01-20", None, 0, &[]), mr("2024-01-02", None, 0, &[])],
            &index(),
        );
        let labels: Vec<&str> = metrics.per_interval.iter().map(|(l, _)| l.as_str()).collect();
        assert_eq!(labels, vec!["S1", "S2"]);
    }

    #[test]
    fn test_aggregate_is_idempotent() {
        let mrs = vec![
            mr("2024-01-02", Some("2024-01-04"), 3, &["FAILED"]),
            mr("2024-01-11", Some("2024-01-12"), 1, &["SUCCESS"]),
        ];
        assert_eq!(aggregate(&mrs, &index()), aggregate(&mrs, &index()));
    }

    #[test]
    fn test_merge_request_rows_newest_first() {
        let rows = merge_request_rows(&[
            mr("2024-01-02", Some("2024-01-04"), 3, &[]),
            mr("2024-01-09", None, 1, &[]),
        ]);
        assert_eq!(rows[0].title, "MR 2024-01-09");
        assert_eq!(rows[0].merge_duration_hours, None);
        assert_eq!(rows[1].merge_duration_hours, Some(48.0));
        assert_eq!(rows[1].comments, 3);
    }
}
