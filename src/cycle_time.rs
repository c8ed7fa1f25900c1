//! Lead and cycle time per iteration
//!
//! Lead time runs from issue creation to close. Cycle time runs from the
//! later of creation and iteration start to close, so work that was sitting
//! in the backlog before the sprint began does not count against it.

use crate::interval_index::IntervalIndex;
use crate::model::Issue;
use crate::timestamp::hours_between;
use serde::Serialize;

/// Average lead and cycle time of the closed issues scheduled in one iteration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleTimeRow {
    pub label: String,
    pub avg_lead_hours: f64,
    pub avg_cycle_hours: f64,
    pub issues_count: usize,
}

/// Compute one row per iteration that has at least one closed issue
///
/// Only issues with both `created_at` and `closed_at` take part. An iteration
/// without a start date uses the creation time as the cycle start.
pub fn cycle_times(issues: &[Issue], index: &IntervalIndex) -> Vec<CycleTimeRow> {
    let mut rows = Vec::new();

    for interval in index.intervals() {
        let mut total_lead = 0.0;
        let mut total_cycle = 0.0;
        let mut count = 0usize;

        let scheduled = issues.iter().filter(|issue| {
            issue
                .iteration
                .as_ref()
                .is_some_and(|it| it.id == interval.id)
        });

        for issue in scheduled {
            let (Some(created), Some(closed)) = (issue.created_at, issue.closed_at) else {
                continue;
            };

            let effective_start = match interval.start {
                Some(start) if start > created => start,
                _ => created,
            };

            total_lead += hours_between(created, closed);
            total_cycle += hours_between(effective_start, closed);
            count += 1;
        }

        if count == 0 {
            continue;
        }

        rows.push(CycleTimeRow {
            label: interval.label.clone(),
            avg_lead_hours: total_lead / count as f64,
            avg_cycle_hours: total_cycle / count as f64,
            issues_count: count,
        });
    }

    rows
}
