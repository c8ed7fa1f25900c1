// Sprint load: estimated weight vs logged time per scheduled iteration
//
// Unlike window attribution, an issue's time counts toward the iteration it
// is scheduled in, whenever the time was logged.

use crate::interval_index::IntervalIndex;
use crate::model::Issue;
use std::collections::HashMap;

/// Planned weight and logged seconds of one iteration
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct SprintLoad {
    pub label: String,
    pub total_weight: f64,
    pub total_seconds: f64,
}

/// Sum weights and logged seconds per scheduled iteration
///
/// Every indexed iteration gets a row, even with no issues. Issues scheduled
/// in an iteration the index does not know (e.g. an excluded one) are
/// ignored. Rows are ordered by iteration start; undated iterations last.
pub fn sprint_load(issues: &[Issue], index: &IntervalIndex) -> Vec<SprintLoad> {
    let mut totals: HashMap<&str, (f64, f64)> = HashMap::new();

    for issue in issues {
        let Some(iteration) = &issue.iteration else {
            continue;
        };
        if index.get(&iteration.id).is_none() {
            continue;
        }

        let slot = totals.entry(iteration.id.as_str()).or_default();
        slot.0 += issue.weight.unwrap_or(0.0);
        slot.1 += issue.time_logs.iter().map(|log| log.seconds).sum::<f64>();
    }

    let mut intervals: Vec<_> = index.intervals().iter().collect();
    // Undated iterations go last
    intervals.sort_by(|a, b| match (a.start, b.start) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });

    intervals
        .into_iter()
        .map(|interval| {
            let (total_weight, total_seconds) =
                totals.get(interval.id.as_str()).copied().unwrap_or_default();
            SprintLoad {
                label: interval.label.clone(),
                total_weight,
                total_seconds,
            }
        })
        .collect()
}
