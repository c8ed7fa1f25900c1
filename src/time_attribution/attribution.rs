// Time attribution against iteration windows
//
// Distributes logged seconds across members and iterations. Issues with
// assignees split every entry evenly between them; unassigned issues credit
// the person who logged the time.

use crate::interval_index::IntervalIndex;
use crate::model::{Issue, TimeLogEntry};
use std::collections::BTreeMap;
use std::fmt;

/// Seconds keyed by member, then by iteration label
pub type MemberIntervalSeconds = BTreeMap<String, BTreeMap<String, f64>>;

/// Result of one attribution pass
///
/// All values are raw seconds. Conversion to hours is a presentation concern
/// (see [`crate::report::format_hours`]).
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct TimeAttribution {
    /// member → iteration label → seconds
    pub per_member: MemberIntervalSeconds,

    /// iteration label → seconds
    pub per_interval: BTreeMap<String, f64>,

    /// Every logged second, counted once, matched to a window or not
    pub total_seconds: f64,

    /// Seconds whose timestamp fell outside every window
    pub unmatched_seconds: f64,

    /// Issues carrying at least one time-log entry
    pub issues_with_logs_count: usize,
}

impl TimeAttribution {
    /// Time was logged but no window overlapped any of it
    pub fn is_empty_interval_set(&self) -> bool {
        self.total_seconds > 0.0 && self.per_interval.is_empty()
    }

    pub fn member_seconds(&self, member: &str, label: &str) -> f64 {
        self.per_member
            .get(member)
            .and_then(|by_label| by_label.get(label))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn interval_seconds(&self, label: &str) -> f64 {
        self.per_interval.get(label).copied().unwrap_or(0.0)
    }
}

impl fmt::Display for TimeAttribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.2}h logged across {} issues ({} iterations, {} members, {:.2}h outside any iteration)",
            self.total_seconds / 3600.0,
            self.issues_with_logs_count,
            self.per_interval.len(),
            self.per_member.len(),
            self.unmatched_seconds / 3600.0
        )
    }
}

/// Members credited for one entry, with their share in seconds
///
/// Shares always sum to `entry.seconds` (within floating-point error).
pub(crate) fn contributors<'a>(issue: &'a Issue, entry: &'a TimeLogEntry) -> Vec<(&'a str, f64)> {
    if issue.assignees.is_empty() {
        vec![(entry.owner_username.as_str(), entry.seconds)]
    } else {
        let share = entry.seconds / issue.assignees.len() as f64;
        issue
            .assignees
            .iter()
            .map(|name| (name.as_str(), share))
            .collect()
    }
}

/// Attribute logged time to members and iterations
///
/// An entry matching several (overlapping) windows is counted once per
/// window. An entry matching none still counts toward `total_seconds`.
///
/// # Example
/// ```
/// use sprintlens::interval_index::IntervalIndex;
/// use sprintlens::model::{Interval, Issue, TimeLogEntry};
/// use sprintlens::time_attribution::attribute;
/// use sprintlens::timestamp::parse_timestamp;
///
/// let index = IntervalIndex::build(vec![Interval::new(
///     "it-1", Some("S1"), None,
///     parse_timestamp("2024-01-01"), parse_timestamp("2024-01-14"),
/// )]);
/// let issue = Issue::new("gid://gitlab/Issue/1", "Login page")
///     .with_assignees(["alice", "bob"])
///     .with_time_log(TimeLogEntry {
///         seconds: 7200.0,
///         logged_at: parse_timestamp("2024-01-05").unwrap(),
///         owner_username: "alice".to_string(),
///     });
///
/// let result = attribute(&[issue], &index);
/// assert_eq!(result.member_seconds("alice", "S1"), 3600.0);
/// assert_eq!(result.member_seconds("bob", "S1"), 3600.0);
/// assert_eq!(result.interval_seconds("S1"), 7200.0);
/// ```
pub fn attribute(issues: &[Issue], index: &IntervalIndex) -> TimeAttribution {
    let mut result = TimeAttribution::default();

    for issue in issues {
        if !issue.time_logs.is_empty() {
            result.issues_with_logs_count += 1;
        }

        for entry in &issue.time_logs {
            result.total_seconds += entry.seconds;

            let windows = index.windows_containing(entry.logged_at);
            if windows.is_empty() {
                result.unmatched_seconds += entry.seconds;
                continue;
            }

            let shares = contributors(issue, entry);
            for window in windows {
                *result
                    .per_interval
                    .entry(window.label.clone())
                    .or_default() += entry.seconds;

                for &(member, seconds) in &shares {
                    *result
                        .per_member
                        .entry(member.to_string())
                        .or_default()
                        .entry(window.label.clone())
                        .or_default() += seconds;
                }
            }
        }
    }

    if result.is_empty_interval_set() {
        tracing::warn!(
            "no iteration overlaps any of the {:.0}s of logged time",
            result.total_seconds
        );
    }

    tracing::debug!("time attribution: {}", result);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Interval;
    use crate::timestamp::{parse_timestamp, Timestamp};

    fn ts(raw: &str) -> Timestamp {
        parse_timestamp(raw).unwrap()
    }

    fn log(seconds: f64, at: &str, owner: &str) -> TimeLogEntry {
        TimeLogEntry {
            seconds,
            logged_at: ts(at),
            owner_username: owner.to_string(),
        }
    }

    fn sprint(label: &str, start: &str, end: &str) -> Interval {
        Interval::new(label, Some(label), None, Some(ts(start)), Some(ts(end)))
    }

    #[test]
    fn test_split_between_assignees() {
        let index = IntervalIndex::build(vec![sprint("S1", "2024-01-01", "2024-01-14")]);
        let issue = Issue::new("gid://gitlab/Issue/1", "A")
            .with_assignees(["alice", "bob", "carol"])
            .with_time_log(log(900.0, "2024-01-03", "alice"));

        let result = attribute(&[issue], &index);

        assert_eq!(result.member_seconds("alice", "S1"), 300.0);
        assert_eq!(result.member_seconds("bob", "S1"), 300.0);
        assert_eq!(result.member_seconds("carol", "S1"), 300.0);
        assert_eq!(result.interval_seconds("S1"), 900.0);
    }

    #[test]
    fn test_unassigned_credits_owner() {
        let index = IntervalIndex::build(vec![sprint("S1", "2024-01-01", "2024-01-14")]);
        let issue = Issue::new("gid://gitlab/Issue/1", "A")
            .with_time_log(log(1800.0, "2024-01-03", "dave"))
            .with_time_log(log(600.0, "2024-01-04", "erin"));

        let result = attribute(&[issue], &index);

        assert_eq!(result.member_seconds("dave", "S1"), 1800.0);
        assert_eq!(result.member_seconds("erin", "S1"), 600.0);
        assert_eq!(result.per_member.len(), 2);
    }

    #[test]
    fn test_overlapping_windows_double_count() {
        let index = IntervalIndex::build(vec![
            sprint("S1", "2024-01-01", "2024-01-14"),
            sprint("S1b", "2024-01-10", "2024-01-24"),
        ]);
        let issue = Issue::new("gid://gitlab/Issue/1", "A")
            .with_assignees(["alice"])
            .with_time_log(log(3600.0, "2024-01-12", "alice"));

        let result = attribute(&[issue], &index);

        assert_eq!(result.interval_seconds("S1"), 3600.0);
        assert_eq!(result.interval_seconds("S1b"), 3600.0);
        assert_eq!(result.total_seconds, 3600.0);
    }

    #[test]
    fn test_unmatched_entry_counts_toward_total_only() {
        let index = IntervalIndex::build(vec![sprint("S1", "2024-01-01", "2024-01-14")]);
        let issue = Issue::new("gid://gitlab/Issue/1", "A")
            .with_assignees(["alice"])
            .with_time_log(log(3600.0, "2024-01-05", "alice"))
            .with_time_log(log(1200.0, "2024-03-01", "alice"));

        let result = attribute(&[issue], &index);

        assert_eq!(result.total_seconds, 4800.0);
        assert_eq!(result.unmatched_seconds, 1200.0);
        assert_eq!(result.interval_seconds("S1"), 3600.0);
        assert!(!result.is_empty_interval_set());
    }

    #[test]
    fn test_issues_with_logs_count_ignores_windows() {
        let index = IntervalIndex::build(vec![]);
        let issues = vec![
            Issue::new("gid://gitlab/Issue/1", "A").with_time_log(log(60.0, "2024-01-05", "a")),
            Issue::new("gid://gitlab/Issue/2", "B"),
            Issue::new("gid://gitlab/Issue/3", "C").with_time_log(log(60.0, "2025-01-05", "c")),
        ];

        let result = attribute(&issues, &index);

        assert_eq!(result.issues_with_logs_count, 2);
        assert!(result.is_empty_interval_set());
        assert!(result.per_interval.is_empty());
        assert!(result.per_member.is_empty());
    }

    #[test]
    fn test_empty_input() {
        let index = IntervalIndex::build(vec![sprint("S1", "2024-01-01", "2024-01-14")]);
        let result = attribute(&[], &index);
        assert_eq!(result, TimeAttribution::default());
        assert!(!result.is_empty_interval_set());
    }

    #[test]
    fn test_display() {
        let index = IntervalIndex::build(vec![sprint("S1", "2024-01-01", "2024-01-14")]);
        let issue = Issue::new("gid://gitlab/Issue/1", "A")
            .with_time_log(log(7200.0, "2024-01-05", "alice"));
        let text = attribute(&[issue], &index).to_string();
        assert!(text.starts_with("2.00h logged across 1 issues"));
    }
}
