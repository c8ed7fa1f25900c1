// Unwindowed member totals
//
// Same split rule as the windowed engine, but every entry counts exactly
// once regardless of iteration windows. Feeds the "hours per member" view.

use crate::model::Issue;
use crate::time_attribution::attribution::contributors;
use std::collections::HashMap;

/// Total seconds credited to one member
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct MemberTotal {
    pub username: String,
    pub seconds: f64,
}

/// Global per-member seconds, sorted by descending total
///
/// Ties keep first-credited order so output is stable across runs.
///
/// # Example
/// ```
/// use sprintlens::model::{Issue, TimeLogEntry};
/// use sprintlens::time_attribution::member_totals;
/// use sprintlens::timestamp::parse_timestamp;
///
/// let issue = Issue::new("gid://gitlab/Issue/7", "Export")
///     .with_assignees(["alice", "bob"])
///     .with_time_log(TimeLogEntry {
///         seconds: 3600.0,
///         logged_at: parse_timestamp("2023-06-01").unwrap(),
///         owner_username: "alice".to_string(),
///     });
///
/// let totals = member_totals(&[issue]);
/// assert_eq!(totals.len(), 2);
/// assert_eq!(totals[0].seconds, 1800.0);
/// ```
pub fn member_totals(issues: &[Issue]) -> Vec<MemberTotal> {
    let mut order: Vec<String> = Vec::new();
    let mut seconds: HashMap<String, f64> = HashMap::new();

    for issue in issues {
        for entry in &issue.time_logs {
            for (member, share) in contributors(issue, entry) {
                if !seconds.contains_key(member) {
                    order.push(member.to_string());
                }
                *seconds.entry(member.to_string()).or_default() += share;
            }
        }
    }

    let mut totals: Vec<MemberTotal> = order
        .into_iter()
        .map(|username| {
            let seconds = seconds.get(&username).copied().unwrap_or(0.0);
            MemberTotal { username, seconds }
        })
        .collect();

    // Stable sort keeps first-credited order for ties
    totals.sort_by(|a, b| b.seconds.total_cmp(&a.seconds));
    totals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TimeLogEntry;
    use crate::timestamp::parse_timestamp;

    fn log(seconds: f64, owner: &str) -> TimeLogEntry {
        TimeLogEntry {
            seconds,
            logged_at: parse_timestamp("2024-01-05").unwrap(),
            owner_username: owner.to_string(),
        }
    }

    #[test]
    fn test_member_totals_sorted_descending() {
        let issues = vec![
            Issue::new("gid://gitlab/Issue/1", "A").with_time_log(log(600.0, "dave")),
            Issue::new("gid://gitlab/Issue/2", "B")
                .with_assignees(["alice"])
                .with_time_log(log(7200.0, "dave")),
        ];

        let totals = member_totals(&issues);
        assert_eq!(totals[0].username, "alice");
        assert_eq!(totals[0].seconds, 7200.0);
        assert_eq!(totals[1].username, "dave");
        assert_eq!(totals[1].seconds, 600.0);
    }

    #[test]
    fn test_member_totals_ties_keep_order() {
        let issues = vec![Issue::new("gid://gitlab/Issue/1", "A")
            .with_assignees(["zoe", "adam"])
            .with_time_log(log(100.0, "zoe"))];

        let totals = member_totals(&issues);
        let names: Vec<&str> = totals.iter().map(|t| t.username.as_str()).collect();
        assert_eq!(names, vec!["zoe", "adam"]);
    }

    #[test]
    fn test_member_totals_empty() {
        assert!(member_totals(&[]).is_empty());
        assert!(member_totals(&[Issue::new("gid://gitlab/Issue/1", "A")]).is_empty());
    }
}
