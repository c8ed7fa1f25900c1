//! Interval index: which iteration window(s) contain a timestamp
//!
//! Windows keep their definition order. Overlapping source data is allowed,
//! so a lookup returns every matching window; consumers that need a single
//! window take the first match.

use crate::model::Interval;
use crate::timestamp::Timestamp;
use std::collections::HashMap;

/// Lookup over a fixed set of iteration windows
#[derive(Debug, Clone, Default)]
pub struct IntervalIndex {
    /// All intervals in definition order, bounded or not
    intervals: Vec<Interval>,

    /// Positions of intervals with both ends present
    bounded: Vec<usize>,

    /// Opaque id → position
    by_id: HashMap<String, usize>,
}

impl IntervalIndex {
    /// Build the index from intervals in definition order
    ///
    /// # Example
    /// ```
    /// use sprintlens::interval_index::IntervalIndex;
    /// use sprintlens::model::Interval;
    /// use sprintlens::timestamp::parse_timestamp;
    ///
    /// let s1 = Interval::new(
    ///     "it-1", Some("S1"), None,
    ///     parse_timestamp("2024-01-01"), parse_timestamp("2024-01-14"),
    /// );
    /// let index = IntervalIndex::build(vec![s1]);
    ///
    /// let hits = index.windows_containing(parse_timestamp("2024-01-05").unwrap());
    /// assert_eq!(hits.len(), 1);
    /// assert_eq!(hits[0].label, "S1");
    /// ```
    pub fn build(intervals: Vec<Interval>) -> Self {
        let mut bounded = Vec::new();
        let mut by_id = HashMap::new();

        for (pos, interval) in intervals.iter().enumerate() {
            if interval.is_bounded() {
                bounded.push(pos);
            } else {
                tracing::debug!(
                    "interval '{}' has no start or end; excluded from matching",
                    interval.label
                );
            }
            by_id.entry(interval.id.clone()).or_insert(pos);
        }

        Self {
            intervals,
            bounded,
            by_id,
        }
    }

    /// Build the index after dropping intervals whose id is in `excluded`
    pub fn build_excluding(intervals: Vec<Interval>, excluded: &[String]) -> Self {
        let kept = intervals
            .into_iter()
            .filter(|interval| !excluded.contains(&interval.id))
            .collect();
        Self::build(kept)
    }

    /// Every window containing `t`, in definition order
    pub fn windows_containing(&self, t: Timestamp) -> Vec<&Interval> {
        self.bounded
            .iter()
            .map(|&pos| &self.intervals[pos])
            .filter(|interval| interval.contains(t))
            .collect()
    }

    /// First window (definition order) containing `t`
    pub fn first_containing(&self, t: Timestamp) -> Option<&Interval> {
        self.first_position(t).map(|pos| &self.intervals[pos])
    }

    /// Definition-order position of the first window containing `t`
    pub fn first_position(&self, t: Timestamp) -> Option<usize> {
        self.bounded
            .iter()
            .copied()
            .find(|&pos| self.intervals[pos].contains(t))
    }

    pub fn get(&self, id: &str) -> Option<&Interval> {
        self.by_id.get(id).map(|&pos| &self.intervals[pos])
    }

    /// All intervals in definition order, including unbounded ones
    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn bounded_count(&self) -> usize {
        self.bounded.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timestamp::parse_timestamp;

    fn ts(raw: &str) -> Timestamp {
        parse_timestamp(raw).unwrap()
    }

    fn interval(id: &str, label: &str, start: &str, end: &str) -> Interval {
        Interval::new(id, Some(label), None, Some(ts(start)), Some(ts(end)))
    }

    #[test]
    fn test_empty_index() {
        let index = IntervalIndex::build(vec![]);
        assert!(index.is_empty());
        assert!(index.windows_containing(ts("2024-01-01")).is_empty());
        assert!(index.first_containing(ts("2024-01-01")).is_none());
    }

    #[test]
    fn test_overlapping_windows_all_returned() {
        let index = IntervalIndex::build(vec![
            interval("a", "A", "2024-01-01", "2024-01-14"),
            interval("b", "B", "2024-01-10", "2024-01-24"),
            interval("c", "C", "2024-02-01", "2024-02-14"),
        ]);

        let hits: Vec<&str> = index
            .windows_containing(ts("2024-01-12"))
            .iter()
            .map(|i| i.label.as_str())
            .collect();
        assert_eq!(hits, vec!["A", "B"]);

        assert_eq!(index.first_containing(ts("2024-01-12")).unwrap().label, "A");
    }

    #[test]
    fn test_boundaries_inclusive() {
        let index = IntervalIndex::build(vec![interval("a", "A", "2024-01-01", "2024-01-14")]);
        assert_eq!(index.windows_containing(ts("2024-01-01")).len(), 1);
        assert_eq!(index.windows_containing(ts("2024-01-14")).len(), 1);
        assert!(index.windows_containing(ts("2024-01-15")).is_empty());
    }

    #[test]
    fn test_unbounded_interval_skipped() {
        let open = Interval::new("open", Some("Open"), None, Some(ts("2024-01-01")), None);
        let bounded = interval("a", "A", "2024-01-01", "2024-01-14");
        let index = IntervalIndex::build(vec![open, bounded]);

        assert_eq!(index.len(), 2);
        assert_eq!(index.bounded_count(), 1);
        let hits = index.windows_containing(ts("2024-01-02"));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].label, "A");
    }

    #[test]
    fn test_build_excluding() {
        let index = IntervalIndex::build_excluding(
            vec![
                interval("gid://gitlab/Iteration/60", "Old", "2024-01-01", "2024-01-14"),
                interval("gid://gitlab/Iteration/61", "New", "2024-01-01", "2024-01-14"),
            ],
            &["gid://gitlab/Iteration/60".to_string()],
        );
        assert_eq!(index.len(), 1);
        assert!(index.get("gid://gitlab/Iteration/60").is_none());
        assert_eq!(index.get("gid://gitlab/Iteration/61").unwrap().label, "New");
    }
}
