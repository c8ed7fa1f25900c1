//! Report assembly and rendering
//!
//! Runs the selected engines over one [`Dataset`] and renders the result as
//! plain text or JSON. All engine outputs stay in seconds; hours appear only
//! here, through [`format_hours`].

use crate::config::Config;
use crate::cycle_time::{cycle_times, CycleTimeRow};
use crate::dependency_graph::{DependencyGraph, IntervalSelection};
use crate::error::{Result, SkipReport};
use crate::interval_index::IntervalIndex;
use crate::layering::{layer_graph, LayeredGraph};
use crate::merge_metrics::{aggregate, merge_request_rows, MergeMetrics, MergeRequestRow};
use crate::palette::ColorMap;
use crate::source::Dataset;
use crate::time_attribution::{
    attribute, member_totals, sprint_load, MemberTotal, SprintLoad, TimeAttribution,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Seconds as hours with two decimals
///
/// ```
/// use sprintlens::report::format_hours;
///
/// assert_eq!(format_hours(5400.0), "1.50");
/// assert_eq!(format_hours(0.0), "0.00");
/// ```
pub fn format_hours(seconds: f64) -> String {
    format!("{:.2}", seconds / 3600.0)
}

/// Report sections that can be requested independently
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Summary,
    Members,
    Sprints,
    Merges,
    CycleTime,
    Graph,
}

impl Section {
    pub const ALL: [Section; 6] = [
        Section::Summary,
        Section::Members,
        Section::Sprints,
        Section::Merges,
        Section::CycleTime,
        Section::Graph,
    ];
}

/// Headline numbers of the dashboard
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub total_hours: f64,
    pub issues_logged: usize,
    pub total_issues: usize,
    /// Time was logged but no iteration window covers any of it
    pub empty_interval_set: bool,
}

impl DashboardSummary {
    pub fn new(attribution: &TimeAttribution, total_issues: usize) -> Self {
        Self {
            total_hours: attribution.total_seconds / 3600.0,
            issues_logged: attribution.issues_with_logs_count,
            total_issues,
            empty_interval_set: attribution.is_empty_interval_set(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MembersSection {
    /// All logged time, ignoring iteration windows
    pub totals: Vec<MemberTotal>,
    /// member → iteration label → seconds
    pub per_iteration: BTreeMap<String, BTreeMap<String, f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SprintsSection {
    /// Seconds logged inside each iteration window
    pub logged: Vec<(String, f64)>,
    pub load: Vec<SprintLoad>,
    pub unmatched_seconds: f64,
    pub empty_interval_set: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergesSection {
    pub metrics: MergeMetrics,
    pub merge_requests: Vec<MergeRequestRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphSection {
    #[serde(flatten)]
    pub graph: LayeredGraph,
    /// project → color
    pub colors: BTreeMap<String, String>,
}

/// Everything requested for one run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub version: String,
    pub format: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<DashboardSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub members: Option<MembersSection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sprints: Option<SprintsSection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merges: Option<MergesSection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cycle_time: Option<Vec<CycleTimeRow>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graph: Option<GraphSection>,
    pub skipped: SkipReport,
}

impl Report {
    /// Run the engines behind `sections` over `dataset`
    ///
    /// # Errors
    ///
    /// Fails only when the graph section is requested and the dependency
    /// graph cannot be built or layered.
    pub fn build(
        dataset: &Dataset,
        config: &Config,
        sections: &[Section],
        selection: &IntervalSelection,
    ) -> Result<Self> {
        let wants = |section: Section| sections.contains(&section);
        let index =
            IntervalIndex::build_excluding(dataset.intervals.clone(), &config.excluded_iterations);

        let mut report = Report {
            version: env!("CARGO_PKG_VERSION").to_string(),
            format: "sprintlens-json-v1".to_string(),
            summary: None,
            members: None,
            sprints: None,
            merges: None,
            cycle_time: None,
            graph: None,
            skipped: dataset.skipped.clone(),
        };

        if wants(Section::Summary) || wants(Section::Members) || wants(Section::Sprints) {
            let attribution = attribute(&dataset.issues, &index);

            if wants(Section::Summary) {
                report.summary = Some(DashboardSummary::new(&attribution, dataset.issues.len()));
            }
            if wants(Section::Sprints) {
                // Definition order, not label order
                let mut logged: Vec<(String, f64)> = Vec::new();
                for interval in index.intervals() {
                    let Some(&seconds) = attribution.per_interval.get(&interval.label) else {
                        continue;
                    };
                    if !logged.iter().any(|(label, _)| *label == interval.label) {
                        logged.push((interval.label.clone(), seconds));
                    }
                }
                report.sprints = Some(SprintsSection {
                    logged,
                    load: sprint_load(&dataset.issues, &index),
                    unmatched_seconds: attribution.unmatched_seconds,
                    empty_interval_set: attribution.is_empty_interval_set(),
                });
            }
            if wants(Section::Members) {
                report.members = Some(MembersSection {
                    totals: member_totals(&dataset.issues),
                    per_iteration: attribution.per_member,
                });
            }
        }

        if wants(Section::Merges) {
            report.merges = Some(MergesSection {
                metrics: aggregate(&dataset.merge_requests, &index),
                merge_requests: merge_request_rows(&dataset.merge_requests),
            });
        }

        if wants(Section::CycleTime) {
            report.cycle_time = Some(cycle_times(&dataset.issues, &index));
        }

        if wants(Section::Graph) {
            let graph = DependencyGraph::build(&dataset.issues, selection)?;
            report.skipped.merge(graph.skipped.clone());

            let layered = layer_graph(&graph, &config.layout.canvas(), config.layout.max_nodes)?;
            let colors = ColorMap::build(
                layered.nodes.iter().filter_map(|n| n.project.as_deref()),
                &config.palette.colors,
            );
            report.graph = Some(GraphSection {
                colors: colors
                    .entries()
                    .map(|(p, c)| (p.to_string(), c.to_string()))
                    .collect(),
                graph: layered,
            });
        }

        Ok(report)
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(summary) = &self.summary {
            writeln!(f, "=== Summary ===")?;
            writeln!(f, "Total hours logged:  {:.2}", summary.total_hours)?;
            writeln!(f, "Issues with logs:    {}", summary.issues_logged)?;
            writeln!(f, "Total issues:        {}", summary.total_issues)?;
            if summary.empty_interval_set {
                writeln!(f, "Warning: no iteration covers any logged time")?;
            }
            writeln!(f)?;
        }

        if let Some(members) = &self.members {
            writeln!(f, "=== Hours per Member ===")?;
            if members.totals.is_empty() {
                writeln!(f, "No time logged.")?;
            }
            for total in &members.totals {
                writeln!(f, "{:<24} {:>10}", total.username, format_hours(total.seconds))?;
            }
            for (member, by_label) in &members.per_iteration {
                writeln!(f, "{}:", member)?;
                for (label, seconds) in by_label {
                    writeln!(f, "  {:<22} {:>10}", label, format_hours(*seconds))?;
                }
            }
            writeln!(f)?;
        }

        if let Some(sprints) = &self.sprints {
            writeln!(f, "=== Sprints ===")?;
            writeln!(
                f,
                "{:<24} {:>10} {:>10} {:>10}",
                "iteration", "logged h", "weight", "total h"
            )?;
            for load in &sprints.load {
                let logged = sprints
                    .logged
                    .iter()
                    .find(|(label, _)| *label == load.label)
                    .map(|(_, seconds)| *seconds)
                    .unwrap_or(0.0);
                writeln!(
                    f,
                    "{:<24} {:>10} {:>10} {:>10}",
                    load.label,
                    format_hours(logged),
                    load.total_weight,
                    format_hours(load.total_seconds)
                )?;
            }
            if sprints.empty_interval_set {
                writeln!(f, "No iteration covers any logged time.")?;
            }
            if sprints.unmatched_seconds > 0.0 {
                writeln!(
                    f,
                    "{} h logged outside every iteration",
                    format_hours(sprints.unmatched_seconds)
                )?;
            }
            writeln!(f)?;
        }

        if let Some(merges) = &self.merges {
            writeln!(f, "=== Merge Requests ===")?;
            writeln!(
                f,
                "{:<24} {:>6} {:>10} {:>10} {:>10}",
                "iteration", "count", "comments", "failures", "merge h"
            )?;
            for (label, stats) in &merges.metrics.per_interval {
                let duration = merges
                    .metrics
                    .avg_merge_duration_hours(label)
                    .map(|h| format!("{:.2}", h))
                    .unwrap_or_else(|| "-".to_string());
                writeln!(
                    f,
                    "{:<24} {:>6} {:>10.2} {:>10.2} {:>10}",
                    label, stats.count, stats.avg_comments, stats.avg_pipeline_failures, duration
                )?;
            }
            if merges.metrics.unassigned > 0 {
                writeln!(
                    f,
                    "{} merge requests outside every iteration",
                    merges.metrics.unassigned
                )?;
            }
            writeln!(f)?;
            for row in &merges.merge_requests {
                let duration = row
                    .merge_duration_hours
                    .map(|h| format!("{:.2}h", h))
                    .unwrap_or_else(|| "open".to_string());
                writeln!(
                    f,
                    "{}  {:<40} {:>8} {:>3} approvals {:>3} comments",
                    row.created_at.format("%Y-%m-%d"),
                    row.title,
                    duration,
                    row.approvals,
                    row.comments
                )?;
            }
            writeln!(f)?;
        }

        if let Some(rows) = &self.cycle_time {
            writeln!(f, "=== Cycle Time ===")?;
            writeln!(f, "{:<24} {:>10} {:>10} {:>6}", "iteration", "lead h", "cycle h", "issues")?;
            for row in rows {
                writeln!(
                    f,
                    "{:<24} {:>10.2} {:>10.2} {:>6}",
                    row.label, row.avg_lead_hours, row.avg_cycle_hours, row.issues_count
                )?;
            }
            writeln!(f)?;
        }

        if let Some(section) = &self.graph {
            let graph = &section.graph;
            writeln!(f, "=== Dependency Graph ===")?;
            writeln!(
                f,
                "{} nodes, {} edges, {} levels",
                graph.nodes.len(),
                graph.edges.len(),
                if graph.nodes.is_empty() { 0 } else { graph.max_level + 1 }
            )?;
            for node in &graph.nodes {
                writeln!(
                    f,
                    "  L{} #{:<8} ({:>7.1}, {:>7.1}) {}",
                    node.level, node.id, node.x, node.y, node.label
                )?;
            }
            for edge in &graph.edges {
                writeln!(f, "  #{} blocks #{}", edge.source, edge.target)?;
            }
            if graph.has_cycles() {
                let ids: Vec<String> = graph.stalled.iter().map(|id| format!("#{}", id)).collect();
                writeln!(f, "Warning: dependency cycle involving {}", ids.join(", "))?;
            }
            writeln!(f)?;
        }

        if !self.skipped.is_empty() {
            writeln!(
                f,
                "Note: {} malformed records skipped ({} iterations, {} issues, {} time logs, {} merge requests)",
                self.skipped.total(),
                self.skipped.iterations,
                self.skipped.issues,
                self.skipped.time_logs,
                self.skipped.merge_requests
            )?;
        }

        Ok(())
    }
}
