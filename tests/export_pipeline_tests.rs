//! End-to-end tests: JSON export → engines → report

use sprintlens::config::Config;
use sprintlens::cycle_time::cycle_times;
use sprintlens::dependency_graph::{DependencyGraph, IntervalSelection};
use sprintlens::interval_index::IntervalIndex;
use sprintlens::layering::layer_graph;
use sprintlens::merge_metrics::aggregate;
use sprintlens::report::{Report, Section};
use sprintlens::source::{Dataset, JsonExportSource, RecordSource};
use sprintlens::time_attribution::{attribute, member_totals, sprint_load};

const EXPORT: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/export.json");
const LEGACY: &str = "gid://gitlab/Iteration/60";

fn dataset() -> Dataset {
    JsonExportSource::from_path(EXPORT).unwrap().load().unwrap()
}

fn index_without_legacy(dataset: &Dataset) -> IntervalIndex {
    IntervalIndex::build_excluding(dataset.intervals.clone(), &[LEGACY.to_string()])
}

#[test]
fn test_fixture_loads_cleanly() {
    let dataset = dataset();
    assert_eq!(dataset.intervals.len(), 3);
    assert_eq!(dataset.issues.len(), 5);
    assert_eq!(dataset.merge_requests.len(), 2);
    assert!(dataset.skipped.is_empty());

    // Untitled iteration falls back to its start date
    assert_eq!(dataset.intervals[2].label, "2024-01-15");
    assert_eq!(dataset.issues[2].iteration_label(), Some("2024-01-15"));
}

#[test]
fn test_attribution_with_overlapping_legacy_window() {
    let dataset = dataset();
    let index = IntervalIndex::build(dataset.intervals.clone());

    let result = attribute(&dataset.issues, &index);

    // Legacy overlaps both sprints, so every entry counts there too
    assert_eq!(result.interval_seconds("Legacy"), 9000.0);
    assert_eq!(result.interval_seconds("S1"), 7200.0);
    assert_eq!(result.interval_seconds("2024-01-15"), 1800.0);
    assert_eq!(result.total_seconds, 9000.0);
    assert_eq!(result.issues_with_logs_count, 2);
}

#[test]
fn test_attribution_after_excluding_legacy() {
    let dataset = dataset();
    let index = index_without_legacy(&dataset);

    let result = attribute(&dataset.issues, &index);

    assert_eq!(result.member_seconds("alice", "S1"), 3600.0);
    assert_eq!(result.member_seconds("bob", "S1"), 3600.0);
    assert_eq!(result.member_seconds("carol", "2024-01-15"), 1800.0);
    assert!(result.per_interval.get("Legacy").is_none());

    let totals = member_totals(&dataset.issues);
    let names: Vec<&str> = totals.iter().map(|t| t.username.as_str()).collect();
    assert_eq!(names, vec!["alice", "bob", "carol"]);
}

#[test]
fn test_merge_metrics_and_cycle_time() {
    let dataset = dataset();
    let index = index_without_legacy(&dataset);

    let metrics = aggregate(&dataset.merge_requests, &index);
    let s1 = metrics.stats("S1").unwrap();
    assert_eq!(s1.avg_comments, 3.0);
    assert_eq!(s1.avg_pipeline_failures, 1.0);
    assert_eq!(metrics.avg_merge_duration_hours("S1"), Some(48.0));
    assert_eq!(metrics.stats("2024-01-15").unwrap().count, 1);
    assert_eq!(metrics.avg_merge_duration_hours("2024-01-15"), None);

    let rows = cycle_times(&dataset.issues, &index);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].avg_lead_hours, 72.0);
    assert_eq!(rows[0].avg_cycle_hours, 24.0);
}

#[test]
fn test_sprint_load_by_schedule() {
    let dataset = dataset();
    let load = sprint_load(&dataset.issues, &index_without_legacy(&dataset));

    assert_eq!(load.len(), 2);
    assert_eq!((load[0].label.as_str(), load[0].total_weight), ("S1", 3.0));
    assert_eq!(load[1].total_weight, 2.0);
    assert_eq!(load[1].total_seconds, 1800.0);
}

#[test]
fn test_dependency_graph_layered() {
    let dataset = dataset();
    let graph = DependencyGraph::build(&dataset.issues, &IntervalSelection::All).unwrap();

    // 101 is closed, 105 is isolated
    let ids: Vec<u64> = graph.nodes.iter().map(|n| n.id).collect();
    assert_eq!(ids, vec![102, 103, 104]);

    let config = Config::default();
    let layered = layer_graph(&graph, &config.layout.canvas(), config.layout.max_nodes).unwrap();
    assert_eq!(layered.node(102).unwrap().level, 0);
    assert_eq!(layered.node(103).unwrap().level, 1);
    assert_eq!(layered.node(104).unwrap().level, 2);
    assert!(!layered.has_cycles());
}

#[test]
fn test_dependency_graph_for_one_iteration() {
    let dataset = dataset();
    let graph =
        DependencyGraph::build(&dataset.issues, &IntervalSelection::parse("2024-01-15")).unwrap();

    assert_eq!(graph.node_count(), 2);
    assert_eq!(graph.edge_count(), 1);
    assert_eq!(graph.roots(), vec![102]);
}

#[test]
fn test_full_report_with_config() {
    let config = Config::from_toml_str(&format!("excluded_iterations = [\"{}\"]", LEGACY)).unwrap();
    let report =
        Report::build(&dataset(), &config, &Section::ALL, &IntervalSelection::All).unwrap();

    let summary = report.summary.as_ref().unwrap();
    assert_eq!(summary.total_hours, 2.5);
    assert_eq!(summary.issues_logged, 2);
    assert_eq!(summary.total_issues, 5);

    let graph = report.graph.as_ref().unwrap();
    assert_eq!(graph.colors.len(), 2);
    assert_eq!(graph.colors["7"], config.palette.colors[0]);
    assert_eq!(graph.colors["8"], config.palette.colors[1]);
}
