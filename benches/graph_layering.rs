//! Dependency graph construction and layering benchmark
//!
//! Layering is O(V + E); these benchmarks keep it that way as the graph
//! builder and layout grow.
//!
//! # Run Instructions
//!
//! ```bash
//! cargo bench --bench graph_layering
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sprintlens::dependency_graph::{DependencyGraph, IntervalSelection};
use sprintlens::layering::{layer_graph, Canvas};
use sprintlens::model::{Issue, IssueRef};

/// Open issues where issue i is blocked by up to `fan_in` earlier issues
fn create_issues(count: usize, fan_in: usize) -> Vec<Issue> {
    (0..count)
        .map(|i| {
            let mut issue =
                Issue::new(format!("gid://gitlab/Issue/{}", i + 1), format!("Issue {}", i));
            for back in 1..=fan_in.min(i) {
                issue = issue.blocked_by(IssueRef {
                    id: format!("gid://gitlab/Issue/{}", i + 1 - back),
                    closed_at: None,
                });
            }
            issue
        })
        .collect()
}

fn bench_graph_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph_build");

    for size in [100, 1_000, 5_000] {
        let issues = create_issues(size, 3);
        group.bench_with_input(BenchmarkId::from_parameter(size), &issues, |b, issues| {
            b.iter(|| DependencyGraph::build(black_box(issues), &IntervalSelection::All));
        });
    }

    group.finish();
}

fn bench_layering(c: &mut Criterion) {
    let mut group = c.benchmark_group("layering");
    let canvas = Canvas::default();

    for size in [100, 1_000, 5_000] {
        let issues = create_issues(size, 3);
        let Ok(graph) = DependencyGraph::build(&issues, &IntervalSelection::All) else {
            continue;
        };
        group.bench_with_input(BenchmarkId::from_parameter(size), &graph, |b, graph| {
            b.iter(|| layer_graph(black_box(graph), &canvas, usize::MAX));
        });
    }

    group.finish();
}

/// Worst case for the queue: every node on one cycle
fn bench_layering_cycle(c: &mut Criterion) {
    let mut issues = create_issues(1_000, 1);
    issues[0] = issues[0].clone().blocked_by(IssueRef {
        id: "gid://gitlab/Issue/1000".to_string(),
        closed_at: None,
    });
    let Ok(graph) = DependencyGraph::build(&issues, &IntervalSelection::All) else {
        return;
    };
    let canvas = Canvas::default();

    c.bench_function("layering_cycle_1000", |b| {
        b.iter(|| layer_graph(black_box(&graph), &canvas, usize::MAX));
    });
}

criterion_group!(benches, bench_graph_build, bench_layering, bench_layering_cycle);
criterion_main!(benches);
