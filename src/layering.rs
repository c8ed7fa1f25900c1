//! Topological layering and layout of the dependency graph
//!
//! Assigns every node an integer level with Kahn's algorithm, propagating the
//! longest path from the roots, then converts levels into canvas coordinates.
//!
//! # Algorithm: Longest-Path Layering via Kahn's Algorithm
//!
//! ```text
//! 1. indegree[v] = number of edges into v
//! 2. queue = all v with indegree 0, level 0
//! 3. pop u; for each edge u → v:
//!      level[v] = max(level[v], level[u] + 1)
//!      indegree[v] -= 1; enqueue v when it reaches 0
//! ```
//!
//! A node reachable along paths of different lengths takes the longer one, so
//! no acyclic edge ever points backward or sideways in level.
//!
//! # Cycles
//!
//! Nodes on a cycle (and nodes reachable only through one) never reach
//! indegree 0. They are never dequeued and keep level 0. The loop still ends
//! after at most V pops and E relaxations. Such nodes are reported as
//! `stalled` so callers can flag them instead of trusting their position.
//!
//! # Layout
//!
//! ```text
//! x = level / (max_level + 1) * width + margin
//! y = (index_in_level + 1) * height / (nodes_in_level + 1)
//! ```
//!
//! Within a level nodes appear in dequeue order, stalled nodes last in input
//! order.

use crate::dependency_graph::{DependencyGraph, GraphEdge, GraphNode};
use crate::error::{AnalyticsError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

/// Drawing area for the graph
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Canvas {
    pub width: f64,
    pub height: f64,
    /// Left offset added to every x coordinate
    pub margin: f64,
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            margin: 50.0,
        }
    }
}

/// Outcome of Kahn's pass over the graph
#[derive(Debug, Clone, PartialEq)]
pub struct Levels {
    /// Level per node, in input order
    pub levels: Vec<usize>,
    /// Positions into the input, dequeued nodes first, then stalled ones
    pub order: Vec<usize>,
    /// Node ids never dequeued (cycle members and their descendants)
    pub stalled: Vec<u64>,
    /// Queue pops plus edge relaxations
    pub steps: usize,
}

/// Compute longest-path levels for `nodes`
///
/// Edges whose endpoints are not in `nodes` are ignored.
pub fn compute_levels(nodes: &[GraphNode], edges: &[GraphEdge]) -> Levels {
    let position: HashMap<u64, usize> = nodes
        .iter()
        .enumerate()
        .map(|(pos, node)| (node.id, pos))
        .collect();

    let mut outgoing: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    let mut indegree = vec![0usize; nodes.len()];
    for edge in edges {
        let (Some(&source), Some(&target)) =
            (position.get(&edge.source), position.get(&edge.target))
        else {
            continue;
        };
        outgoing[source].push(target);
        indegree[target] += 1;
    }

    let mut levels = vec![0usize; nodes.len()];
    let mut dequeued = vec![false; nodes.len()];
    let mut queue: VecDeque<usize> = (0..nodes.len()).filter(|&v| indegree[v] == 0).collect();
    let mut order = Vec::with_capacity(nodes.len());
    let mut steps = 0;

    while let Some(current) = queue.pop_front() {
        steps += 1;
        dequeued[current] = true;
        order.push(current);

        for &target in &outgoing[current] {
            steps += 1;
            levels[target] = levels[target].max(levels[current] + 1);
            indegree[target] -= 1;
            if indegree[target] == 0 {
                queue.push_back(target);
            }
        }
    }

    // A live predecessor may have raised a stalled node; it still sits at 0
    for (level, &done) in levels.iter_mut().zip(&dequeued) {
        if !done {
            *level = 0;
        }
    }

    let stalled: Vec<u64> = nodes
        .iter()
        .zip(&dequeued)
        .filter(|&(_, &done)| !done)
        .map(|(node, _)| node.id)
        .collect();

    order.extend((0..nodes.len()).filter(|&v| !dequeued[v]));

    if !stalled.is_empty() {
        tracing::warn!(
            "{} nodes sit on or behind a dependency cycle; left at level 0",
            stalled.len()
        );
    }

    Levels {
        levels,
        order,
        stalled,
        steps,
    }
}

/// Assign levels and coordinates; returns the same nodes, positioned
///
/// # Example
/// ```
/// use sprintlens::dependency_graph::{GraphEdge, GraphNode};
/// use sprintlens::layering::{layer, Canvas};
///
/// let nodes = vec![GraphNode::new(1, "Schema"), GraphNode::new(2, "API")];
/// let edges = vec![GraphEdge { source: 1, target: 2 }];
///
/// let placed = layer(&nodes, &edges, &Canvas::default());
/// assert_eq!(placed[0].level, 0);
/// assert_eq!(placed[1].level, 1);
/// assert_eq!(placed[1].x, 450.0); // 1/2 * 800 + 50
/// assert_eq!(placed[1].y, 300.0); // 1 * 600/2
/// ```
pub fn layer(nodes: &[GraphNode], edges: &[GraphEdge], canvas: &Canvas) -> Vec<GraphNode> {
    let levels = compute_levels(nodes, edges);
    position_nodes(nodes, &levels, canvas)
}

/// Node positions in `nodes` order
fn position_nodes(nodes: &[GraphNode], levels: &Levels, canvas: &Canvas) -> Vec<GraphNode> {
    let max_level = levels.levels.iter().copied().max().unwrap_or(0);
    let bands = (max_level + 1) as f64;

    let mut per_level: HashMap<usize, usize> = HashMap::new();
    for &level in &levels.levels {
        *per_level.entry(level).or_default() += 1;
    }

    let mut placed: Vec<GraphNode> = nodes.to_vec();
    let mut seen_in_level: HashMap<usize, usize> = HashMap::new();
    for &pos in &levels.order {
        let level = levels.levels[pos];
        let index = seen_in_level.entry(level).or_default();
        let count = per_level.get(&level).copied().unwrap_or(1) as f64;

        let node = &mut placed[pos];
        node.level = level;
        node.x = level as f64 / bands * canvas.width + canvas.margin;
        node.y = (*index + 1) as f64 * canvas.height / (count + 1.0);
        *index += 1;
    }

    placed
}

/// A dependency graph with levels and coordinates filled in
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayeredGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    /// Nodes left at level 0 because a cycle blocks them
    pub stalled: Vec<u64>,
    pub max_level: usize,
}

impl LayeredGraph {
    pub fn has_cycles(&self) -> bool {
        !self.stalled.is_empty()
    }

    pub fn node(&self, id: u64) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

/// Like [`layer`], but keeps the edges and reports stalled nodes
pub fn layer_with_report(
    nodes: &[GraphNode],
    edges: &[GraphEdge],
    canvas: &Canvas,
) -> LayeredGraph {
    let levels = compute_levels(nodes, edges);
    let max_level = levels.levels.iter().copied().max().unwrap_or(0);

    tracing::debug!(
        "layered {} nodes into {} levels in {} steps",
        nodes.len(),
        max_level + 1,
        levels.steps
    );

    LayeredGraph {
        nodes: position_nodes(nodes, &levels, canvas),
        edges: edges.to_vec(),
        stalled: levels.stalled,
        max_level,
    }
}

/// Layer a built dependency graph, refusing graphs above `max_nodes`
///
/// # Errors
///
/// Returns [`AnalyticsError::GraphTooLarge`] when the graph has more than
/// `max_nodes` nodes.
pub fn layer_graph(
    graph: &DependencyGraph,
    canvas: &Canvas,
    max_nodes: usize,
) -> Result<LayeredGraph> {
    if graph.node_count() > max_nodes {
        return Err(AnalyticsError::GraphTooLarge {
            nodes: graph.node_count(),
            limit: max_nodes,
        });
    }

    Ok(layer_with_report(&graph.nodes, &graph.edges, canvas))
}
