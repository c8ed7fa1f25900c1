//! Issue dependency graph construction
//!
//! Builds a directed graph from "blocked by" relations between open issues.
//!
//! # Node Representation
//!
//! - Each open, eligible issue with at least one live dependency becomes a node
//! - The node id is the trailing numeric segment of the opaque issue id
//!   (`gid://gitlab/Issue/123` → `123`)
//!
//! # Edge Representation
//!
//! - **Blocker → Blocked**: an edge `source → target` means *source blocks target*
//! - Closed blockers and blockers outside the eligible set never produce edges
//!
//! # Example
//!
//! ```
//! use sprintlens::dependency_graph::{DependencyGraph, IntervalSelection};
//! use sprintlens::model::{Issue, IssueRef};
//!
//! # fn main() -> sprintlens::error::Result<()> {
//! let issues = vec![
//!     Issue::new("gid://gitlab/Issue/1", "Schema"),
//!     Issue::new("gid://gitlab/Issue/2", "API").blocked_by(IssueRef {
//!         id: "gid://gitlab/Issue/1".to_string(),
//!         closed_at: None,
//!     }),
//!     Issue::new("gid://gitlab/Issue/3", "Unrelated"),
//! ];
//!
//! let graph = DependencyGraph::build(&issues, &IntervalSelection::All)?;
//! assert_eq!(graph.node_count(), 2);
//! assert_eq!(graph.edge_count(), 1);
//! # Ok(())
//! # }
//! ```

use crate::error::{malformed, AnalyticsError, RecordKind, Result, SkipReport};
use crate::model::Issue;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Which issues take part in the graph
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum IntervalSelection {
    /// Every open issue
    #[default]
    All,
    /// Open issues scheduled in the iteration with this label
    Label(String),
}

impl IntervalSelection {
    /// Exactly `"all"` selects everything, anything else is a label
    pub fn parse(raw: &str) -> Self {
        if raw == "all" {
            Self::All
        } else {
            Self::Label(raw.to_string())
        }
    }

    fn admits(&self, issue: &Issue) -> bool {
        match self {
            Self::All => true,
            Self::Label(label) => issue.iteration_label() == Some(label.as_str()),
        }
    }
}

/// A positioned issue in the dependency graph
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphNode {
    pub id: u64,
    pub label: String,
    /// Project of the underlying issue, used for coloring
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    pub level: usize,
    pub x: f64,
    pub y: f64,
}

impl GraphNode {
    pub fn new(id: u64, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            project: None,
            level: 0,
            x: 0.0,
            y: 0.0,
        }
    }
}

/// `source` blocks `target`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct GraphEdge {
    pub source: u64,
    pub target: u64,
}

/// Dependency graph over open issues
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// Connected nodes in eligible-issue order
    pub nodes: Vec<GraphNode>,

    /// Deduplicated edges in discovery order
    pub edges: Vec<GraphEdge>,

    /// Issues skipped because their id carries no number
    pub skipped: SkipReport,
}

/// Derive the numeric node id from an opaque issue id
///
/// Takes the last `/`-separated segment and keeps its digits.
///
/// ```
/// use sprintlens::dependency_graph::node_id;
///
/// assert_eq!(node_id("gid://gitlab/Issue/123"), Some(123));
/// assert_eq!(node_id("gid://gitlab/Issue/abc"), None);
/// ```
pub fn node_id(opaque: &str) -> Option<u64> {
    let segment = opaque.rsplit('/').next().unwrap_or(opaque);
    let digits: String = segment.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

impl DependencyGraph {
    /// Build the graph from issue records
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::DataIntegrity`] when two distinct eligible
    /// issue ids map to the same node id.
    pub fn build(issues: &[Issue], selection: &IntervalSelection) -> Result<Self> {
        let mut skipped = SkipReport::new();

        // Phase 1: eligible issues and their node ids
        let mut eligible: Vec<(&Issue, u64)> = Vec::new();
        let mut opaque_to_node: HashMap<&str, u64> = HashMap::new();
        let mut node_to_opaque: HashMap<u64, &str> = HashMap::new();

        for issue in issues {
            if !issue.is_open() || !selection.admits(issue) {
                continue;
            }
            if opaque_to_node.contains_key(issue.id.as_str()) {
                // Same record delivered twice
                continue;
            }

            let Some(id) = node_id(&issue.id) else {
                skipped.record(malformed(
                    RecordKind::Issue,
                    &issue.id,
                    "id has no numeric segment",
                ));
                continue;
            };

            if let Some(existing) = node_to_opaque.insert(id, issue.id.as_str()) {
                return Err(AnalyticsError::DataIntegrity {
                    first: existing.to_string(),
                    second: issue.id.clone(),
                    node_id: id,
                });
            }
            opaque_to_node.insert(issue.id.as_str(), id);
            eligible.push((issue, id));
        }

        // Phase 2: edges from live, eligible blockers
        let mut edges = Vec::new();
        let mut seen = HashSet::new();
        for &(issue, target) in &eligible {
            for blocker in &issue.blocked_by {
                if !blocker.is_open() {
                    continue;
                }
                let Some(&source) = opaque_to_node.get(blocker.id.as_str()) else {
                    continue;
                };
                let edge = GraphEdge { source, target };
                if seen.insert(edge) {
                    edges.push(edge);
                }
            }
        }

        // Phase 3: keep only nodes touching an edge
        let linked: HashSet<u64> = edges.iter().flat_map(|e| [e.source, e.target]).collect();
        let nodes: Vec<GraphNode> = eligible
            .iter()
            .filter(|(_, id)| linked.contains(id))
            .map(|&(issue, id)| {
                let title = issue.title.trim();
                let label = if title.is_empty() { "No Title" } else { title };
                let mut node = GraphNode::new(id, label);
                node.project = issue.project.clone();
                node
            })
            .collect();

        tracing::debug!(
            "dependency graph: {} eligible issues, {} connected nodes, {} edges",
            eligible.len(),
            nodes.len(),
            edges.len()
        );

        Ok(Self {
            nodes,
            edges,
            skipped,
        })
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn node(&self, id: u64) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Issues directly blocked by `id`
    pub fn children(&self, id: u64) -> Vec<u64> {
        self.edges
            .iter()
            .filter(|e| e.source == id)
            .map(|e| e.target)
            .collect()
    }

    /// Issues directly blocking `id`
    pub fn parents(&self, id: u64) -> Vec<u64> {
        self.edges
            .iter()
            .filter(|e| e.target == id)
            .map(|e| e.source)
            .collect()
    }

    /// Nodes nobody blocks
    pub fn roots(&self) -> Vec<u64> {
        let targets: HashSet<u64> = self.edges.iter().map(|e| e.target).collect();
        self.nodes
            .iter()
            .map(|n| n.id)
            .filter(|id| !targets.contains(id))
            .collect()
    }
}
