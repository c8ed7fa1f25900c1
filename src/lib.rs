//! Sprintlens - iteration analytics for issue trackers
//!
//! This library turns iteration, issue and merge-request records into
//! per-member and per-iteration time attribution, merge quality metrics,
//! cycle times and a layered dependency graph of open issues.
//!
//! All engines are pure functions over in-memory records; fetching is the
//! job of a [`source::RecordSource`].

pub mod cli;
pub mod config;
pub mod cycle_time;
pub mod dependency_graph;
pub mod error;
pub mod interval_index;
pub mod layering;
pub mod merge_metrics;
pub mod model;
pub mod palette;
pub mod report;
pub mod source;
pub mod time_attribution;
pub mod timestamp;
