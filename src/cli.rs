//! CLI argument parsing for sprintlens

use crate::dependency_graph::IntervalSelection;
use crate::report::Section;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format (default)
    Text,
    /// JSON format for machine parsing
    Json,
}

/// Which report to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportKind {
    /// Total hours, issues with logged time, issue count
    Summary,
    /// Hours per member, overall and per iteration
    Members,
    /// Logged hours and planned weight per iteration
    Sprints,
    /// Merge request comments, pipeline failures and merge time
    Merges,
    /// Lead and cycle time per iteration
    CycleTime,
    /// Layered dependency graph of open issues
    Graph,
    /// Every report (default)
    All,
}

impl ReportKind {
    pub fn sections(self) -> Vec<Section> {
        match self {
            ReportKind::Summary => vec![Section::Summary],
            ReportKind::Members => vec![Section::Members],
            ReportKind::Sprints => vec![Section::Sprints],
            ReportKind::Merges => vec![Section::Merges],
            ReportKind::CycleTime => vec![Section::CycleTime],
            ReportKind::Graph => vec![Section::Graph],
            ReportKind::All => Section::ALL.to_vec(),
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "sprintlens")]
#[command(version)]
#[command(about = "Iteration analytics over an issue tracker export", long_about = None)]
pub struct Cli {
    /// JSON export of iterations, issues and merge requests
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Report to produce
    #[arg(short, long, value_enum, default_value = "all")]
    pub report: ReportKind,

    /// Output format (text or json)
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Restrict the dependency graph to one iteration label, or "all"
    #[arg(long = "iteration", value_name = "LABEL", default_value = "all")]
    pub iteration: String,

    /// Enable debug tracing output to stderr
    #[arg(long = "debug")]
    pub debug: bool,
}

impl Cli {
    pub fn selection(&self) -> IntervalSelection {
        IntervalSelection::parse(&self.iteration)
    }
}
