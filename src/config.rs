//! TOML configuration
//!
//! Every field has a default, so an empty file (or no file) is valid.
//!
//! ```toml
//! excluded_iterations = ["gid://gitlab/Iteration/60"]
//!
//! [layout]
//! width = 1200.0
//! height = 800.0
//! margin = 50.0
//! max_nodes = 5000
//!
//! [palette]
//! colors = ["#1f77b4", "#ff7f0e"]
//! ```

use crate::layering::Canvas;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default cap on nodes handed to the layering engine
pub const DEFAULT_MAX_NODES: usize = 10_000;

/// Category palette used when the config names none
pub const DEFAULT_PALETTE: &[&str] = &[
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub width: f64,
    pub height: f64,
    pub margin: f64,
    /// Graphs above this size are refused instead of layered
    pub max_nodes: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        let canvas = Canvas::default();
        Self {
            width: canvas.width,
            height: canvas.height,
            margin: canvas.margin,
            max_nodes: DEFAULT_MAX_NODES,
        }
    }
}

impl LayoutConfig {
    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.width,
            height: self.height,
            margin: self.margin,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaletteConfig {
    pub colors: Vec<String>,
}

impl Default for PaletteConfig {
    fn default() -> Self {
        Self {
            colors: DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Iteration ids dropped before indexing
    pub excluded_iterations: Vec<String>,
    pub layout: LayoutConfig,
    pub palette: PaletteConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Example
    ///
    /// ```no_run
    /// use sprintlens::config::Config;
    ///
    /// # fn main() -> anyhow::Result<()> {
    /// let config = Config::from_toml("sprintlens.toml")?;
    /// println!("canvas {}x{}", config.layout.width, config.layout.height);
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;

        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse TOML")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let layout = &self.layout;
        if !(layout.width > 0.0 && layout.height > 0.0) {
            anyhow::bail!(
                "layout width and height must be positive (got {}x{})",
                layout.width,
                layout.height
            );
        }
        if layout.margin < 0.0 {
            anyhow::bail!("layout margin must not be negative (got {})", layout.margin);
        }
        if self.palette.colors.is_empty() {
            anyhow::bail!("palette.colors must name at least one color");
        }
        Ok(())
    }
}
