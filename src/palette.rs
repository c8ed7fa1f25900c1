//! Per-project colors for graph rendering
//!
//! Built once per render pass from the projects actually present, so the
//! same input always yields the same colors.

use std::collections::HashMap;

/// Project id → color, assigned in first-seen order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColorMap {
    colors: HashMap<String, String>,
    order: Vec<String>,
}

impl ColorMap {
    /// Assign palette entries to project ids, cycling when there are more
    /// projects than colors
    ///
    /// # Example
    /// ```
    /// use sprintlens::palette::ColorMap;
    ///
    /// let palette = vec!["red".to_string(), "blue".to_string()];
    /// let map = ColorMap::build(["a", "b", "a", "c"], &palette);
    ///
    /// assert_eq!(map.color("a"), Some("red"));
    /// assert_eq!(map.color("b"), Some("blue"));
    /// assert_eq!(map.color("c"), Some("red"));
    /// assert_eq!(map.color("z"), None);
    /// ```
    pub fn build<I, S>(project_ids: I, palette: &[String]) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut map = Self::default();
        if palette.is_empty() {
            return map;
        }

        for project in project_ids {
            let project = project.as_ref();
            if map.colors.contains_key(project) {
                continue;
            }
            let color = palette[map.order.len() % palette.len()].clone();
            map.colors.insert(project.to_string(), color);
            map.order.push(project.to_string());
        }
        map
    }

    pub fn color(&self, project: &str) -> Option<&str> {
        self.colors.get(project).map(String::as_str)
    }

    /// (project, color) pairs in assignment order
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.order
            .iter()
            .filter_map(|p| self.colors.get(p).map(|c| (p.as_str(), c.as_str())))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
