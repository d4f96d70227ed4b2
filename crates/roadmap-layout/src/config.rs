//! Layout configuration

use serde::{Deserialize, Serialize};

/// Node box width used by the reference renderer
pub const DEFAULT_NODE_WIDTH: f64 = 180.0;
/// Node box height used by the reference renderer
pub const DEFAULT_NODE_HEIGHT: f64 = 44.0;

/// Flow direction of ranks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Ranks stack downwards
    #[default]
    TopToBottom,
    /// Ranks stack to the right
    LeftToRight,
}

/// Spacing and iteration parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Width of every node box
    pub node_width: f64,
    /// Height of every node box
    pub node_height: f64,
    /// Gap between neighbouring nodes of the same rank
    pub node_spacing: f64,
    /// Gap between consecutive ranks
    pub rank_spacing: f64,
    /// Barycenter sweeps (one down plus one up per pass)
    pub ordering_passes: usize,
    /// Rank direction
    pub direction: Direction,
}

impl LayoutConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With node box size
    #[inline]
    #[must_use]
    pub fn with_node_size(mut self, width: f64, height: f64) -> Self {
        self.node_width = width;
        self.node_height = height;
        self
    }

    /// With spacing between nodes and between ranks
    #[inline]
    #[must_use]
    pub fn with_spacing(mut self, node_spacing: f64, rank_spacing: f64) -> Self {
        self.node_spacing = node_spacing;
        self.rank_spacing = rank_spacing;
        self
    }

    /// With number of ordering passes
    #[inline]
    #[must_use]
    pub fn with_ordering_passes(mut self, passes: usize) -> Self {
        self.ordering_passes = passes;
        self
    }

    /// With rank direction
    #[inline]
    #[must_use]
    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Check that every dimension is finite and non-negative
    ///
    /// # Errors
    /// `LayoutConfigError::InvalidDimension` naming the first bad field.
    pub fn validate(&self) -> Result<(), LayoutConfigError> {
        let fields = [
            ("node_width", self.node_width),
            ("node_height", self.node_height),
            ("node_spacing", self.node_spacing),
            ("rank_spacing", self.rank_spacing),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(LayoutConfigError::InvalidDimension { field: name, value });
            }
        }
        Ok(())
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_width: DEFAULT_NODE_WIDTH,
            node_height: DEFAULT_NODE_HEIGHT,
            node_spacing: 80.0,
            rank_spacing: 100.0,
            ordering_passes: 4,
            direction: Direction::TopToBottom,
        }
    }
}

/// Invalid layout configuration
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LayoutConfigError {
    /// A size or spacing is negative or not a number
    #[error("layout {field} must be a finite non-negative number, got {value}")]
    InvalidDimension {
        /// Offending field
        field: &'static str,
        /// Offending value
        value: f64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_renderer() {
        let config = LayoutConfig::default();
        assert_eq!(config.node_width, 180.0);
        assert_eq!(config.node_height, 44.0);
        assert_eq!(config.node_spacing, 80.0);
        assert_eq!(config.rank_spacing, 100.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_negative_spacing() {
        let config = LayoutConfig::new().with_spacing(-1.0, 100.0);
        assert!(matches!(
            config.validate(),
            Err(LayoutConfigError::InvalidDimension { field: "node_spacing", .. })
        ));
    }
}
