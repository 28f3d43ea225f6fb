//! Development obstacles and their exclusion buffers

use geo_types::Polygon;
use serde::{Deserialize, Serialize};

/// What kind of feature blocks development
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObstacleCategory {
    Pool,
    Tree,
    Driveway,
    Structure,
    Easement,
    Other,
}

impl ObstacleCategory {
    /// Default exclusion buffer (feet) when the obstacle carries none
    ///
    /// Pools need deck/equipment clearance; the tree default approximates
    /// a mature canopy radius. Hardscape and recorded geometry
    /// (driveways, structures, easements) exclude exactly their own
    /// footprint.
    pub fn default_buffer_ft(&self) -> f64 {
        match self {
            ObstacleCategory::Pool => 5.0,
            ObstacleCategory::Tree => 15.0,
            ObstacleCategory::Driveway => 0.0,
            ObstacleCategory::Structure => 0.0,
            ObstacleCategory::Easement => 0.0,
            ObstacleCategory::Other => 0.0,
        }
    }
}

/// A single obstacle within one pipeline invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obstacle {
    pub category: ObstacleCategory,
    /// Footprint in WGS84 degrees (projected by the pipeline runner)
    pub geometry: Polygon<f64>,
    /// Explicit exclusion buffer in feet; category default when absent
    #[serde(default)]
    pub buffer_ft: Option<f64>,
    /// Whether the obstacle could be removed (reported, not acted on)
    #[serde(default)]
    pub removable: bool,
}

impl Obstacle {
    pub fn new(category: ObstacleCategory, geometry: Polygon<f64>) -> Self {
        Self {
            category,
            geometry,
            buffer_ft: None,
            removable: false,
        }
    }

    pub fn with_buffer(mut self, buffer_ft: f64) -> Self {
        self.buffer_ft = Some(buffer_ft);
        self
    }

    pub fn effective_buffer_ft(&self) -> f64 {
        self.buffer_ft
            .unwrap_or_else(|| self.category.default_buffer_ft())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::LineString;

    fn square() -> Polygon<f64> {
        Polygon::new(
            LineString::from(vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0), (0.0, 0.0)]),
            vec![],
        )
    }

    #[test]
    fn test_category_default_buffers() {
        assert_eq!(ObstacleCategory::Pool.default_buffer_ft(), 5.0);
        assert_eq!(ObstacleCategory::Tree.default_buffer_ft(), 15.0);
        assert_eq!(ObstacleCategory::Driveway.default_buffer_ft(), 0.0);
    }

    #[test]
    fn test_explicit_buffer_wins() {
        let obstacle = Obstacle::new(ObstacleCategory::Pool, square()).with_buffer(12.0);
        assert_eq!(obstacle.effective_buffer_ft(), 12.0);
    }

    #[test]
    fn test_default_buffer_from_category() {
        let obstacle = Obstacle::new(ObstacleCategory::Tree, square());
        assert_eq!(obstacle.effective_buffer_ft(), 15.0);
    }

    #[test]
    fn test_category_serde_snake_case() {
        let json = serde_json::to_string(&ObstacleCategory::Driveway).unwrap();
        assert_eq!(json, "\"driveway\"");
    }
}
