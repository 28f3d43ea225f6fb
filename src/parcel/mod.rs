//! Parcel-domain value types consumed by the pipeline
//!
//! These mirror what the ingestion layer supplies: a WGS84 boundary plus
//! the attributes the geoprocessing stages actually read. Nothing here is
//! mutated after construction.

pub mod development;
pub mod obstacle;

pub use development::{DevelopmentSpec, UnitSpec};
pub use obstacle::{Obstacle, ObstacleCategory};

use geo_types::Polygon;
use serde::{Deserialize, Serialize};

use crate::core::types::ParcelId;

/// A residential parcel as supplied by ingestion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parcel {
    pub id: ParcelId,
    /// Assessor parcel number
    pub apn: String,
    /// Boundary ring in WGS84 degrees
    pub boundary: Polygon<f64>,
    /// Recorded lot area in square feet
    pub lot_area_sqft: f64,
    /// Street frontage length, when recorded
    #[serde(default)]
    pub frontage_ft: Option<f64>,
    pub zoning_code: String,
    /// Jurisdiction/region identifier
    pub region: String,
    #[serde(default)]
    pub corner_lot: bool,
    /// Compass bearing (degrees, north = 0) from parcel toward its
    /// fronting street, when ingestion recorded one
    #[serde(default)]
    pub frontage_bearing_deg: Option<f64>,
}

/// Required setback distances in feet, by edge role
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SetbackSpec {
    pub front: f64,
    pub rear: f64,
    pub side: f64,
    pub corner_side: f64,
}

impl Default for SetbackSpec {
    fn default() -> Self {
        Self {
            front: 25.0,
            rear: 25.0,
            side: 10.0,
            corner_side: 15.0,
        }
    }
}

impl SetbackSpec {
    pub fn uniform(distance: f64) -> Self {
        Self {
            front: distance,
            rear: distance,
            side: distance,
            corner_side: distance,
        }
    }

    /// All distances non-negative and finite
    pub fn is_valid(&self) -> bool {
        [self.front, self.rear, self.side, self.corner_side]
            .iter()
            .all(|d| d.is_finite() && *d >= 0.0)
    }
}
