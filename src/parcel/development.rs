//! Proposed-development and unit-footprint specifications

use geo_types::{LineString, Polygon};
use serde::{Deserialize, Serialize};

/// A proposed development evaluated for zoning compliance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevelopmentSpec {
    /// Use label matched against the zoning use lists
    /// (e.g. "accessory dwelling unit")
    pub use_type: String,
    /// Dwelling units proposed
    pub units: u32,
    /// Proposed building footprint, sq ft
    pub footprint_sqft: f64,
    /// Proposed total floor area, sq ft
    pub floor_area_sqft: f64,
    #[serde(default)]
    pub height_ft: Option<f64>,
    #[serde(default)]
    pub stories: Option<u32>,
    /// Footprint already on the parcel, sq ft
    #[serde(default)]
    pub existing_building_sqft: f64,
    /// Floor area already on the parcel, sq ft
    #[serde(default)]
    pub existing_floor_area_sqft: f64,
    /// Claimed height exception (e.g. "chimney"), matched exactly
    /// (case-insensitive) against the rules' exception list
    #[serde(default)]
    pub height_exception: Option<String>,
}

impl DevelopmentSpec {
    /// Whether this development is an accessory dwelling unit
    pub fn is_adu(&self) -> bool {
        let normalized = self.use_type.trim().to_lowercase();
        normalized == "adu" || normalized.contains("accessory dwelling")
    }

    pub fn total_footprint_sqft(&self) -> f64 {
        self.existing_building_sqft + self.footprint_sqft
    }

    pub fn total_floor_area_sqft(&self) -> f64 {
        self.existing_floor_area_sqft + self.floor_area_sqft
    }
}

/// Candidate unit footprint for the fit search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitSpec {
    /// Footprint in local feet, centered on the origin
    pub footprint: Polygon<f64>,
    pub allow_rotation: bool,
    /// Rotation sweep increment in degrees
    pub rotation_step_deg: f64,
}

impl UnitSpec {
    /// Rectangular footprint centered at the origin
    pub fn rectangle(width_ft: f64, depth_ft: f64) -> Self {
        let hw = width_ft / 2.0;
        let hd = depth_ft / 2.0;
        let footprint = Polygon::new(
            LineString::from(vec![
                (-hw, -hd),
                (hw, -hd),
                (hw, hd),
                (-hw, hd),
                (-hw, -hd),
            ]),
            vec![],
        );
        Self {
            footprint,
            allow_rotation: true,
            rotation_step_deg: 15.0,
        }
    }

    pub fn fixed_orientation(mut self) -> Self {
        self.allow_rotation = false;
        self
    }

    pub fn with_rotation_step(mut self, step_deg: f64) -> Self {
        self.rotation_step_deg = step_deg;
        self
    }
}
