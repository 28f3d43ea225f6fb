//! Pipeline configuration with documented constants
//!
//! All tunable thresholds are collected here with explanations of their
//! purpose and how they interact with each other.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::error::{BacklotError, Result};

/// Configuration for the geoprocessing pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Fragments below this area (sq ft) are dropped after obstacle
    /// subtraction
    ///
    /// Boolean differences leave floating-point slivers along shared
    /// edges; anything under ~1 sq ft cannot hold a structure and would
    /// otherwise be reported as buildable.
    pub sliver_min_sqft: f64,

    /// Coordinate tolerance (degrees) for the project/unproject roundtrip
    ///
    /// At mid latitudes 1e-6 degrees is roughly 10 cm, well inside the
    /// stated <0.1% distortion budget for parcel-scale areas.
    pub roundtrip_tolerance_deg: f64,

    pub fit: FitConfig,
}

/// Configuration for the fit-test search
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FitConfig {
    /// Translation grid resolution per connected component
    ///
    /// The grid step is the component's larger bounding-box dimension
    /// divided by this, clamped to `min_grid_step_ft`. At 64, a 100 ft
    /// backyard is searched at ~1.6 ft granularity.
    pub grid_resolution: usize,

    /// Lower clamp on the translation grid step (ft)
    ///
    /// Sub-foot steps multiply candidate counts without changing outcomes
    /// at construction tolerances.
    pub min_grid_step_ft: f64,

    /// Required clearance between a placed unit and the component
    /// boundary (ft)
    pub min_clearance_ft: f64,

    /// Hard cap on candidate poses evaluated per `test_fit` call
    ///
    /// Bounds worst-case latency; exhausting the budget without a valid
    /// pose reports `search_budget_exceeded` rather than running
    /// unbounded.
    pub max_candidates: usize,

    /// Separation buffer applied around already-placed units in
    /// multi-unit mode (ft)
    pub unit_separation_ft: f64,

    /// Maximum units attempted in multi-unit mode
    pub max_units: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sliver_min_sqft: 1.0,
            roundtrip_tolerance_deg: 1e-6,
            fit: FitConfig::default(),
        }
    }
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            grid_resolution: 64,
            min_grid_step_ft: 1.0,
            min_clearance_ft: 0.0,
            max_candidates: 200_000,
            unit_separation_ft: 10.0,
            max_units: 4,
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file, validating it
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: PipelineConfig = toml::from_str(&content)
            .map_err(|e| BacklotError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.sliver_min_sqft < 0.0 {
            return Err(BacklotError::InvalidConfig(
                "sliver_min_sqft must be >= 0".into(),
            ));
        }
        if self.roundtrip_tolerance_deg <= 0.0 {
            return Err(BacklotError::InvalidConfig(
                "roundtrip_tolerance_deg must be positive".into(),
            ));
        }
        if self.fit.grid_resolution == 0 {
            return Err(BacklotError::InvalidConfig(
                "fit.grid_resolution must be >= 1".into(),
            ));
        }
        if self.fit.min_grid_step_ft <= 0.0 {
            return Err(BacklotError::InvalidConfig(
                "fit.min_grid_step_ft must be positive".into(),
            ));
        }
        if self.fit.min_clearance_ft < 0.0 {
            return Err(BacklotError::InvalidConfig(
                "fit.min_clearance_ft must be >= 0".into(),
            ));
        }
        if self.fit.max_candidates == 0 {
            return Err(BacklotError::InvalidConfig(
                "fit.max_candidates must be >= 1".into(),
            ));
        }
        if self.fit.max_units == 0 {
            return Err(BacklotError::InvalidConfig(
                "fit.max_units must be >= 1".into(),
            ));
        }
        Ok(())
    }
}
