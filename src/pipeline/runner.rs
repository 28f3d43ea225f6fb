//! Pipeline orchestration
//!
//! Composes the five stages for one parcel, and fans a batch of parcels
//! out across worker threads. Stages are pure; the only shared state in a
//! batch is read-only rules/specs, so parcels are embarrassingly
//! parallel.

use geo::Area;
use geo_types::{MultiPolygon, Polygon};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::core::config::PipelineConfig;
use crate::core::error::{BacklotError, Result};
use crate::core::types::{CancelToken, ParcelId};
use crate::parcel::{DevelopmentSpec, Obstacle, ObstacleCategory, Parcel, SetbackSpec, UnitSpec};
use crate::pipeline::fit::{self, PlacementResult};
use crate::pipeline::obstacles::subtract_obstacles;
use crate::pipeline::setbacks::{compute_buildable_envelope, EdgeContext};
use crate::spatial::LocalFrame;
use crate::zoning::compliance::{evaluate_compliance, BuildableResult};
use crate::zoning::rules::ZoningRules;

/// Everything the pipeline produced for one parcel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineOutcome {
    pub parcel_id: ParcelId,
    pub frame: LocalFrame,
    /// Setback envelope area before obstacle subtraction, sq ft
    pub envelope_area_sqft: f64,
    pub buildable: BuildableResult,
    pub placement: PlacementResult,
    /// Buildable geometry converted back to WGS84 for callers
    pub buildable_wgs84: MultiPolygon<f64>,
    /// Best placement converted back to WGS84, when one exists
    pub placement_wgs84: Option<Polygon<f64>>,
}

/// Run the five stages for a single parcel
///
/// Stage order is fixed: frame, setbacks, obstacles, compliance, fit.
/// Geometry errors from any stage propagate immediately; "does not fit"
/// and "not compliant" are values inside the outcome.
pub fn run_pipeline(
    parcel: &Parcel,
    setbacks: &SetbackSpec,
    obstacles: &[Obstacle],
    rules: &ZoningRules,
    unit: &UnitSpec,
    development: &DevelopmentSpec,
    config: &PipelineConfig,
    token: &CancelToken,
) -> Result<PipelineOutcome> {
    if token.is_cancelled() {
        return Err(BacklotError::Cancelled);
    }

    let frame = LocalFrame::for_polygon(&parcel.boundary)?;
    let parcel_local = frame.project(&parcel.boundary)?;

    let ctx = EdgeContext::from(parcel);
    let envelope = compute_buildable_envelope(&parcel_local, setbacks, &ctx)?;
    let envelope_area_sqft = envelope.unsigned_area();
    tracing::debug!(
        apn = %parcel.apn,
        envelope_area_sqft,
        "setback envelope computed"
    );

    let obstacles_local = obstacles
        .iter()
        .map(|obstacle| {
            Ok(Obstacle {
                geometry: frame.project(&obstacle.geometry).map_err(|e| {
                    BacklotError::InvalidGeometry(format!(
                        "{:?} obstacle on parcel {}: {e}",
                        obstacle.category, parcel.apn
                    ))
                })?,
                ..obstacle.clone()
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let buildable_multi = subtract_obstacles(&envelope, &obstacles_local, config)?;
    tracing::debug!(
        apn = %parcel.apn,
        fragments = buildable_multi.0.len(),
        buildable_sqft = buildable_multi.unsigned_area(),
        "obstacles subtracted"
    );

    let buildable = evaluate_compliance(&buildable_multi, parcel, rules, development)?;

    // Existing structures steer placement away from themselves
    let keep_clear: Vec<Polygon<f64>> = obstacles_local
        .iter()
        .filter(|o| o.category == ObstacleCategory::Structure)
        .map(|o| o.geometry.clone())
        .collect();

    let placement = fit::test_fit(&buildable_multi, unit, &keep_clear, &config.fit, token)?;

    let buildable_wgs84 = frame.unproject_multi(&buildable.buildable);
    let placement_wgs84 = placement.best_placement.as_ref().map(|p| frame.unproject(p));

    Ok(PipelineOutcome {
        parcel_id: parcel.id,
        frame,
        envelope_area_sqft,
        buildable,
        placement,
        buildable_wgs84,
        placement_wgs84,
    })
}

/// One parcel's worth of batch input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchItem {
    pub parcel: Parcel,
    #[serde(default)]
    pub obstacles: Vec<Obstacle>,
    pub development: DevelopmentSpec,
}

/// Evaluate a batch of parcels in parallel
///
/// Rules, setbacks, and the unit spec are shared read-only across the
/// batch. Each parcel checks the token before starting; parcels already
/// in flight finish normally after cancellation.
pub fn run_batch(
    items: &[BatchItem],
    setbacks: &SetbackSpec,
    rules: &ZoningRules,
    unit: &UnitSpec,
    config: &PipelineConfig,
    token: &CancelToken,
) -> Vec<Result<PipelineOutcome>> {
    items
        .par_iter()
        .map(|item| {
            if token.is_cancelled() {
                return Err(BacklotError::Cancelled);
            }
            run_pipeline(
                &item.parcel,
                setbacks,
                &item.obstacles,
                rules,
                unit,
                &item.development,
                config,
                token,
            )
        })
        .collect()
}
