//! Obstacle exclusion
//!
//! Buffers each obstacle by its category clearance, unions the buffered
//! zones, and subtracts the union from the setback envelope. The result
//! is a MultiPolygon because subtraction routinely fragments a backyard
//! into disconnected pieces.

use geo::{Area, BooleanOps};
use geo_buffer::buffer_polygon;
use geo_types::{MultiPolygon, Polygon};

use crate::core::config::PipelineConfig;
use crate::core::error::{BacklotError, Result};
use crate::parcel::Obstacle;
use crate::spatial::{ops, repair};

/// Subtract buffered obstacles from the buildable envelope
///
/// Obstacle geometry must already be in the same local frame as the
/// envelope. Fragments smaller than `config.sliver_min_sqft` are dropped;
/// they are floating-point residue, not buildable area.
pub fn subtract_obstacles(
    envelope: &Polygon<f64>,
    obstacles: &[Obstacle],
    config: &PipelineConfig,
) -> Result<MultiPolygon<f64>> {
    if ops::is_empty(envelope) {
        return Ok(MultiPolygon(vec![]));
    }
    let envelope = repair::repair(envelope)?;

    let mut zones = Vec::with_capacity(obstacles.len());
    for obstacle in obstacles {
        let geometry = repair::repair(&obstacle.geometry).map_err(|e| {
            BacklotError::InvalidGeometry(format!(
                "{:?} obstacle could not be repaired: {e}",
                obstacle.category
            ))
        })?;
        let buffer = obstacle.effective_buffer_ft();
        let zone = if buffer > 0.0 {
            buffer_polygon(&geometry, buffer)
        } else {
            ops::to_multi(geometry)
        };
        zones.push(zone);
    }

    let exclusion = ops::union_all(zones);
    let remaining = if exclusion.0.is_empty() {
        ops::to_multi(envelope)
    } else {
        ops::to_multi(envelope).difference(&exclusion)
    };

    Ok(ops::drop_slivers(remaining, config.sliver_min_sqft))
}

/// Total exclusion-zone area inside the envelope, for reporting
pub fn constrained_area_sqft(
    envelope: &Polygon<f64>,
    obstacles: &[Obstacle],
) -> Result<f64> {
    if ops::is_empty(envelope) {
        return Ok(0.0);
    }
    let envelope = repair::repair(envelope)?;
    let mut zones = Vec::with_capacity(obstacles.len());
    for obstacle in obstacles {
        let geometry = repair::repair(&obstacle.geometry)?;
        let buffer = obstacle.effective_buffer_ft();
        zones.push(if buffer > 0.0 {
            buffer_polygon(&geometry, buffer)
        } else {
            ops::to_multi(geometry)
        });
    }
    let exclusion = ops::union_all(zones);
    if exclusion.0.is_empty() {
        return Ok(0.0);
    }
    Ok(ops::to_multi(envelope).intersection(&exclusion).unsigned_area())
}
