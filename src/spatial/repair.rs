//! Polygon validity checking and repair
//!
//! Every pipeline stage funnels suspect input through [`repair`] before
//! running boolean operations on it. Repair normalizes what can be
//! normalized (ring closure, duplicate vertices, winding) and rejects what
//! cannot (self-intersections, degenerate rings) so that a bad parcel is
//! never silently reported as buildable.

use geo::orient::{Direction, Orient};
use geo::Area;
use geo_types::{Coord, LineString, Polygon};

use crate::core::error::{BacklotError, Result};

/// Vertices closer than this (local units or degrees) collapse into one
const DUPLICATE_EPS: f64 = 1e-9;

/// Repair a polygon or fail with `InvalidGeometry`
///
/// Returns a polygon with closed, deduplicated rings, exterior oriented
/// counter-clockwise and holes clockwise. Fails if any ring has fewer than
/// three distinct vertices, contains non-finite coordinates,
/// self-intersects, or the exterior encloses zero area.
pub fn repair(polygon: &Polygon<f64>) -> Result<Polygon<f64>> {
    let exterior = clean_ring(polygon.exterior())?;
    let mut holes = Vec::with_capacity(polygon.interiors().len());
    for interior in polygon.interiors() {
        holes.push(clean_ring(interior)?);
    }

    let repaired = Polygon::new(exterior, holes).orient(Direction::Default);

    if is_self_intersecting(repaired.exterior()) {
        return Err(BacklotError::InvalidGeometry(
            "exterior ring self-intersects".into(),
        ));
    }
    for interior in repaired.interiors() {
        if is_self_intersecting(interior) {
            return Err(BacklotError::InvalidGeometry(
                "interior ring self-intersects".into(),
            ));
        }
    }

    if repaired.unsigned_area() <= 0.0 {
        return Err(BacklotError::InvalidGeometry(
            "polygon encloses zero area".into(),
        ));
    }

    Ok(repaired)
}

/// Close the ring and collapse consecutive duplicate vertices
fn clean_ring(ring: &LineString<f64>) -> Result<LineString<f64>> {
    let mut coords: Vec<Coord<f64>> = Vec::with_capacity(ring.0.len());

    for coord in &ring.0 {
        if !coord.x.is_finite() || !coord.y.is_finite() {
            return Err(BacklotError::InvalidGeometry(
                "non-finite coordinate".into(),
            ));
        }
        match coords.last() {
            Some(last) if close(*last, *coord) => continue,
            _ => coords.push(*coord),
        }
    }

    // Drop a closing vertex duplicating the first, then re-close
    if coords.len() > 1 && close(coords[0], *coords.last().unwrap()) {
        coords.pop();
    }

    if coords.len() < 3 {
        return Err(BacklotError::InvalidGeometry(format!(
            "ring has {} distinct vertices, need at least 3",
            coords.len()
        )));
    }

    coords.push(coords[0]);
    Ok(LineString::from(coords))
}

fn close(a: Coord<f64>, b: Coord<f64>) -> bool {
    (a.x - b.x).abs() < DUPLICATE_EPS && (a.y - b.y).abs() < DUPLICATE_EPS
}

/// Check whether non-adjacent ring edges properly cross each other
pub fn is_self_intersecting(ring: &LineString<f64>) -> bool {
    // Ring is closed; work on the open vertex list
    let coords = &ring.0[..ring.0.len().saturating_sub(1)];
    let n = coords.len();
    if n < 4 {
        return false; // Triangle cannot self-intersect
    }

    for i in 0..n {
        let a1 = coords[i];
        let a2 = coords[(i + 1) % n];

        for j in (i + 2)..n {
            // Skip the edge adjacent on the wrap-around side
            if i == 0 && j == n - 1 {
                continue;
            }

            let b1 = coords[j];
            let b2 = coords[(j + 1) % n];

            if segments_cross(a1, a2, b1, b2) {
                return true;
            }
        }
    }
    false
}

/// Proper crossing test (shared endpoints do not count)
fn segments_cross(a1: Coord<f64>, a2: Coord<f64>, b1: Coord<f64>, b2: Coord<f64>) -> bool {
    let d1 = cross_sign(b1, b2, a1);
    let d2 = cross_sign(b1, b2, a2);
    let d3 = cross_sign(a1, a2, b1);
    let d4 = cross_sign(a1, a2, b2);

    ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
}

fn cross_sign(a: Coord<f64>, b: Coord<f64>, c: Coord<f64>) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}
