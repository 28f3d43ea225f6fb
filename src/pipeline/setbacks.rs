//! Setback envelope computation
//!
//! Classifies parcel edges into front/rear/side/corner-side roles using
//! the minimum rotated rectangle, then intersects the parcel with an
//! inward half-plane offset per classified edge. Oversized setbacks yield
//! an empty polygon, which is a meaningful "zero buildable area" answer
//! rather than an error.

use geo::{Area, BooleanOps, BoundingRect, Centroid, MinimumRotatedRect};
use geo_types::{Coord, Line, Polygon};

use crate::core::error::{BacklotError, Result};
use crate::parcel::{Parcel, SetbackSpec};
use crate::spatial::{ops, repair};

/// Role a boundary edge plays for setback purposes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeRole {
    Front,
    Rear,
    Side,
    CornerSide,
}

impl SetbackSpec {
    pub fn distance_for(&self, role: EdgeRole) -> f64 {
        match role {
            EdgeRole::Front => self.front,
            EdgeRole::Rear => self.rear,
            EdgeRole::Side => self.side,
            EdgeRole::CornerSide => self.corner_side,
        }
    }
}

/// Parcel attributes that steer edge classification
#[derive(Debug, Clone, Copy, Default)]
pub struct EdgeContext {
    pub corner_lot: bool,
    pub frontage_bearing_deg: Option<f64>,
}

impl From<&Parcel> for EdgeContext {
    fn from(parcel: &Parcel) -> Self {
        Self {
            corner_lot: parcel.corner_lot,
            frontage_bearing_deg: parcel.frontage_bearing_deg,
        }
    }
}

/// One classified edge of the orientation rectangle
#[derive(Debug, Clone)]
pub struct ClassifiedEdge {
    pub role: EdgeRole,
    pub line: Line<f64>,
    pub midpoint: Coord<f64>,
    pub length: f64,
    /// Unit normal pointing away from the parcel
    pub outward: Coord<f64>,
}

/// Classify the four orientation-rectangle edges of a local-frame parcel
///
/// Front is the edge whose outward normal best matches the recorded
/// frontage bearing; without one, the edge with the southernmost midpoint
/// (streets are assumed south of the parcel, as in the upstream data).
/// Rear is opposite the front. On corner lots the longer side edge is
/// promoted to corner side.
pub fn classify_edges(
    parcel_local: &Polygon<f64>,
    ctx: &EdgeContext,
) -> Result<Vec<ClassifiedEdge>> {
    let parcel = repair::repair(parcel_local)?;
    let rect = orientation_rect(&parcel)?;

    let center = rect.centroid().ok_or_else(|| {
        BacklotError::InvalidGeometry("orientation rectangle has no centroid".into())
    })?;

    let ring = &rect.exterior().0;
    if ring.len() < 5 {
        return Err(BacklotError::InvalidGeometry(
            "orientation rectangle is degenerate".into(),
        ));
    }

    let mut edges = Vec::with_capacity(4);
    for i in 0..4 {
        let line = Line::new(ring[i], ring[i + 1]);
        let dx = line.end.x - line.start.x;
        let dy = line.end.y - line.start.y;
        let length = (dx * dx + dy * dy).sqrt();
        if length <= 0.0 {
            return Err(BacklotError::InvalidGeometry(
                "orientation rectangle has a zero-length edge".into(),
            ));
        }
        let midpoint = Coord {
            x: (line.start.x + line.end.x) / 2.0,
            y: (line.start.y + line.end.y) / 2.0,
        };
        // Perpendicular, flipped to point away from the rectangle center
        let mut outward = Coord {
            x: dy / length,
            y: -dx / length,
        };
        let to_mid = Coord {
            x: midpoint.x - center.x(),
            y: midpoint.y - center.y(),
        };
        if outward.x * to_mid.x + outward.y * to_mid.y < 0.0 {
            outward = Coord {
                x: -outward.x,
                y: -outward.y,
            };
        }
        edges.push((line, midpoint, length, outward));
    }

    let front_idx = match ctx.frontage_bearing_deg {
        Some(bearing) => (0..4)
            .min_by(|&a, &b| {
                let da = bearing_difference(outward_bearing(edges[a].3), bearing);
                let db = bearing_difference(outward_bearing(edges[b].3), bearing);
                da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap_or(0),
        None => (0..4)
            .min_by(|&a, &b| {
                let (ma, mb) = (edges[a].1, edges[b].1);
                ma.y.partial_cmp(&mb.y)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(ma.x.partial_cmp(&mb.x).unwrap_or(std::cmp::Ordering::Equal))
            })
            .unwrap_or(0),
    };
    let rear_idx = (front_idx + 2) % 4;

    let mut roles = [EdgeRole::Side; 4];
    roles[front_idx] = EdgeRole::Front;
    roles[rear_idx] = EdgeRole::Rear;

    if ctx.corner_lot {
        let side_a = (front_idx + 1) % 4;
        let side_b = (front_idx + 3) % 4;
        // Longer side edge gets the corner-side setback; lower index on ties
        let corner = match edges[side_a].2.partial_cmp(&edges[side_b].2) {
            Some(std::cmp::Ordering::Less) => side_b,
            Some(std::cmp::Ordering::Greater) => side_a,
            _ => side_a.min(side_b),
        };
        roles[corner] = EdgeRole::CornerSide;
    }

    Ok(edges
        .into_iter()
        .zip(roles)
        .map(|((line, midpoint, length, outward), role)| ClassifiedEdge {
            role,
            line,
            midpoint,
            length,
            outward,
        })
        .collect())
}

/// Inward-offset envelope of the parcel under the given setbacks
///
/// Returns an empty polygon when the setbacks consume the whole parcel.
pub fn compute_buildable_envelope(
    parcel_local: &Polygon<f64>,
    setbacks: &SetbackSpec,
    ctx: &EdgeContext,
) -> Result<Polygon<f64>> {
    if !setbacks.is_valid() {
        return Err(BacklotError::InvalidConfig(
            "setback distances must be finite and non-negative".into(),
        ));
    }

    let parcel = repair::repair(parcel_local)?;
    let edges = classify_edges(&parcel, ctx)?;

    let bbox = parcel.bounding_rect().ok_or_else(|| {
        BacklotError::InvalidGeometry("parcel has no bounding rectangle".into())
    })?;
    let extent = 4.0 * (bbox.width().powi(2) + bbox.height().powi(2)).sqrt();

    let mut remaining = ops::to_multi(parcel);
    for edge in &edges {
        let distance = setbacks.distance_for(edge.role);
        if distance <= 0.0 {
            continue;
        }
        let dir = direction(&edge.line, edge.length);
        let inward = Coord {
            x: -edge.outward.x,
            y: -edge.outward.y,
        };
        let keep = ops::half_plane(edge.line.start, dir, inward, distance, extent);
        remaining = remaining.intersection(&ops::to_multi(keep));
        if remaining.0.is_empty() {
            return Ok(ops::empty_polygon());
        }
    }

    Ok(ops::largest_component(&remaining)
        .cloned()
        .unwrap_or_else(ops::empty_polygon))
}

/// Minimum rotated rectangle, falling back to the longest-edge axis when
/// the rectangle itself is degenerate
fn orientation_rect(parcel: &Polygon<f64>) -> Result<Polygon<f64>> {
    if let Some(rect) = parcel.minimum_rotated_rect() {
        if rect.unsigned_area() > 0.0 && rect.exterior().0.len() >= 5 {
            return Ok(rect);
        }
    }
    let angle = ops::longest_edge_angle(parcel).ok_or_else(|| {
        BacklotError::InvalidGeometry("parcel has no measurable boundary edge".into())
    })?;
    ops::oriented_rect(parcel, angle).ok_or_else(|| {
        BacklotError::InvalidGeometry("could not derive parcel orientation".into())
    })
}

fn direction(line: &Line<f64>, length: f64) -> Coord<f64> {
    Coord {
        x: (line.end.x - line.start.x) / length,
        y: (line.end.y - line.start.y) / length,
    }
}

/// Compass bearing (degrees, north = 0, clockwise) of a unit vector
fn outward_bearing(normal: Coord<f64>) -> f64 {
    let bearing = normal.x.atan2(normal.y).to_degrees();
    (bearing + 360.0) % 360.0
}

fn bearing_difference(a: f64, b: f64) -> f64 {
    let diff = (a - b).abs() % 360.0;
    diff.min(360.0 - diff)
}
