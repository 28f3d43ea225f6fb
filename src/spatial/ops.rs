//! Shared polygon helpers for the pipeline stages

use geo::{Area, BooleanOps, BoundingRect, Centroid, Rotate};
use geo_types::{Coord, Line, LineString, MultiPolygon, Point, Polygon};

/// An empty polygon, used as the "zero buildable area" result value
pub fn empty_polygon() -> Polygon<f64> {
    Polygon::new(LineString::new(vec![]), vec![])
}

pub fn is_empty(polygon: &Polygon<f64>) -> bool {
    polygon.exterior().0.len() < 4 || polygon.unsigned_area() <= 0.0
}

pub fn to_multi(polygon: Polygon<f64>) -> MultiPolygon<f64> {
    if is_empty(&polygon) {
        MultiPolygon(vec![])
    } else {
        MultiPolygon(vec![polygon])
    }
}

/// Union a sequence of regions into one
pub fn union_all<I>(regions: I) -> MultiPolygon<f64>
where
    I: IntoIterator<Item = MultiPolygon<f64>>,
{
    regions
        .into_iter()
        .fold(MultiPolygon(vec![]), |acc, region| {
            if acc.0.is_empty() {
                region
            } else if region.0.is_empty() {
                acc
            } else {
                acc.union(&region)
            }
        })
}

/// Drop components whose area falls below `min_area`
pub fn drop_slivers(multi: MultiPolygon<f64>, min_area: f64) -> MultiPolygon<f64> {
    MultiPolygon(
        multi
            .0
            .into_iter()
            .filter(|p| p.unsigned_area() >= min_area)
            .collect(),
    )
}

/// Largest component by area; first wins on exact ties
pub fn largest_component(multi: &MultiPolygon<f64>) -> Option<&Polygon<f64>> {
    let mut best: Option<(&Polygon<f64>, f64)> = None;
    for polygon in &multi.0 {
        let area = polygon.unsigned_area();
        match best {
            Some((_, best_area)) if area <= best_area => {}
            _ => best = Some((polygon, area)),
        }
    }
    best.map(|(p, _)| p)
}

/// Quad covering the half-plane at distance `offset` inward of a line
///
/// `anchor` is a point on the edge, `dir` the unit edge direction and
/// `inward` the unit normal pointing into the kept region. `extent` must
/// exceed the diameter of whatever the quad will be intersected with.
pub fn half_plane(
    anchor: Coord<f64>,
    dir: Coord<f64>,
    inward: Coord<f64>,
    offset: f64,
    extent: f64,
) -> Polygon<f64> {
    let base = Coord {
        x: anchor.x + inward.x * offset,
        y: anchor.y + inward.y * offset,
    };
    let a = Coord {
        x: base.x - dir.x * extent,
        y: base.y - dir.y * extent,
    };
    let b = Coord {
        x: base.x + dir.x * extent,
        y: base.y + dir.y * extent,
    };
    let c = Coord {
        x: b.x + inward.x * extent,
        y: b.y + inward.y * extent,
    };
    let d = Coord {
        x: a.x + inward.x * extent,
        y: a.y + inward.y * extent,
    };

    let mut coords = vec![a, b, c, d, a];
    // Ensure counter-clockwise winding regardless of edge orientation
    if signed_ring_area(&coords) < 0.0 {
        coords.reverse();
    }
    Polygon::new(LineString::from(coords), vec![])
}

fn signed_ring_area(coords: &[Coord<f64>]) -> f64 {
    let mut sum = 0.0;
    for w in coords.windows(2) {
        sum += (w[0].x * w[1].y) - (w[1].x * w[0].y);
    }
    sum / 2.0
}

/// Minimum distance from a point to a segment
pub fn point_segment_distance(p: Coord<f64>, seg: Line<f64>) -> f64 {
    let v = Coord {
        x: seg.end.x - seg.start.x,
        y: seg.end.y - seg.start.y,
    };
    let w = Coord {
        x: p.x - seg.start.x,
        y: p.y - seg.start.y,
    };
    let len2 = v.x * v.x + v.y * v.y;
    let t = if len2 <= 0.0 {
        0.0
    } else {
        ((w.x * v.x + w.y * v.y) / len2).clamp(0.0, 1.0)
    };
    let nearest = Coord {
        x: seg.start.x + v.x * t,
        y: seg.start.y + v.y * t,
    };
    ((p.x - nearest.x).powi(2) + (p.y - nearest.y).powi(2)).sqrt()
}

fn ring_to_ring_distance(a: &LineString<f64>, b: &LineString<f64>) -> f64 {
    // Minimum distance between polylines is attained at a vertex of one
    // against an edge of the other
    let mut min = f64::INFINITY;
    for &p in &a.0 {
        for seg in b.lines() {
            min = min.min(point_segment_distance(p, seg));
        }
    }
    for &p in &b.0 {
        for seg in a.lines() {
            min = min.min(point_segment_distance(p, seg));
        }
    }
    min
}

/// Clearance from an inner polygon to the boundary of its container
///
/// Measures against the container's exterior ring and every hole ring.
/// Meaningful when `inner` lies inside `container`; a zero result means
/// the inner polygon touches the boundary.
pub fn boundary_clearance(inner: &Polygon<f64>, container: &Polygon<f64>) -> f64 {
    let mut min = ring_to_ring_distance(inner.exterior(), container.exterior());
    for hole in container.interiors() {
        min = min.min(ring_to_ring_distance(inner.exterior(), hole));
    }
    min
}

/// Angle (degrees) of the longest exterior edge
pub fn longest_edge_angle(polygon: &Polygon<f64>) -> Option<f64> {
    let mut best: Option<(f64, f64)> = None; // (length^2, angle)
    for seg in polygon.exterior().lines() {
        let dx = seg.end.x - seg.start.x;
        let dy = seg.end.y - seg.start.y;
        let len2 = dx * dx + dy * dy;
        if best.map(|(l, _)| len2 > l).unwrap_or(len2 > 0.0) {
            best = Some((len2, dy.atan2(dx).to_degrees()));
        }
    }
    best.map(|(_, angle)| angle)
}

/// Axis-aligned-in-rotated-space bounding rectangle
///
/// Rotates the polygon so `axis_angle_deg` becomes horizontal, takes the
/// bounding box, and rotates the box back. Used as the orientation
/// fallback when the minimum rotated rectangle is degenerate.
pub fn oriented_rect(polygon: &Polygon<f64>, axis_angle_deg: f64) -> Option<Polygon<f64>> {
    let centroid = polygon.centroid()?;
    let rotated = polygon.rotate_around_point(-axis_angle_deg, centroid);
    let rect = rotated.bounding_rect()?;
    let rect_poly: Polygon<f64> = rect.to_polygon();
    Some(rect_poly.rotate_around_point(axis_angle_deg, centroid))
}

/// Build an axis-aligned rectangle polygon
pub fn rect_polygon(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Polygon<f64> {
    Polygon::new(
        LineString::from(vec![
            (min_x, min_y),
            (max_x, min_y),
            (max_x, max_y),
            (min_x, max_y),
            (min_x, min_y),
        ]),
        vec![],
    )
}

/// Centroid as a Point, defaulting to the bounding-box center
pub fn centroid_or_bbox_center(polygon: &Polygon<f64>) -> Option<Point<f64>> {
    polygon.centroid().or_else(|| {
        polygon
            .bounding_rect()
            .map(|r| Point::new((r.min().x + r.max().x) / 2.0, (r.min().y + r.max().y) / 2.0))
    })
}
