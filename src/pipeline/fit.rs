//! Unit placement search
//!
//! Decides whether a unit footprint fits inside the buildable geometry by
//! sweeping translations on a per-component grid and, when allowed,
//! rotations at a fixed step. Candidate evaluation is parallel; the final
//! selection applies a total order (clearance, keep-clear distance, then
//! lowest x/y/angle) over all collected candidates, so results are
//! deterministic regardless of thread scheduling.
//!
//! Failing to fit is an expected outcome, reported with a reason code.
//! Only cancellation and invalid footprint geometry are errors.

use geo::{Area, BooleanOps, BoundingRect, Contains, EuclideanDistance, Rotate, Translate};
use geo_buffer::buffer_polygon;
use geo_types::{MultiPolygon, Point, Polygon, Rect};
use ordered_float::OrderedFloat;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

use crate::core::config::{FitConfig, PipelineConfig};
use crate::core::error::{BacklotError, Result};
use crate::parcel::UnitSpec;
use crate::spatial::{ops, repair};

/// Why a placement search came up empty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectedReason {
    /// Largest component is smaller than the unit footprint
    InsufficientArea,
    /// No pose fits at the allowed orientations, but a rotation would
    /// plausibly clear the bounding extents
    NoValidRotation,
    /// No pose fits at any searched orientation
    ShapeIncompatible,
    /// Candidate budget exhausted before any valid pose was found
    SearchBudgetExceeded,
}

/// Outcome of a single fit search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacementResult {
    pub fits: bool,
    /// Unit footprint transformed into the local parcel frame
    pub best_placement: Option<Polygon<f64>>,
    /// Clearance plus keep-clear distance; higher is better
    pub score: f64,
    /// Minimum distance from the placed unit to the component boundary
    pub clearance_ft: f64,
    pub rejected_reason: Option<RejectedReason>,
}

impl PlacementResult {
    fn rejected(reason: RejectedReason) -> Self {
        Self {
            fits: false,
            best_placement: None,
            score: 0.0,
            clearance_ft: 0.0,
            rejected_reason: Some(reason),
        }
    }
}

struct Candidate {
    component_idx: usize,
    angle_idx: usize,
    x: f64,
    y: f64,
}

struct Scored {
    clearance: f64,
    keep_clear_dist: f64,
    x: f64,
    y: f64,
    angle_deg: f64,
    placed: Polygon<f64>,
}

/// Search for the best placement of `unit` inside the buildable geometry
///
/// `keep_clear` carries existing-structure footprints (local frame) that
/// placements should stay away from; it only influences scoring, not
/// validity. The cancellation token is checked inside the search loop.
pub fn test_fit(
    buildable: &MultiPolygon<f64>,
    unit: &UnitSpec,
    keep_clear: &[Polygon<f64>],
    config: &FitConfig,
    token: &crate::core::types::CancelToken,
) -> Result<PlacementResult> {
    if token.is_cancelled() {
        return Err(BacklotError::Cancelled);
    }

    let footprint = normalized_footprint(&unit.footprint)?;
    let unit_area = footprint.unsigned_area();

    // Components worth searching, largest first for a stable order
    let mut components: Vec<&Polygon<f64>> = buildable.0.iter().collect();
    components.sort_by(|a, b| {
        b.unsigned_area()
            .partial_cmp(&a.unsigned_area())
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| bbox_key(a).partial_cmp(&bbox_key(b)).unwrap_or(std::cmp::Ordering::Equal))
    });

    // Cheap necessary condition: no containment test can succeed if even
    // the largest component is smaller than the footprint
    let largest_area = components
        .first()
        .map(|c| c.unsigned_area())
        .unwrap_or(0.0);
    if largest_area < unit_area {
        return Ok(PlacementResult::rejected(RejectedReason::InsufficientArea));
    }

    let angles = rotation_angles(unit, &footprint);
    let rotated: Vec<(f64, Polygon<f64>, Rect<f64>)> = angles
        .iter()
        .map(|&angle| {
            let poly = footprint.rotate_around_point(angle, Point::new(0.0, 0.0));
            let bbox = poly.bounding_rect().expect("footprint has a bounding box");
            (angle, poly, bbox)
        })
        .collect();

    let (candidates, budget_exhausted) =
        enumerate_candidates(&components, &rotated, unit_area, config);

    tracing::debug!(
        candidates = candidates.len(),
        components = components.len(),
        rotations = rotated.len(),
        budget_exhausted,
        "fit search"
    );

    let scored: Vec<Scored> = candidates
        .par_iter()
        .filter_map(|candidate| {
            if token.is_cancelled() {
                return None;
            }
            evaluate(candidate, &components, &rotated, keep_clear, config)
        })
        .collect();

    if token.is_cancelled() {
        return Err(BacklotError::Cancelled);
    }

    let best = scored.into_iter().max_by_key(|s| {
        (
            OrderedFloat(s.clearance),
            OrderedFloat(s.keep_clear_dist),
            Reverse(OrderedFloat(s.x)),
            Reverse(OrderedFloat(s.y)),
            Reverse(OrderedFloat(s.angle_deg)),
        )
    });

    match best {
        Some(s) => Ok(PlacementResult {
            fits: true,
            score: s.clearance + s.keep_clear_dist,
            clearance_ft: s.clearance,
            best_placement: Some(s.placed),
            rejected_reason: None,
        }),
        None if budget_exhausted => Ok(PlacementResult::rejected(
            RejectedReason::SearchBudgetExceeded,
        )),
        None if rotation_would_help(unit, &rotated, &components) => Ok(
            PlacementResult::rejected(RejectedReason::NoValidRotation),
        ),
        None => Ok(PlacementResult::rejected(RejectedReason::ShapeIncompatible)),
    }
}

/// Iteratively place up to `config.fit.max_units` units
///
/// After each successful placement the placed footprint, grown by the
/// separation buffer, is subtracted from the remaining buildable area
/// before the next search. Stops at the first failure.
pub fn place_units(
    buildable: &MultiPolygon<f64>,
    unit: &UnitSpec,
    keep_clear: &[Polygon<f64>],
    config: &PipelineConfig,
    token: &crate::core::types::CancelToken,
) -> Result<Vec<PlacementResult>> {
    let mut remaining = buildable.clone();
    let mut placements = Vec::new();

    while placements.len() < config.fit.max_units {
        let result = test_fit(&remaining, unit, keep_clear, &config.fit, token)?;
        let Some(placed) = result.best_placement.clone() else {
            break;
        };

        let separation = config.fit.unit_separation_ft;
        let exclusion = if separation > 0.0 {
            buffer_polygon(&placed, separation)
        } else {
            ops::to_multi(placed)
        };
        remaining = ops::drop_slivers(remaining.difference(&exclusion), config.sliver_min_sqft);
        placements.push(result);
    }

    Ok(placements)
}

/// Repair the footprint and center it on the origin
fn normalized_footprint(footprint: &Polygon<f64>) -> Result<Polygon<f64>> {
    let repaired = repair::repair(footprint)?;
    let center = ops::centroid_or_bbox_center(&repaired).ok_or_else(|| {
        BacklotError::InvalidGeometry("unit footprint has no centroid".into())
    })?;
    Ok(repaired.translate(-center.x(), -center.y()))
}

/// Rotation sweep: none when disallowed, a half turn for footprints with
/// 180-degree symmetry, a full turn otherwise
fn rotation_angles(unit: &UnitSpec, footprint: &Polygon<f64>) -> Vec<f64> {
    if !unit.allow_rotation {
        return vec![0.0];
    }
    let step = unit.rotation_step_deg.max(1.0);
    let sweep = if has_half_turn_symmetry(footprint) {
        180.0
    } else {
        360.0
    };
    let mut angles = Vec::new();
    let mut angle = 0.0;
    while angle < sweep - 1e-9 {
        angles.push(angle);
        angle += step;
    }
    angles
}

/// True when rotating the footprint half a turn maps vertices onto
/// vertices (rectangles and other centrally symmetric shapes)
fn has_half_turn_symmetry(footprint: &Polygon<f64>) -> bool {
    let coords = &footprint.exterior().0;
    let open = &coords[..coords.len().saturating_sub(1)];
    open.iter().all(|c| {
        open.iter()
            .any(|d| (d.x + c.x).abs() < 1e-6 && (d.y + c.y).abs() < 1e-6)
    })
}

fn bbox_key(polygon: &Polygon<f64>) -> (f64, f64) {
    polygon
        .bounding_rect()
        .map(|r| (r.min().x, r.min().y))
        .unwrap_or((f64::INFINITY, f64::INFINITY))
}

/// Deterministic candidate enumeration: component, then angle, then x/y
fn enumerate_candidates(
    components: &[&Polygon<f64>],
    rotated: &[(f64, Polygon<f64>, Rect<f64>)],
    unit_area: f64,
    config: &FitConfig,
) -> (Vec<Candidate>, bool) {
    let mut candidates = Vec::new();
    let mut exhausted = false;

    'outer: for (component_idx, component) in components.iter().enumerate() {
        if component.unsigned_area() < unit_area {
            continue;
        }
        let Some(bbox) = component.bounding_rect() else {
            continue;
        };
        let step = (bbox.width().max(bbox.height()) / config.grid_resolution as f64)
            .max(config.min_grid_step_ft);

        for (angle_idx, (_, _, unit_bbox)) in rotated.iter().enumerate() {
            // Centers that keep the rotated bbox inside the component bbox
            let half_w = unit_bbox.width() / 2.0;
            let half_h = unit_bbox.height() / 2.0;
            let xs = grid_positions(bbox.min().x + half_w, bbox.max().x - half_w, step);
            let ys = grid_positions(bbox.min().y + half_h, bbox.max().y - half_h, step);

            for &x in &xs {
                for &y in &ys {
                    if candidates.len() >= config.max_candidates {
                        exhausted = true;
                        break 'outer;
                    }
                    candidates.push(Candidate {
                        component_idx,
                        angle_idx,
                        x,
                        y,
                    });
                }
            }
        }
    }

    (candidates, exhausted)
}

/// Inclusive grid positions covering [start, end], always including both
/// endpoints so exact-fit placements stay discoverable
fn grid_positions(start: f64, end: f64, step: f64) -> Vec<f64> {
    if end < start - 1e-9 {
        return Vec::new();
    }
    if end - start < 1e-9 {
        return vec![start];
    }
    let count = ((end - start) / step).floor() as usize;
    let mut positions: Vec<f64> = (0..=count).map(|i| start + i as f64 * step).collect();
    if let Some(&last) = positions.last() {
        if last < end - 1e-9 {
            positions.push(end);
        }
    }
    positions
}

fn evaluate(
    candidate: &Candidate,
    components: &[&Polygon<f64>],
    rotated: &[(f64, Polygon<f64>, Rect<f64>)],
    keep_clear: &[Polygon<f64>],
    config: &FitConfig,
) -> Option<Scored> {
    let component = components[candidate.component_idx];
    let (angle_deg, unit_poly, _) = &rotated[candidate.angle_idx];
    let placed = unit_poly.translate(candidate.x, candidate.y);

    if !component.contains(&placed) {
        return None;
    }
    let clearance = ops::boundary_clearance(&placed, component);
    if clearance < config.min_clearance_ft {
        return None;
    }

    let keep_clear_dist = keep_clear
        .iter()
        .map(|kc| placed.euclidean_distance(kc))
        .fold(f64::INFINITY, f64::min);
    let keep_clear_dist = if keep_clear_dist.is_finite() {
        keep_clear_dist
    } else {
        0.0
    };

    Some(Scored {
        clearance,
        keep_clear_dist,
        x: candidate.x,
        y: candidate.y,
        angle_deg: *angle_deg,
        placed,
    })
}

/// Heuristic for the `no_valid_rotation` reason: rotation was disallowed
/// and a quarter turn would let the footprint's extents fit where the
/// fixed orientation cannot
fn rotation_would_help(
    unit: &UnitSpec,
    rotated: &[(f64, Polygon<f64>, Rect<f64>)],
    components: &[&Polygon<f64>],
) -> bool {
    if unit.allow_rotation {
        return false;
    }
    let Some((_, _, unit_bbox)) = rotated.first() else {
        return false;
    };
    let (w, h) = (unit_bbox.width(), unit_bbox.height());

    let mut fixed_fits_somewhere = false;
    let mut swapped_fits_somewhere = false;
    for component in components {
        let Some(bbox) = component.bounding_rect() else {
            continue;
        };
        let (cw, ch) = (bbox.width(), bbox.height());
        if w <= cw && h <= ch {
            fixed_fits_somewhere = true;
        }
        if h <= cw && w <= ch {
            swapped_fits_somewhere = true;
        }
    }
    !fixed_fits_somewhere && swapped_fits_somewhere
}
