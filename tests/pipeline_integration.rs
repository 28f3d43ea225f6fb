//! End-to-end tests for the geoprocessing pipeline
//!
//! Parcels are built in WGS84 by inverting a local frame, so the local
//! dimensions are known in feet and the spec scenarios can be asserted
//! directly against pipeline output.

use backlot::core::config::PipelineConfig;
use backlot::core::error::BacklotError;
use backlot::core::types::{CancelToken, ParcelId};
use backlot::parcel::{
    DevelopmentSpec, Obstacle, ObstacleCategory, Parcel, SetbackSpec, UnitSpec,
};
use backlot::pipeline::{run_batch, run_pipeline, BatchItem, RejectedReason};
use backlot::spatial::LocalFrame;
use backlot::zoning::rules::{AduRules, CoverageRules, DensityRules, HeightRules, ZoningRules};
use backlot::zoning::Severity;

use geo::{Area, Contains};
use geo_types::{Coord, LineString, Polygon};

const CENTER_LON: f64 = -122.4194;
const CENTER_LAT: f64 = 37.7749;

fn frame() -> LocalFrame {
    LocalFrame {
        center_lon: CENTER_LON,
        center_lat: CENTER_LAT,
    }
}

/// WGS84 rectangle whose local-frame footprint is `w x h` feet centered
/// at `(cx, cy)`
fn wgs84_rect(cx: f64, cy: f64, w: f64, h: f64) -> Polygon<f64> {
    let f = frame();
    let corners = [
        (cx - w / 2.0, cy - h / 2.0),
        (cx + w / 2.0, cy - h / 2.0),
        (cx + w / 2.0, cy + h / 2.0),
        (cx - w / 2.0, cy + h / 2.0),
        (cx - w / 2.0, cy - h / 2.0),
    ];
    let ring: Vec<Coord<f64>> = corners
        .iter()
        .map(|&(x, y)| f.inverse(Coord { x, y }))
        .collect();
    Polygon::new(LineString(ring), vec![])
}

fn parcel_100x80() -> Parcel {
    Parcel {
        id: ParcelId::new(),
        apn: "100-080-001".into(),
        boundary: wgs84_rect(0.0, 0.0, 100.0, 80.0),
        lot_area_sqft: 8000.0,
        frontage_ft: Some(100.0),
        zoning_code: "R-1".into(),
        region: "testville".into(),
        corner_lot: false,
        frontage_bearing_deg: None,
    }
}

fn rules() -> ZoningRules {
    ZoningRules {
        code: "R-1".into(),
        coverage: CoverageRules {
            lot_coverage_max: 0.4,
            far_max: 0.6,
        },
        density: DensityRules {
            max_units_per_acre: Some(20.0),
            min_lot_area_per_unit_sqft: Some(1000.0),
        },
        height: HeightRules {
            max_feet: Some(30.0),
            max_stories: Some(2),
            exceptions: vec!["chimney".into()],
        },
        allowed_uses: vec![
            "single family dwelling".into(),
            "accessory dwelling unit".into(),
        ],
        conditional_uses: vec!["daycare".into()],
        prohibited_uses: vec!["commercial".into()],
        adu: Some(AduRules {
            max_floor_area_sqft: Some(1200.0),
            max_height_ft: Some(18.0),
        }),
    }
}

fn adu_development() -> DevelopmentSpec {
    DevelopmentSpec {
        use_type: "accessory dwelling unit".into(),
        units: 1,
        footprint_sqft: 1200.0,
        floor_area_sqft: 1200.0,
        height_ft: Some(16.0),
        stories: Some(1),
        existing_building_sqft: 0.0,
        existing_floor_area_sqft: 0.0,
        height_exception: None,
    }
}

fn standard_setbacks() -> SetbackSpec {
    SetbackSpec {
        front: 25.0,
        rear: 15.0,
        side: 5.0,
        corner_side: 15.0,
    }
}

#[test]
fn test_square_lot_no_obstacles() {
    // 100x80 parcel, front=25 rear=15 side=5: 90x40 envelope, 3600 sq ft,
    // and a 1200 sq ft unit fits with rotation allowed
    let outcome = run_pipeline(
        &parcel_100x80(),
        &standard_setbacks(),
        &[],
        &rules(),
        &UnitSpec::rectangle(30.0, 40.0),
        &adu_development(),
        &PipelineConfig::default(),
        &CancelToken::new(),
    )
    .unwrap();

    assert!(
        (outcome.envelope_area_sqft - 3600.0).abs() < 5.0,
        "envelope area {}",
        outcome.envelope_area_sqft
    );
    assert!((outcome.buildable.buildable_area_sqft - 3600.0).abs() < 5.0);
    assert!(outcome.buildable.compliant);
    assert!(outcome.placement.fits);

    let placed = outcome.placement.best_placement.as_ref().unwrap();
    assert!((placed.unsigned_area() - 1200.0).abs() < 1e-6);
    assert!(outcome.placement_wgs84.is_some());
}

#[test]
fn test_placement_contained_in_buildable() {
    let outcome = run_pipeline(
        &parcel_100x80(),
        &standard_setbacks(),
        &[],
        &rules(),
        &UnitSpec::rectangle(24.0, 30.0),
        &adu_development(),
        &PipelineConfig::default(),
        &CancelToken::new(),
    )
    .unwrap();

    let placed = outcome.placement.best_placement.as_ref().unwrap();
    assert!(outcome
        .buildable
        .buildable
        .0
        .iter()
        .any(|component| component.contains(placed)));
}

#[test]
fn test_oversized_setbacks_zero_buildable() {
    let setbacks = SetbackSpec {
        front: 60.0,
        rear: 60.0,
        side: 5.0,
        corner_side: 15.0,
    };
    let outcome = run_pipeline(
        &parcel_100x80(),
        &setbacks,
        &[],
        &rules(),
        &UnitSpec::rectangle(30.0, 40.0),
        &adu_development(),
        &PipelineConfig::default(),
        &CancelToken::new(),
    )
    .unwrap();

    assert_eq!(outcome.envelope_area_sqft, 0.0);
    assert_eq!(outcome.buildable.buildable_area_sqft, 0.0);
    assert!(!outcome.placement.fits);
    assert_eq!(
        outcome.placement.rejected_reason,
        Some(RejectedReason::InsufficientArea)
    );
}

#[test]
fn test_obstacle_fragmentation_blocks_wide_unit() {
    // Zero setbacks: envelope is the whole 100x40 parcel. A pool band
    // buffered to span the full height splits it into two 40x40 halves;
    // a 60x10 unit exceeds both halves at every rotation even though the
    // combined remaining area dwarfs the footprint.
    let parcel = Parcel {
        boundary: wgs84_rect(0.0, 0.0, 100.0, 40.0),
        lot_area_sqft: 4000.0,
        ..parcel_100x80()
    };
    let pool = Obstacle::new(
        ObstacleCategory::Pool,
        wgs84_rect(0.0, 0.0, 10.0, 32.0),
    );

    let outcome = run_pipeline(
        &parcel,
        &SetbackSpec::uniform(0.0),
        &[pool],
        &rules(),
        &UnitSpec::rectangle(60.0, 10.0),
        &adu_development(),
        &PipelineConfig::default(),
        &CancelToken::new(),
    )
    .unwrap();

    assert_eq!(outcome.buildable.buildable.0.len(), 2);
    let total = outcome.buildable.buildable_area_sqft;
    assert!(total > 3000.0, "remaining area {total}");

    assert!(!outcome.placement.fits);
    assert_eq!(
        outcome.placement.rejected_reason,
        Some(RejectedReason::ShapeIncompatible)
    );
}

#[test]
fn test_unit_fits_in_one_fragment() {
    let parcel = Parcel {
        boundary: wgs84_rect(0.0, 0.0, 100.0, 40.0),
        lot_area_sqft: 4000.0,
        ..parcel_100x80()
    };
    let pool = Obstacle::new(
        ObstacleCategory::Pool,
        wgs84_rect(0.0, 0.0, 10.0, 32.0),
    );

    let outcome = run_pipeline(
        &parcel,
        &SetbackSpec::uniform(0.0),
        &[pool],
        &rules(),
        &UnitSpec::rectangle(30.0, 30.0),
        &adu_development(),
        &PipelineConfig::default(),
        &CancelToken::new(),
    )
    .unwrap();

    assert!(outcome.placement.fits);
    let placed = outcome.placement.best_placement.as_ref().unwrap();
    assert!(outcome
        .buildable
        .buildable
        .0
        .iter()
        .any(|component| component.contains(placed)));
}

#[test]
fn test_compliance_aggregation_reports_both_violations() {
    // Exceeds both coverage (50% > 40%) and FAR (0.8 > 0.6): exactly two
    // error violations, one per rule, and the pipeline still completes
    let development = DevelopmentSpec {
        use_type: "single family dwelling".into(),
        units: 1,
        footprint_sqft: 4000.0,
        floor_area_sqft: 6400.0,
        height_ft: Some(25.0),
        stories: Some(2),
        existing_building_sqft: 0.0,
        existing_floor_area_sqft: 0.0,
        height_exception: None,
    };

    let outcome = run_pipeline(
        &parcel_100x80(),
        &standard_setbacks(),
        &[],
        &rules(),
        &UnitSpec::rectangle(30.0, 40.0),
        &development,
        &PipelineConfig::default(),
        &CancelToken::new(),
    )
    .unwrap();

    assert!(!outcome.buildable.compliant);
    let errors: Vec<_> = outcome
        .buildable
        .violations
        .iter()
        .filter(|v| v.severity == Severity::Error)
        .collect();
    assert_eq!(errors.len(), 2);
    assert!(errors.iter().any(|v| v.rule == "lot_coverage"));
    assert!(errors.iter().any(|v| v.rule == "far"));

    // Non-compliance is not a geometric failure; the fit search still ran
    assert!(outcome.placement.fits);
}

#[test]
fn test_missing_adu_rules_is_an_error_not_a_result() {
    let mut district = rules();
    district.adu = None;
    let result = run_pipeline(
        &parcel_100x80(),
        &standard_setbacks(),
        &[],
        &district,
        &UnitSpec::rectangle(30.0, 40.0),
        &adu_development(),
        &PipelineConfig::default(),
        &CancelToken::new(),
    );
    assert!(matches!(result, Err(BacklotError::MissingRule(_))));
}

#[test]
fn test_invalid_parcel_is_an_error_not_a_result() {
    // Self-intersecting boundary: "could not be evaluated", never
    // "evaluated as non-buildable"
    let f = frame();
    let ring: Vec<Coord<f64>> = [
        (0.0, 0.0),
        (50.0, 50.0),
        (50.0, 0.0),
        (0.0, 50.0),
        (0.0, 0.0),
    ]
    .iter()
    .map(|&(x, y)| f.inverse(Coord { x, y }))
    .collect();
    let parcel = Parcel {
        boundary: Polygon::new(LineString(ring), vec![]),
        ..parcel_100x80()
    };

    let result = run_pipeline(
        &parcel,
        &standard_setbacks(),
        &[],
        &rules(),
        &UnitSpec::rectangle(30.0, 40.0),
        &adu_development(),
        &PipelineConfig::default(),
        &CancelToken::new(),
    );
    assert!(matches!(result, Err(BacklotError::InvalidGeometry(_))));
}

#[test]
fn test_cancellation_before_start() {
    let token = CancelToken::new();
    token.cancel();
    let result = run_pipeline(
        &parcel_100x80(),
        &standard_setbacks(),
        &[],
        &rules(),
        &UnitSpec::rectangle(30.0, 40.0),
        &adu_development(),
        &PipelineConfig::default(),
        &token,
    );
    assert!(matches!(result, Err(BacklotError::Cancelled)));
}

#[test]
fn test_structure_obstacle_excluded_and_avoided() {
    // Existing garage inside the envelope both shrinks the buildable
    // area and repels the placement
    let garage = Obstacle::new(ObstacleCategory::Structure, wgs84_rect(-35.0, 5.0, 20.0, 20.0));

    let outcome = run_pipeline(
        &parcel_100x80(),
        &standard_setbacks(),
        &[garage],
        &rules(),
        &UnitSpec::rectangle(20.0, 20.0),
        &adu_development(),
        &PipelineConfig::default(),
        &CancelToken::new(),
    )
    .unwrap();

    assert!(outcome.buildable.buildable_area_sqft < outcome.envelope_area_sqft);
    assert!(outcome.placement.fits);
}

#[test]
fn test_batch_processing() {
    let items: Vec<BatchItem> = (0..4)
        .map(|i| BatchItem {
            parcel: Parcel {
                apn: format!("100-080-{i:03}"),
                ..parcel_100x80()
            },
            obstacles: vec![],
            development: adu_development(),
        })
        .collect();

    let results = run_batch(
        &items,
        &standard_setbacks(),
        &rules(),
        &UnitSpec::rectangle(30.0, 40.0),
        &PipelineConfig::default(),
        &CancelToken::new(),
    );

    assert_eq!(results.len(), 4);
    for result in &results {
        let outcome = result.as_ref().unwrap();
        assert!(outcome.placement.fits);
    }
}

#[test]
fn test_batch_cancellation() {
    let token = CancelToken::new();
    token.cancel();
    let items = vec![BatchItem {
        parcel: parcel_100x80(),
        obstacles: vec![],
        development: adu_development(),
    }];
    let results = run_batch(
        &items,
        &standard_setbacks(),
        &rules(),
        &UnitSpec::rectangle(30.0, 40.0),
        &PipelineConfig::default(),
        &token,
    );
    assert!(matches!(results[0], Err(BacklotError::Cancelled)));
}

#[test]
fn test_determinism_across_runs() {
    let run = || {
        run_pipeline(
            &parcel_100x80(),
            &standard_setbacks(),
            &[Obstacle::new(
                ObstacleCategory::Tree,
                wgs84_rect(10.0, 10.0, 6.0, 6.0),
            )],
            &rules(),
            &UnitSpec::rectangle(24.0, 30.0),
            &adu_development(),
            &PipelineConfig::default(),
            &CancelToken::new(),
        )
        .unwrap()
    };

    let first = run();
    let second = run();
    assert_eq!(
        first.placement.best_placement.as_ref().unwrap().exterior(),
        second.placement.best_placement.as_ref().unwrap().exterior()
    );
    assert_eq!(first.placement.clearance_ft, second.placement.clearance_ft);
}
