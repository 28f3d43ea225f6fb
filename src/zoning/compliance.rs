//! Zoning compliance evaluation
//!
//! Evaluates a proposed development and the remaining buildable geometry
//! against the district rules. Unlike the geometry stages, this stage is
//! never fail-fast: every rule category is checked and all violations are
//! collected, because partial compliance information is still useful when
//! one category fails. Only a structurally unanswerable question (no ADU
//! rules for an ADU evaluation) is an error.

use ahash::AHashSet;
use geo::Area;
use geo_types::MultiPolygon;
use serde::{Deserialize, Serialize};

use crate::core::error::{BacklotError, Result};
use crate::core::units::sqft_to_acres;
use crate::parcel::{DevelopmentSpec, Parcel};
use crate::zoning::rules::ZoningRules;

/// Fraction of a limit at which a passing value is still flagged
const WARNING_BAND: f64 = 0.95;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

/// One rule violation (or near-miss warning)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    /// Rule category, e.g. "lot_coverage"
    pub rule: String,
    pub severity: Severity,
    pub message: String,
}

/// Outcome of stages 2-4 for one parcel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildableResult {
    /// Remaining buildable geometry in the local frame
    pub buildable: MultiPolygon<f64>,
    pub buildable_area_sqft: f64,
    /// True iff no violation has `Error` severity
    pub compliant: bool,
    /// True when the use requires a conditional use permit
    pub conditional: bool,
    pub violations: Vec<Violation>,
    pub permit_notes: Vec<String>,
}

/// Evaluate a proposed development against the district rules
///
/// Fails with `MissingRule` when the rules lack the section required for
/// the development type (ADU rules for an ADU evaluation). All other
/// negative outcomes are reported as violations, not errors.
pub fn evaluate_compliance(
    buildable: &MultiPolygon<f64>,
    parcel: &Parcel,
    rules: &ZoningRules,
    development: &DevelopmentSpec,
) -> Result<BuildableResult> {
    if !(parcel.lot_area_sqft.is_finite() && parcel.lot_area_sqft > 0.0) {
        return Err(BacklotError::InvalidGeometry(format!(
            "parcel {} has non-positive lot area",
            parcel.apn
        )));
    }
    let adu_rules = if development.is_adu() {
        Some(rules.adu.as_ref().ok_or_else(|| {
            BacklotError::MissingRule(format!(
                "district {} has no ADU rules, required for use '{}'",
                rules.code, development.use_type
            ))
        })?)
    } else {
        None
    };

    let lot_area = parcel.lot_area_sqft;
    let mut violations = Vec::new();
    let mut permit_notes = Vec::new();
    let mut conditional = false;

    // Lot coverage
    check_ratio_limit(
        "lot_coverage",
        development.total_footprint_sqft() / lot_area,
        rules.coverage.lot_coverage_max,
        &format!(
            "lot coverage {:.1}% exceeds maximum {:.1}%",
            100.0 * development.total_footprint_sqft() / lot_area,
            100.0 * rules.coverage.lot_coverage_max
        ),
        &mut violations,
    );

    // Floor area ratio
    check_ratio_limit(
        "far",
        development.total_floor_area_sqft() / lot_area,
        rules.coverage.far_max,
        &format!(
            "FAR {:.2} exceeds maximum {:.2}",
            development.total_floor_area_sqft() / lot_area,
            rules.coverage.far_max
        ),
        &mut violations,
    );

    // Density
    if let Some(max_per_acre) = rules.density.max_units_per_acre {
        let max_units = max_per_acre * sqft_to_acres(lot_area);
        if f64::from(development.units) > max_units {
            violations.push(Violation {
                rule: "density".into(),
                severity: Severity::Error,
                message: format!(
                    "{} units exceeds maximum of {:.1} for {:.2} acres",
                    development.units,
                    max_units,
                    sqft_to_acres(lot_area)
                ),
            });
        }
    }
    if let Some(min_per_unit) = rules.density.min_lot_area_per_unit_sqft {
        let required = min_per_unit * f64::from(development.units);
        if lot_area < required {
            violations.push(Violation {
                rule: "density".into(),
                severity: Severity::Error,
                message: format!(
                    "lot area {lot_area:.0} sq ft below required {required:.0} sq ft for {} units",
                    development.units
                ),
            });
        }
    }

    // Use permission
    match classify_use(&development.use_type, rules) {
        UseStatus::Permitted => {}
        UseStatus::Conditional => {
            conditional = true;
            permit_notes.push(format!(
                "conditional use permit required for '{}'",
                development.use_type
            ));
        }
        UseStatus::Prohibited => {
            violations.push(Violation {
                rule: "use".into(),
                severity: Severity::Error,
                message: format!(
                    "use '{}' is prohibited in district {}",
                    development.use_type, rules.code
                ),
            });
        }
    }

    // Height; a matched exception exempts the feet check only
    let height_exempt = development
        .height_exception
        .as_deref()
        .map(|claimed| rules.height.has_exception(claimed))
        .unwrap_or(false);
    if let (Some(height), Some(max_feet), false) =
        (development.height_ft, rules.height.max_feet, height_exempt)
    {
        if height > max_feet {
            violations.push(Violation {
                rule: "height".into(),
                severity: Severity::Error,
                message: format!("height {height:.1} ft exceeds maximum {max_feet:.1} ft"),
            });
        }
    }
    if let (Some(stories), Some(max_stories)) = (development.stories, rules.height.max_stories) {
        if stories > max_stories {
            violations.push(Violation {
                rule: "height".into(),
                severity: Severity::Error,
                message: format!("{stories} stories exceeds maximum {max_stories}"),
            });
        }
    }

    // ADU sub-rules
    if let Some(adu) = adu_rules {
        if let Some(max_floor) = adu.max_floor_area_sqft {
            if development.floor_area_sqft > max_floor {
                violations.push(Violation {
                    rule: "adu".into(),
                    severity: Severity::Error,
                    message: format!(
                        "ADU floor area {:.0} sq ft exceeds maximum {max_floor:.0} sq ft",
                        development.floor_area_sqft
                    ),
                });
            }
        }
        if let (Some(height), Some(max_height)) = (development.height_ft, adu.max_height_ft) {
            if height > max_height {
                violations.push(Violation {
                    rule: "adu".into(),
                    severity: Severity::Error,
                    message: format!(
                        "ADU height {height:.1} ft exceeds maximum {max_height:.1} ft"
                    ),
                });
            }
        }
    }

    let compliant = !violations.iter().any(|v| v.severity == Severity::Error);
    Ok(BuildableResult {
        buildable: buildable.clone(),
        buildable_area_sqft: buildable.unsigned_area(),
        compliant,
        conditional,
        violations,
        permit_notes,
    })
}

/// Exceeded limit -> Error; passing but within 5% of the limit -> Warning
fn check_ratio_limit(
    rule: &str,
    value: f64,
    limit: f64,
    exceeded_message: &str,
    violations: &mut Vec<Violation>,
) {
    if value > limit {
        violations.push(Violation {
            rule: rule.into(),
            severity: Severity::Error,
            message: exceeded_message.into(),
        });
    } else if limit > 0.0 && value > limit * WARNING_BAND {
        violations.push(Violation {
            rule: rule.into(),
            severity: Severity::Warning,
            message: format!("{rule} at {:.1}% of the allowed maximum", 100.0 * value / limit),
        });
    }
}

enum UseStatus {
    Permitted,
    Conditional,
    Prohibited,
}

fn classify_use(use_type: &str, rules: &ZoningRules) -> UseStatus {
    let normalize = |s: &str| s.trim().to_lowercase();
    let needle = normalize(use_type);

    let prohibited: AHashSet<String> = rules.prohibited_uses.iter().map(|s| normalize(s)).collect();
    if prohibited.contains(&needle) {
        return UseStatus::Prohibited;
    }

    let allowed: AHashSet<String> = rules.allowed_uses.iter().map(|s| normalize(s)).collect();
    if allowed.contains(&needle) {
        return UseStatus::Permitted;
    }

    let conditional: AHashSet<String> =
        rules.conditional_uses.iter().map(|s| normalize(s)).collect();
    if conditional.contains(&needle) {
        return UseStatus::Conditional;
    }

    // Unlisted uses fail closed
    UseStatus::Prohibited
}
