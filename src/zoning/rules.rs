//! Structured zoning rules
//!
//! Produced upstream by a text-parsing component; the pipeline treats the
//! whole object as an immutable value and never looks at how it was
//! derived.

use serde::{Deserialize, Serialize};

/// Structured zoning rules for one district
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoningRules {
    /// District code, e.g. "R-1"
    pub code: String,
    pub coverage: CoverageRules,
    #[serde(default)]
    pub density: DensityRules,
    #[serde(default)]
    pub height: HeightRules,
    #[serde(default)]
    pub allowed_uses: Vec<String>,
    #[serde(default)]
    pub conditional_uses: Vec<String>,
    #[serde(default)]
    pub prohibited_uses: Vec<String>,
    /// ADU-specific sub-rules; required when evaluating an ADU
    #[serde(default)]
    pub adu: Option<AduRules>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CoverageRules {
    /// Maximum lot coverage as a fraction (0-1)
    pub lot_coverage_max: f64,
    /// Maximum floor area ratio
    pub far_max: f64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct DensityRules {
    #[serde(default)]
    pub max_units_per_acre: Option<f64>,
    #[serde(default)]
    pub min_lot_area_per_unit_sqft: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeightRules {
    #[serde(default)]
    pub max_feet: Option<f64>,
    #[serde(default)]
    pub max_stories: Option<u32>,
    /// Elements exempt from the height limit ("chimney", "antenna", ...)
    #[serde(default)]
    pub exceptions: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct AduRules {
    #[serde(default)]
    pub max_floor_area_sqft: Option<f64>,
    #[serde(default)]
    pub max_height_ft: Option<f64>,
}

impl HeightRules {
    /// Exact, case-insensitive exception lookup
    pub fn has_exception(&self, claimed: &str) -> bool {
        let needle = claimed.trim().to_lowercase();
        self.exceptions
            .iter()
            .any(|e| e.trim().to_lowercase() == needle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_height_exception_case_insensitive() {
        let height = HeightRules {
            max_feet: Some(30.0),
            max_stories: Some(2),
            exceptions: vec!["Chimney".into(), "antenna".into()],
        };
        assert!(height.has_exception("chimney"));
        assert!(height.has_exception(" ANTENNA "));
        assert!(!height.has_exception("chim"));
        assert!(!height.has_exception("solar panel"));
    }

    #[test]
    fn test_rules_deserialize_with_defaults() {
        let json = r#"{
            "code": "R-1",
            "coverage": { "lot_coverage_max": 0.4, "far_max": 0.6 }
        }"#;
        let rules: ZoningRules = serde_json::from_str(json).unwrap();
        assert_eq!(rules.code, "R-1");
        assert!(rules.adu.is_none());
        assert!(rules.allowed_uses.is_empty());
        assert!(rules.height.max_feet.is_none());
    }
}
