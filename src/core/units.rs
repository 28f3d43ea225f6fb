//! Unit conversion constants shared across the pipeline
//!
//! The local frame projects to international feet; storage geometry is
//! WGS84 degrees. Everything the pipeline reports is square feet.

/// International feet per meter
pub const FEET_PER_METER: f64 = 3.280_839_895_013_123;

/// Meters per international foot
pub const METERS_PER_FOOT: f64 = 0.3048;

/// Square feet per acre
pub const SQFT_PER_ACRE: f64 = 43_560.0;

/// Mean Earth radius in meters (IUGG mean radius)
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Mean Earth radius in international feet
pub const EARTH_RADIUS_FT: f64 = EARTH_RADIUS_M * FEET_PER_METER;

/// Convert square feet to acres
pub fn sqft_to_acres(sqft: f64) -> f64 {
    sqft / SQFT_PER_ACRE
}
