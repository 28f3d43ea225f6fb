//! Zoning rules and compliance evaluation

pub mod compliance;
pub mod rules;

pub use compliance::{BuildableResult, Severity, Violation};
pub use rules::ZoningRules;
