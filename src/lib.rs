//! Backlot - buildable backyard geoprocessing pipeline
//!
//! Five pure geometry stages per parcel: local projection, setback
//! envelope, obstacle subtraction, zoning compliance, and unit fit
//! search. See `pipeline::run_pipeline` for the composed entry point.

pub mod core;
pub mod parcel;
pub mod pipeline;
pub mod spatial;
pub mod zoning;
