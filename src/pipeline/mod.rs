//! The five-stage geoprocessing pipeline

pub mod fit;
pub mod obstacles;
pub mod runner;
pub mod setbacks;

pub use fit::{place_units, test_fit, PlacementResult, RejectedReason};
pub use obstacles::subtract_obstacles;
pub use runner::{run_batch, run_pipeline, BatchItem, PipelineOutcome};
pub use setbacks::{compute_buildable_envelope, EdgeContext, EdgeRole};
