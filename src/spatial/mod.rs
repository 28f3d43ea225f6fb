//! Geometry foundations: validity repair, local projection, polygon helpers

pub mod frame;
pub mod ops;
pub mod repair;

pub use frame::LocalFrame;
