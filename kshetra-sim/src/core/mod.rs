//! Geometry primitives for the simulator.
//!
//! - [`Vec2`] and [`Vec3`]: immutable vector and pose values
//! - [`LineSegmentFeature`]: static obstacle edge with ray intersection
//! - [`math`]: angle normalization helpers

pub mod math;
mod segment;
mod vector;

pub use math::{angle_diff, normalize_angle};
pub use segment::LineSegmentFeature;
pub use vector::{Vec2, Vec3};
