//! Angle utilities.
//!
//! All angles are in radians, counter-clockwise positive from +X.

use std::f64::consts::{PI, TAU};

/// Normalize angle to (-π, π].
///
/// Works for any finite input, including headings that wrapped many full
/// turns. Non-finite input is returned unchanged.
///
/// # Example
/// ```
/// use kshetra_sim::core::math::normalize_angle;
/// use std::f64::consts::PI;
///
/// // 3π lands on the seam; floating-point may give either side of it
/// assert!((normalize_angle(3.0 * PI).abs() - PI).abs() < 1e-9);
/// assert!((normalize_angle(-PI) - PI).abs() < 1e-9);
/// assert!((normalize_angle(PI / 2.0) - PI / 2.0).abs() < 1e-12);
/// ```
#[inline]
pub fn normalize_angle(angle: f64) -> f64 {
    if !angle.is_finite() {
        return angle;
    }
    let a = angle.rem_euclid(TAU);
    if a > PI { a - TAU } else { a }
}

/// Signed shortest angular distance from `from` to `to`, in (-π, π].
#[inline]
pub fn angle_diff(from: f64, to: f64) -> f64 {
    normalize_angle(to - from)
}

/// Check whether a heading lies in the canonical range (-π, π].
#[inline]
pub fn is_normalized(angle: f64) -> bool {
    angle > -PI && angle <= PI
}
