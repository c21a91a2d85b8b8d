//! 2D vector and pose value types.
//!
//! Both types are `Copy` values. Arithmetic returns new values; the only
//! mutating operation is the explicitly named [`Vec2::scale_in_place`].

use super::math::normalize_angle;
use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Neg, Sub};

/// A 2D vector (x, y).
///
/// Used for positions, directions and control commands
/// (linear velocity, angular velocity).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    /// X component
    pub x: f64,
    /// Y component
    pub y: f64,
}

impl Vec2 {
    /// Create a new vector
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Additive identity
    #[inline]
    pub const fn zero() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    /// Unit vector pointing along `angle` (radians from +X)
    #[inline]
    pub fn from_angle(angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self { x: cos, y: sin }
    }

    /// Component-wise sum
    #[inline]
    pub fn plus(self, other: Vec2) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }

    /// Component-wise difference
    #[inline]
    pub fn minus(self, other: Vec2) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }

    /// Scaled copy
    #[inline]
    pub fn scale(self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    /// Scale this vector in place and return it for chaining.
    #[inline]
    pub fn scale_in_place(&mut self, factor: f64) -> &mut Self {
        self.x *= factor;
        self.y *= factor;
        self
    }

    /// Dot product
    #[inline]
    pub fn dot(self, other: Vec2) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// 2D cross product (z component of the 3D cross product)
    #[inline]
    pub fn cross(self, other: Vec2) -> f64 {
        self.x * other.y - self.y * other.x
    }

    /// Euclidean length
    #[inline]
    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Squared length (avoids sqrt)
    #[inline]
    pub fn length_squared(self) -> f64 {
        self.dot(self)
    }

    /// Distance to another point
    #[inline]
    pub fn distance(self, other: Vec2) -> f64 {
        self.minus(other).length()
    }

    /// Unit vector in the same direction, or zero for a zero vector.
    #[inline]
    pub fn normalized(self) -> Self {
        let len = self.length();
        if len > 0.0 {
            self.scale(1.0 / len)
        } else {
            Self::zero()
        }
    }

    /// Vector rotated counter-clockwise by `angle`
    #[inline]
    pub fn rotated(self, angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }

    /// Both components are finite
    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Vec2 {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        self.plus(rhs)
    }
}

impl Sub for Vec2 {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        self.minus(rhs)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: f64) -> Self {
        self.scale(rhs)
    }
}

impl Neg for Vec2 {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

/// A robot pose (x, y, theta).
///
/// `theta` is the heading in radians, counter-clockwise from +X, and is kept
/// in (-π, π] by every constructor and arithmetic operation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    /// X position
    pub x: f64,
    /// Y position
    pub y: f64,
    /// Heading (radians, (-π, π])
    pub theta: f64,
}

impl Vec3 {
    /// Create a new pose. `theta` is normalized to (-π, π].
    #[inline]
    pub fn new(x: f64, y: f64, theta: f64) -> Self {
        Self {
            x,
            y,
            theta: normalize_angle(theta),
        }
    }

    /// Additive identity (origin, facing +X)
    #[inline]
    pub const fn zero() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            theta: 0.0,
        }
    }

    /// Pose at `position` with heading `theta`
    #[inline]
    pub fn from_position(position: Vec2, theta: f64) -> Self {
        Self::new(position.x, position.y, theta)
    }

    /// Position part
    #[inline]
    pub fn position(self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Unit heading vector
    #[inline]
    pub fn heading(self) -> Vec2 {
        Vec2::from_angle(self.theta)
    }

    /// Component-wise sum; heading re-wrapped
    #[inline]
    pub fn plus(self, other: Vec3) -> Self {
        Self::new(self.x + other.x, self.y + other.y, self.theta + other.theta)
    }

    /// Component-wise difference; heading difference is the shortest signed
    /// rotation
    #[inline]
    pub fn minus(self, other: Vec3) -> Self {
        Self::new(self.x - other.x, self.y - other.y, self.theta - other.theta)
    }

    /// Scaled copy; heading re-wrapped
    #[inline]
    pub fn scale(self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor, self.theta * factor)
    }

    /// All components are finite
    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.theta.is_finite()
    }
}

impl Add for Vec3 {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        self.plus(rhs)
    }
}

impl Sub for Vec3 {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        self.minus(rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_vec2_arithmetic_does_not_mutate() {
        let a = Vec2::new(1.0, 2.0);
        let b = Vec2::new(3.0, -1.0);

        assert_eq!(a.plus(b), Vec2::new(4.0, 1.0));
        assert_eq!(a.minus(b), Vec2::new(-2.0, 3.0));
        assert_eq!(a.scale(2.0), Vec2::new(2.0, 4.0));
        assert_eq!(a, Vec2::new(1.0, 2.0));
        assert_eq!(a + b, a.plus(b));
        assert_eq!(a - b, a.minus(b));
        assert_eq!(a * 2.0, a.scale(2.0));
    }

    #[test]
    fn test_vec2_scale_in_place() {
        let mut v = Vec2::new(1.0, -2.0);
        v.scale_in_place(3.0).scale_in_place(0.5);
        assert_eq!(v, Vec2::new(1.5, -3.0));
    }

    #[test]
    fn test_vec2_zero_is_identity() {
        let v = Vec2::new(4.5, -7.25);
        assert_eq!(v.plus(Vec2::zero()), v);
        assert_eq!(Vec2::zero().length(), 0.0);
        assert_eq!(Vec2::zero().normalized(), Vec2::zero());
    }

    #[test]
    fn test_vec2_products() {
        let x = Vec2::new(1.0, 0.0);
        let y = Vec2::new(0.0, 1.0);
        assert_eq!(x.dot(y), 0.0);
        assert_eq!(x.cross(y), 1.0);
        assert_eq!(y.cross(x), -1.0);
        assert_relative_eq!(Vec2::new(3.0, 4.0).length(), 5.0);
    }

    #[test]
    fn test_vec2_rotation() {
        let v = Vec2::new(1.0, 0.0).rotated(FRAC_PI_2);
        assert_relative_eq!(v.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(v.y, 1.0, epsilon = 1e-12);

        let h = Vec2::from_angle(PI);
        assert_relative_eq!(h.x, -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_vec3_wraps_heading() {
        let p = Vec3::new(0.0, 0.0, 2.5 * PI);
        assert_relative_eq!(p.theta, FRAC_PI_2, epsilon = 1e-9);

        let p = Vec3::new(1.0, 2.0, -5.0 * FRAC_PI_2);
        assert_relative_eq!(p.theta, -FRAC_PI_2, epsilon = 1e-9);
    }

    #[test]
    fn test_vec3_minus_takes_shortest_rotation() {
        let a = Vec3::new(1.0, 1.0, 0.9 * PI);
        let b = Vec3::new(0.0, 0.0, -0.9 * PI);
        let d = a.minus(b);
        assert_relative_eq!(d.x, 1.0);
        assert_relative_eq!(d.theta, -0.2 * PI, epsilon = 1e-9);
    }

    #[test]
    fn test_vec3_heading() {
        let p = Vec3::new(5.0, -1.0, FRAC_PI_2);
        let h = p.heading();
        assert_relative_eq!(h.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(h.y, 1.0, epsilon = 1e-12);
        assert_eq!(p.position(), Vec2::new(5.0, -1.0));
    }
}
