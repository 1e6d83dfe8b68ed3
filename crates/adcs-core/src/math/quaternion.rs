//! Quaternion operations for attitude representation
//!
//! Scalar-first quaternion `(w, x, y, z)` representing the rotation from the
//! body frame to the inertial frame. Values are immutable; every operation
//! returns a new quaternion.
//!
//! - Hamilton product: `a * b`
//! - Component-wise sum: `a + b` (NOT rotation composition)
//! - Scalar multiple: `k * q`, `q * k`
//! - Kinematics: q̇ = 1/2 q ⊗ [0; ω] with ω in the body frame

use std::ops::{Add, Mul};

use nalgebra::{Quaternion as NaQuaternion, UnitQuaternion};
use serde::{Deserialize, Serialize};

use crate::Vec3;

/// Scalar-first quaternion
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub w: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Quaternion {
    /// The identity rotation (1, 0, 0, 0)
    pub const IDENTITY: Quaternion = Quaternion::new(1.0, 0.0, 0.0, 0.0);

    pub const fn new(w: f64, x: f64, y: f64, z: f64) -> Self {
        Self { w, x, y, z }
    }

    pub const fn identity() -> Self {
        Self::IDENTITY
    }

    /// Pure quaternion (0, v)
    pub fn pure(v: &Vec3) -> Self {
        Self::new(0.0, v.x, v.y, v.z)
    }

    /// Build from a scalar part and a vector part
    pub fn from_parts(w: f64, v: &Vec3) -> Self {
        Self::new(w, v.x, v.y, v.z)
    }

    /// Rotation of `angle` [rad] about `axis` (normalized here)
    ///
    /// A zero-length axis gives the identity.
    pub fn from_axis_angle(axis: &Vec3, angle: f64) -> Self {
        let norm = axis.norm();
        if norm == 0.0 || !norm.is_finite() {
            return Self::IDENTITY;
        }
        let half = 0.5 * angle;
        Self::from_parts(half.cos(), &(axis * (half.sin() / norm)))
    }

    /// Vector part (x, y, z)
    pub fn vector(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    /// Component-wise scalar multiple
    pub fn scale(&self, k: f64) -> Self {
        Self::new(k * self.w, k * self.x, k * self.y, k * self.z)
    }

    pub fn conjugate(&self) -> Self {
        Self::new(self.w, -self.x, -self.y, -self.z)
    }

    /// Euclidean norm of the four components
    pub fn magnitude(&self) -> f64 {
        (self.w * self.w + self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Unit quaternion in the same direction
    ///
    /// Zero or non-finite magnitude falls back to the identity instead of
    /// dividing by zero.
    pub fn normalize(&self) -> Self {
        let norm = self.magnitude();
        if norm == 0.0 || !norm.is_finite() {
            return Self::IDENTITY;
        }
        self.scale(1.0 / norm)
    }

    /// Rotate `v` by this quaternion: vector part of q ⊗ (0, v) ⊗ q*
    pub fn rotate_vector(&self, v: &Vec3) -> Vec3 {
        (*self * Self::pure(v) * self.conjugate()).vector()
    }

    pub fn dot(&self, other: &Quaternion) -> f64 {
        self.w * other.w + self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn is_finite(&self) -> bool {
        self.w.is_finite() && self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// True if finite and of unit magnitude within `tolerance`
    pub fn is_unit(&self, tolerance: f64) -> bool {
        self.is_finite() && (self.magnitude() - 1.0).abs() <= tolerance
    }

    /// Rotation angle [rad] between two attitudes, in [0, π]
    ///
    /// q and -q describe the same rotation, so the sign is ignored.
    pub fn angle_to(&self, other: &Quaternion) -> f64 {
        // atan2 keeps full precision for small angles, acos of the dot does not
        let delta = self.normalize().conjugate() * other.normalize();
        2.0 * delta.vector().norm().atan2(delta.w.abs())
    }

    pub fn to_unit_quaternion(&self) -> UnitQuaternion<f64> {
        UnitQuaternion::from_quaternion(NaQuaternion::new(self.w, self.x, self.y, self.z))
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl From<UnitQuaternion<f64>> for Quaternion {
    fn from(q: UnitQuaternion<f64>) -> Self {
        Self::new(q.w, q.i, q.j, q.k)
    }
}

impl From<Quaternion> for UnitQuaternion<f64> {
    fn from(q: Quaternion) -> Self {
        q.to_unit_quaternion()
    }
}

impl Add for Quaternion {
    type Output = Quaternion;

    fn add(self, rhs: Quaternion) -> Quaternion {
        Quaternion::new(self.w + rhs.w, self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Mul for Quaternion {
    type Output = Quaternion;

    /// Hamilton product (non-commutative)
    fn mul(self, b: Quaternion) -> Quaternion {
        let a = self;
        Quaternion::new(
            a.w * b.w - a.x * b.x - a.y * b.y - a.z * b.z,
            a.w * b.x + a.x * b.w + a.y * b.z - a.z * b.y,
            a.w * b.y - a.x * b.z + a.y * b.w + a.z * b.x,
            a.w * b.z + a.x * b.y - a.y * b.x + a.z * b.w,
        )
    }
}

impl Mul<f64> for Quaternion {
    type Output = Quaternion;

    fn mul(self, k: f64) -> Quaternion {
        self.scale(k)
    }
}

impl Mul<Quaternion> for f64 {
    type Output = Quaternion;

    fn mul(self, q: Quaternion) -> Quaternion {
        q.scale(self)
    }
}

/// Compute the quaternion derivative given body angular velocity
///
/// q̇ = 1/2 q ⊗ [0; ω]
///
/// # Arguments
/// * `q` - Current attitude (body to inertial)
/// * `omega` - Angular velocity in body frame [rad/s]
pub fn quaternion_derivative(q: &Quaternion, omega: &Vec3) -> Quaternion {
    0.5 * (*q * Quaternion::pure(omega))
}

/// Integrate quaternion using the derivative
///
/// q_new = normalize(q + q̇ * dt)
pub fn integrate_quaternion(q: &Quaternion, q_dot: &Quaternion, dt: f64) -> Quaternion {
    (*q + *q_dot * dt).normalize()
}

/// Exact rotation increment for a constant body rate over `dt`
pub fn rotation_increment(omega: &Vec3, dt: f64) -> Quaternion {
    Quaternion::from_axis_angle(omega, omega.norm() * dt)
}
