//! Rotation utilities
//!
//! Skew (cross-product) matrices and attitude-matrix helpers used by the
//! filter equations.

use crate::math::Quaternion;
use crate::{Mat3, Vec3};

/// Skew-symmetric matrix from vector (hat operator)
///
/// For v = [x, y, z]^T:
/// ```text
/// [v]× = [ 0  -z   y]
///        [ z   0  -x]
///        [-y   x   0]
/// ```
pub fn skew(v: &Vec3) -> Mat3 {
    Mat3::new(
        0.0, -v.z, v.y,
        v.z, 0.0, -v.x,
        -v.y, v.x, 0.0,
    )
}

/// Express an inertial-frame vector in the body frame
///
/// With `q` the body-to-inertial attitude this is the attitude matrix
/// A(q) = R(q)^T applied to `v`, i.e. the vector part of q* ⊗ (0, v) ⊗ q.
pub fn inertial_to_body(q: &Quaternion, v: &Vec3) -> Vec3 {
    q.conjugate().rotate_vector(v)
}

/// Express a body-frame vector in the inertial frame
pub fn body_to_inertial(q: &Quaternion, v: &Vec3) -> Vec3 {
    q.rotate_vector(v)
}

/// Small-angle rotation vector from `q_reference` to `q`, in the body frame
///
/// Returns δθ such that q ≈ q_reference ⊗ (1, δθ/2).
pub fn attitude_error(q_reference: &Quaternion, q: &Quaternion) -> Vec3 {
    let mut dq = q_reference.conjugate() * *q;
    if dq.w < 0.0 {
        dq = dq.scale(-1.0);
    }

    let sin_half = dq.vector().norm();
    if sin_half < 1e-12 {
        return 2.0 * dq.vector();
    }

    let angle = 2.0 * sin_half.atan2(dq.w);
    dq.vector() * (angle / sin_half)
}
