//! Fixed-size linear algebra helpers
//!
//! The filter only ever inverts 3x3 matrices, so dimensions are checked at
//! compile time through `nalgebra` statically sized types. These helpers add
//! the near-singularity detection the estimator relies on.

use nalgebra::Cholesky;

use crate::Mat3;

/// Default relative determinant tolerance for [`checked_inverse`]
pub const DEFAULT_SINGULARITY_TOLERANCE: f64 = 1e-12;

/// Invert `m`, refusing near-singular or non-finite input
///
/// The test is scale-invariant: `m` is rejected when
/// `|det(m)| <= tolerance * ||m||_F^3`.
pub fn checked_inverse(m: &Mat3, tolerance: f64) -> Option<Mat3> {
    if !is_finite(m) {
        return None;
    }

    let scale = m.norm();
    if scale == 0.0 {
        return None;
    }

    let det = m.determinant();
    if !det.is_finite() || det.abs() <= tolerance * scale.powi(3) {
        return None;
    }

    m.try_inverse().filter(is_finite)
}

/// Average `m` with its transpose
pub fn symmetrize(m: &Mat3) -> Mat3 {
    0.5 * (m + m.transpose())
}

pub fn is_finite(m: &Mat3) -> bool {
    m.iter().all(|v| v.is_finite())
}

/// Symmetric positive definite test via Cholesky factorization
pub fn is_positive_definite(m: &Mat3) -> bool {
    let m = symmetrize(m);
    is_finite(&m) && Cholesky::new(m).is_some()
}
