//! TRIAD attitude solver
//!
//! Optimized quaternion form of TRIAD from "Fast Quaternion Attitude
//! Estimation From Two Vector Measurements" (Markley, 2002), Eqs. 31-35.
//!
//! The first pair is trusted more than the second: the solution aligns
//! `b1` with `r1` exactly and uses `b2`/`r2` only to fix the rotation about
//! that axis.
//!
//! The returned quaternion is the body-to-inertial attitude, so for
//! consistent inputs `q* ⊗ r_i ⊗ q = b_i`.

use serde::{Deserialize, Serialize};

use crate::math::Quaternion;
use crate::Vec3;

/// Threshold below which a geometric quantity is treated as zero
pub const DEGENERACY_TOLERANCE: f64 = 1e-9;

/// Outcome of a TRIAD solution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriadStatus {
    /// A valid attitude was computed
    Success,
    /// `b1` points opposite to `r1` (1 + b1·r1 ≈ 0)
    AntiParallel,
    /// One of the vector pairs is (anti)collinear, rotation about it is unobservable
    Collinear,
    /// Both μ and ν vanish
    Singular,
    /// A normalization would divide by zero or produced a non-finite value
    NormalizationError,
}

impl TriadStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, TriadStatus::Success)
    }

    /// Variant name as a static string for logs
    pub fn as_str(&self) -> &'static str {
        match self {
            TriadStatus::Success => "Success",
            TriadStatus::AntiParallel => "AntiParallel",
            TriadStatus::Collinear => "Collinear",
            TriadStatus::Singular => "Singular",
            TriadStatus::NormalizationError => "NormalizationError",
        }
    }
}

/// TRIAD output
///
/// On failure `quaternion` is the identity; callers must branch on `status`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TriadResult {
    pub quaternion: Quaternion,
    pub status: TriadStatus,
}

impl TriadResult {
    fn success(quaternion: Quaternion) -> Self {
        Self {
            quaternion,
            status: TriadStatus::Success,
        }
    }

    fn failure(status: TriadStatus) -> Self {
        Self {
            quaternion: Quaternion::IDENTITY,
            status,
        }
    }

    /// The attitude, if the solution succeeded
    pub fn attitude(&self) -> Option<Quaternion> {
        match self.status {
            TriadStatus::Success => Some(self.quaternion),
            TriadStatus::AntiParallel
            | TriadStatus::Collinear
            | TriadStatus::Singular
            | TriadStatus::NormalizationError => None,
        }
    }
}

fn unit(v: &Vec3) -> Option<Vec3> {
    let norm = v.norm();
    if norm == 0.0 || !norm.is_finite() {
        return None;
    }
    Some(v / norm)
}

/// Compute the attitude from two vector pairs
///
/// # Arguments
/// * `r1` - More accurate reference vector, inertial frame (e.g. sun model)
/// * `r2` - Less accurate reference vector, inertial frame (e.g. geomagnetic model)
/// * `b1` - Measurement of `r1` in the body frame (e.g. sun sensor)
/// * `b2` - Measurement of `r2` in the body frame (e.g. magnetometer)
///
/// # Returns
/// Body-to-inertial attitude and a status. Never panics; every degenerate
/// configuration yields the identity with a failure status.
pub fn triad(r1: &Vec3, r2: &Vec3, b1: &Vec3, b2: &Vec3) -> TriadResult {
    let (Some(r1), Some(r2), Some(b1), Some(b2)) = (unit(r1), unit(r2), unit(b1), unit(b2)) else {
        return TriadResult::failure(TriadStatus::NormalizationError);
    };

    // Not normalized, only their directions and relative scale matter
    let r3 = r1.cross(&r2);
    let b3 = b1.cross(&b2);

    if b3.norm() < DEGENERACY_TOLERANCE || r3.norm() < DEGENERACY_TOLERANCE {
        return TriadResult::failure(TriadStatus::Collinear);
    }

    let one_plus_dot = 1.0 + b1.dot(&r1);
    if one_plus_dot < DEGENERACY_TOLERANCE {
        return TriadResult::failure(TriadStatus::AntiParallel);
    }

    // Eq. 31
    let mu = one_plus_dot * b3.dot(&r3) - b1.dot(&r3) * r1.dot(&b3);
    // Eq. 32
    let b1_plus_r1 = b1 + r1;
    let nu = b1_plus_r1.dot(&b3.cross(&r3));
    // Eq. 33
    let rho = (mu * mu + nu * nu).sqrt();

    if rho < DEGENERACY_TOLERANCE {
        return TriadResult::failure(TriadStatus::Singular);
    }

    let b1_cross_r1 = b1.cross(&r1);

    // Eq. 35a / 35b, picked by the sign of μ to avoid cancellation
    let (w, v, s) = if mu >= 0.0 {
        let s = rho + mu;
        (s * one_plus_dot, s * b1_cross_r1 + nu * b1_plus_r1, s)
    } else {
        let s = rho - mu;
        (nu * one_plus_dot, nu * b1_cross_r1 + s * b1_plus_r1, s)
    };

    let sqrt_term = rho * s * one_plus_dot;
    if sqrt_term.is_nan() || sqrt_term < DEGENERACY_TOLERANCE {
        return TriadResult::failure(TriadStatus::NormalizationError);
    }
    let scale = 0.5 / sqrt_term.sqrt();

    let q = Quaternion::from_parts(w * scale, &(v * scale));
    if !q.is_finite() || q.magnitude() == 0.0 {
        return TriadResult::failure(TriadStatus::NormalizationError);
    }

    TriadResult::success(q.normalize())
}
