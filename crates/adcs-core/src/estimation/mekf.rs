//! Multiplicative Extended Kalman Filter (MEKF)
//!
//! Attitude is carried as a reference quaternion; the filter estimates the
//! small three-component attitude error `a` about it and folds the correction
//! back multiplicatively, which keeps the unit-norm constraint without a
//! Lagrange multiplier. Valid as long as the per-tick correction is small.
//!
//! Markley writes the product in reverse (Shuster) order. With the Hamilton
//! product used throughout this crate and `q_ref` the body-to-inertial
//! attitude, his equations read:
//!
//! ```text
//! q̇      = 1/2 q_ref ⊗ [0; ω]
//! v_pred = A(q_ref) r = q_ref* ⊗ r ⊗ q_ref
//! H      = [v_pred]×
//! F      = -[ω]×,  G = I₃
//! Ṗ      = F P + P Fᵀ + G Q Gᵀ - P Hᵀ R⁻¹ H P
//! q_ref  ← q_ref ⊗ (1, a/2)
//! ```

use log::debug;
use serde::{Deserialize, Serialize};

use super::{SensorMeasurement, StateEstimate};
use crate::math::{
    checked_inverse, inertial_to_body, integrate_quaternion, is_positive_definite,
    quaternion_derivative, skew, symmetrize, Quaternion, DEFAULT_SINGULARITY_TOLERANCE,
};
use crate::Mat3;

/// Why a tick skipped the measurement correction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DegradedReason {
    /// Body rate or time step was non-finite, or the time step negative; nothing was propagated
    InvalidPropagation,
    /// Measurement vectors or gyro noise were zero or non-finite
    InvalidMeasurement,
    /// R could not be inverted
    SingularMeasurementNoise,
    /// The open-loop covariance propagation lost positive definiteness
    IndefiniteCovariance,
    /// S could not be inverted, or the correction was not finite or left P indefinite
    SingularInnovation,
}

impl DegradedReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DegradedReason::InvalidPropagation => "InvalidPropagation",
            DegradedReason::InvalidMeasurement => "InvalidMeasurement",
            DegradedReason::SingularMeasurementNoise => "SingularMeasurementNoise",
            DegradedReason::IndefiniteCovariance => "IndefiniteCovariance",
            DegradedReason::SingularInnovation => "SingularInnovation",
        }
    }
}

/// Outcome of one filter update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterStatus {
    /// Propagated and corrected with the measurement
    Corrected,
    /// Propagated only; the correction was skipped for this tick
    PropagateOnly(DegradedReason),
}

impl FilterStatus {
    pub fn is_corrected(&self) -> bool {
        matches!(self, FilterStatus::Corrected)
    }
}

/// Result of [`Mekf::update`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MekfStep {
    /// Updated reference attitude (same value as the state's `q_ref`)
    pub quaternion: Quaternion,
    pub status: FilterStatus,
}

/// Filter tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MekfConfig {
    /// Relative determinant threshold for inverting R and S
    pub singularity_tolerance: f64,
}

impl Default for MekfConfig {
    fn default() -> Self {
        Self {
            singularity_tolerance: DEFAULT_SINGULARITY_TOLERANCE,
        }
    }
}

/// Multiplicative Extended Kalman Filter
#[derive(Debug, Clone, Default)]
pub struct Mekf {
    pub config: MekfConfig,
}

impl Mekf {
    pub fn new(config: MekfConfig) -> Self {
        Self { config }
    }

    /// Propagate the state over `dt` and correct it with one vector measurement
    ///
    /// Mutates `state` in place. Never fails: when a matrix inversion is
    /// near-singular, or the measurement is unusable, the correction is skipped
    /// and the step reports [`FilterStatus::PropagateOnly`]. A non-finite body
    /// rate or time step leaves the state untouched.
    ///
    /// # Arguments
    /// * `state` - Reference attitude, body rate and error covariance
    /// * `measurement` - Vector observation with its noise matrices
    /// * `dt` - Time since the previous update [s]
    pub fn update(&self, state: &mut StateEstimate, measurement: &SensorMeasurement, dt: f64) -> MekfStep {
        if !dt.is_finite() || dt < 0.0 || !state.w_ref.iter().all(|v| v.is_finite()) {
            debug!("MEKF step skipped: dt={} w_ref={:?}", dt, state.w_ref);
            return MekfStep {
                quaternion: state.q_ref,
                status: FilterStatus::PropagateOnly(DegradedReason::InvalidPropagation),
            };
        }

        // Step 1: attitude kinematics
        let q_dot = quaternion_derivative(&state.q_ref, &state.w_ref);
        state.q_ref = integrate_quaternion(&state.q_ref, &q_dot, dt);

        // G = I₃
        let f = -skew(&state.w_ref);
        let p = state.covariance;
        let open_loop = p + (f * p + p * f.transpose() + measurement.gyro_noise) * dt;

        if !measurement.is_usable() {
            return self.propagate_only(state, open_loop, DegradedReason::InvalidMeasurement);
        }

        // Step 2: predicted measurement
        let v_pred = inertial_to_body(&state.q_ref, &measurement.inertial_vector);

        // Step 3: measurement Jacobian
        let h = skew(&v_pred);

        // Step 4: covariance propagation with the measurement information term
        let Some(r_inv) = checked_inverse(&measurement.measurement_noise, self.config.singularity_tolerance) else {
            return self.propagate_only(state, open_loop, DegradedReason::SingularMeasurementNoise);
        };
        if !is_positive_definite(&open_loop) {
            let inflated = p + measurement.gyro_noise * dt;
            return self.propagate_only(state, inflated, DegradedReason::IndefiniteCovariance);
        }
        // Euler step only while the measurement term removes less than half
        // of P in every direction (roughly P < R/2dt)
        let information = p * h.transpose() * r_inv * h * p * dt;
        let p = if is_positive_definite(&(open_loop - 2.0 * information)) {
            symmetrize(&(open_loop - information))
        } else {
            debug!("Riccati step too large, using open-loop covariance");
            symmetrize(&open_loop)
        };

        // Step 5: innovation covariance and Kalman gain
        let s = h * p * h.transpose() + measurement.measurement_noise;
        let Some(s_inv) = checked_inverse(&s, self.config.singularity_tolerance) else {
            return self.propagate_only(state, p, DegradedReason::SingularInnovation);
        };
        let k = p * h.transpose() * s_inv;

        // Step 6: residual and attitude error correction
        let v_perp = measurement.body_vector - v_pred;
        let delta_a = k * v_perp;

        // Step 7: covariance update
        let p_updated = symmetrize(&((Mat3::identity() - k * h) * p));
        if !delta_a.iter().all(|v| v.is_finite()) || !is_positive_definite(&p_updated) {
            return self.propagate_only(state, p, DegradedReason::SingularInnovation);
        }

        // Step 8: multiplicative small-angle correction
        let dq = Quaternion::from_parts(1.0, &(0.5 * delta_a));
        state.q_ref = (state.q_ref * dq).normalize();
        state.covariance = p_updated;

        MekfStep {
            quaternion: state.q_ref,
            status: FilterStatus::Corrected,
        }
    }

    fn propagate_only(&self, state: &mut StateEstimate, covariance: Mat3, reason: DegradedReason) -> MekfStep {
        debug!("MEKF correction skipped: {}", reason.as_str());

        // Keep the last good covariance if the fallback one is unusable
        let covariance = symmetrize(&covariance);
        if is_positive_definite(&covariance) {
            state.covariance = covariance;
        }

        MekfStep {
            quaternion: state.q_ref,
            status: FilterStatus::PropagateOnly(reason),
        }
    }
}

/// One MEKF update with the default tuning, returning the new attitude
pub fn mekf_update(state: &mut StateEstimate, measurement: &SensorMeasurement, dt: f64) -> Quaternion {
    Mekf::default().update(state, measurement, dt).quaternion
}
