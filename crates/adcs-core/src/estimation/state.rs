//! Filter state and measurement containers

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::math::{is_finite, is_positive_definite, Quaternion};
use crate::{Mat3, Vec3};

/// Errors raised when building a filter state
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EstimationError {
    #[error("initial covariance must be finite, symmetric and positive definite")]
    InvalidCovariance,

    #[error("initial attitude is not a finite non-zero quaternion")]
    InvalidAttitude,

    #[error("initial angular velocity is not finite")]
    InvalidAngularVelocity,
}

/// Current estimated state with its uncertainty
///
/// Owned by the orchestrator and mutated in place once per tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateEstimate {
    /// Reference attitude (body to inertial)
    pub q_ref: Quaternion,
    /// Angular velocity in the body frame [rad/s], latest gyro reading
    pub w_ref: Vec3,
    /// 3x3 attitude error covariance [rad²]
    pub covariance: Mat3,
}

impl StateEstimate {
    /// Create a state, validating the covariance
    ///
    /// A zero covariance would make the Kalman gain vanish and the filter
    /// would never correct, so it is rejected here.
    pub fn new(q_ref: Quaternion, w_ref: Vec3, covariance: Mat3) -> Result<Self, EstimationError> {
        if !q_ref.is_finite() || q_ref.magnitude() == 0.0 {
            return Err(EstimationError::InvalidAttitude);
        }
        if !w_ref.iter().all(|v| v.is_finite()) {
            return Err(EstimationError::InvalidAngularVelocity);
        }
        let asymmetry = (covariance - covariance.transpose()).abs().max();
        if !is_positive_definite(&covariance) || asymmetry > 1e-12 * covariance.abs().max() {
            return Err(EstimationError::InvalidCovariance);
        }

        Ok(Self {
            q_ref: q_ref.normalize(),
            w_ref,
            covariance,
        })
    }

    /// State at rest with a diagonal covariance
    pub fn with_diagonal_covariance(q_ref: Quaternion, variances: &Vec3) -> Result<Self, EstimationError> {
        Self::new(q_ref, Vec3::zeros(), Mat3::from_diagonal(variances))
    }

    pub fn covariance_trace(&self) -> f64 {
        self.covariance.trace()
    }

    /// One-sigma attitude uncertainty per body axis [rad]
    pub fn attitude_sigma(&self) -> Vec3 {
        self.covariance.diagonal().map(|v| v.max(0.0).sqrt())
    }
}

/// A single vector observation and the noise models used to fuse it
///
/// Built fresh every tick from the current readings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorMeasurement {
    /// Gyro noise covariance Q (σ² I₃)
    pub gyro_noise: Mat3,
    /// Measurement noise covariance R (σ² I₃)
    pub measurement_noise: Mat3,
    /// Measured direction in the body frame (sun sensor or magnetometer)
    pub body_vector: Vec3,
    /// Expected direction in the inertial frame, from the environment model
    pub inertial_vector: Vec3,
}

impl SensorMeasurement {
    pub fn new(gyro_noise: Mat3, measurement_noise: Mat3, body_vector: Vec3, inertial_vector: Vec3) -> Self {
        Self {
            gyro_noise,
            measurement_noise,
            body_vector,
            inertial_vector,
        }
    }

    /// Measurement with diagonal noise matrices
    pub fn from_variances(
        gyro_variance: &Vec3,
        measurement_variance: &Vec3,
        body_vector: Vec3,
        inertial_vector: Vec3,
    ) -> Self {
        Self::new(
            Mat3::from_diagonal(gyro_variance),
            Mat3::from_diagonal(measurement_variance),
            body_vector,
            inertial_vector,
        )
    }

    /// True if both vectors are finite and non-zero and Q is finite
    pub fn is_usable(&self) -> bool {
        let usable = |v: &Vec3| {
            let norm = v.norm();
            norm.is_finite() && norm > 0.0
        };
        usable(&self.body_vector) && usable(&self.inertial_vector) && is_finite(&self.gyro_noise)
    }
}
