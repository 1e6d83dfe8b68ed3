//! Sensor models for simulation
//!
//! Produces noisy [`SensorReadings`] from the true attitude and rate.

use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use rand_xoshiro::Xoshiro256StarStar;
use serde::{Deserialize, Serialize};

use super::ScenarioError;
use crate::math::{inertial_to_body, Quaternion};
use crate::orchestration::SensorReadings;
use crate::Vec3;

/// Sensor noise parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorModelConfig {
    /// Sun sensor direction noise std dev, per axis [-]
    pub sun_noise_std: f64,
    /// Magnetometer direction noise std dev, per axis [-]
    pub magnetometer_noise_std: f64,
    /// Gyro white noise std dev [rad/s]
    pub gyro_noise_std: f64,
    /// Constant gyro bias [rad/s]
    pub gyro_bias: Vec3,
}

impl Default for SensorModelConfig {
    fn default() -> Self {
        Self {
            sun_noise_std: 0.005,
            magnetometer_noise_std: 0.02,
            gyro_noise_std: 1e-4,
            gyro_bias: Vec3::zeros(),
        }
    }
}

impl SensorModelConfig {
    pub fn validate(&self) -> Result<(), ScenarioError> {
        let stds = [
            ("sensors.sun_noise_std", self.sun_noise_std),
            ("sensors.magnetometer_noise_std", self.magnetometer_noise_std),
            ("sensors.gyro_noise_std", self.gyro_noise_std),
        ];
        for (field, std) in stds {
            if !std.is_finite() || std < 0.0 {
                return Err(ScenarioError::Invalid {
                    field: field.to_string(),
                    reason: "must be finite and non-negative".to_string(),
                });
            }
        }
        if !self.gyro_bias.iter().all(|v| v.is_finite()) {
            return Err(ScenarioError::Invalid {
                field: "sensors.gyro_bias".to_string(),
                reason: "must be finite".to_string(),
            });
        }
        Ok(())
    }

    /// Noise-free sensors
    pub fn ideal() -> Self {
        Self {
            sun_noise_std: 0.0,
            magnetometer_noise_std: 0.0,
            gyro_noise_std: 0.0,
            gyro_bias: Vec3::zeros(),
        }
    }
}

/// Sun sensor, magnetometer and gyro sharing one seeded generator
#[derive(Debug, Clone)]
pub struct SensorSuite {
    sun_noise: Normal<f64>,
    magnetometer_noise: Normal<f64>,
    gyro_noise: Normal<f64>,
    gyro_bias: Vec3,
    rng: Xoshiro256StarStar,
}

impl SensorSuite {
    pub fn new(config: &SensorModelConfig, seed: u64) -> Result<Self, ScenarioError> {
        config.validate()?;

        Ok(Self {
            sun_noise: Normal::new(0.0, config.sun_noise_std)?,
            magnetometer_noise: Normal::new(0.0, config.magnetometer_noise_std)?,
            gyro_noise: Normal::new(0.0, config.gyro_noise_std)?,
            gyro_bias: config.gyro_bias,
            rng: Xoshiro256StarStar::seed_from_u64(seed),
        })
    }

    fn sample(noise: &Normal<f64>, rng: &mut Xoshiro256StarStar) -> Vec3 {
        Vec3::from_fn(|_, _| noise.sample(&mut *rng))
    }

    /// Unit direction as seen in the body frame, with noise
    fn direction(noise: &Normal<f64>, rng: &mut Xoshiro256StarStar, q_true: &Quaternion, inertial: &Vec3) -> Vec3 {
        let measured = inertial_to_body(q_true, &inertial.normalize()) + Self::sample(noise, rng);
        measured.try_normalize(0.0).unwrap_or(measured)
    }

    /// Take one set of readings
    ///
    /// # Arguments
    /// * `q_true` - True body-to-inertial attitude
    /// * `rate_true` - True body rate [rad/s]
    /// * `sun_model` - Sun direction, inertial frame
    /// * `mag_model` - Magnetic field, inertial frame
    /// * `sun_visible` - False in eclipse; the sun reading is then absent
    pub fn read(
        &mut self,
        q_true: &Quaternion,
        rate_true: &Vec3,
        sun_model: &Vec3,
        mag_model: &Vec3,
        sun_visible: bool,
    ) -> SensorReadings {
        let sun_measured =
            sun_visible.then(|| Self::direction(&self.sun_noise, &mut self.rng, q_true, sun_model));
        let mag_measured = Self::direction(&self.magnetometer_noise, &mut self.rng, q_true, mag_model);
        let gyro = rate_true + self.gyro_bias + Self::sample(&self.gyro_noise, &mut self.rng);

        SensorReadings {
            sun_measured,
            sun_model: *sun_model,
            mag_measured,
            mag_model: *mag_model,
            gyro,
        }
    }
}
