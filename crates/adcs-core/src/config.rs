//! Estimator configuration
//!
//! Loaded from TOML. Every section has flight defaults so a config file only
//! needs to name what it overrides.

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::estimation::{EstimationError, MekfConfig, SensorMeasurement};
use crate::math::DEFAULT_SINGULARITY_TOLERANCE;
use crate::orchestration::Mode;
use crate::{Mat3, Vec3};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read configuration file")]
    Io(#[from] std::io::Error),

    #[error("Error deserializing configuration")]
    Deserialize(#[from] toml::de::Error),

    #[error("Invalid value for '{field}': {reason}")]
    Invalid { field: String, reason: String },

    #[error("Invalid initial filter state")]
    InitialState(#[from] EstimationError),
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

fn check_variances(field: &str, v: &Vec3) -> Result<(), ConfigError> {
    if v.iter().all(|x| x.is_finite() && *x > 0.0) {
        Ok(())
    } else {
        Err(invalid(field, "variances must be finite and strictly positive"))
    }
}

/// Top-level estimator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdcsConfig {
    /// Minimum time between estimator updates [s]
    pub update_interval: f64,
    /// Mode at power-up
    pub initial_mode: Mode,
    pub filter: FilterConfig,
    pub noise: NoiseConfig,
}

impl Default for AdcsConfig {
    fn default() -> Self {
        Self {
            update_interval: 0.1, // 10 Hz
            initial_mode: Mode::Nominal,
            filter: FilterConfig::default(),
            noise: NoiseConfig::default(),
        }
    }
}

impl AdcsConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        Self::from_toml_str(&fs::read_to_string(path)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.update_interval.is_finite() || self.update_interval < 0.0 {
            return Err(invalid("update_interval", "must be finite and non-negative"));
        }
        self.filter.validate()?;
        self.noise.validate()
    }
}

/// MEKF initialization and numerics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Diagonal of the initial attitude error covariance [rad²]
    pub initial_covariance: Vec3,
    /// Relative determinant threshold for matrix inversion
    pub singularity_tolerance: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            // ~18° one-sigma before the first fix
            initial_covariance: Vec3::repeat(0.1),
            singularity_tolerance: DEFAULT_SINGULARITY_TOLERANCE,
        }
    }
}

impl FilterConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_variances("filter.initial_covariance", &self.initial_covariance)?;
        if !self.singularity_tolerance.is_finite() || self.singularity_tolerance <= 0.0 {
            return Err(invalid("filter.singularity_tolerance", "must be finite and strictly positive"));
        }
        Ok(())
    }

    pub fn initial_covariance_matrix(&self) -> Mat3 {
        Mat3::from_diagonal(&self.initial_covariance)
    }

    pub fn mekf_config(&self) -> MekfConfig {
        MekfConfig {
            singularity_tolerance: self.singularity_tolerance,
        }
    }
}

/// Sensor noise model, diagonal variances per axis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseConfig {
    /// Gyro rate noise Q [(rad/s)²]
    pub gyro_variance: Vec3,
    /// Sun sensor direction noise R [rad²]
    pub sun_variance: Vec3,
    /// Magnetometer direction noise R [rad²]
    pub magnetometer_variance: Vec3,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            gyro_variance: Vec3::repeat(1e-6),
            sun_variance: Vec3::repeat(1e-4),
            magnetometer_variance: Vec3::repeat(1e-3),
        }
    }
}

impl NoiseConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_variances("noise.gyro_variance", &self.gyro_variance)?;
        check_variances("noise.sun_variance", &self.sun_variance)?;
        check_variances("noise.magnetometer_variance", &self.magnetometer_variance)
    }

    /// Sun direction observation with this noise model
    pub fn sun_measurement(&self, body: Vec3, inertial: Vec3) -> SensorMeasurement {
        SensorMeasurement::from_variances(&self.gyro_variance, &self.sun_variance, body, inertial)
    }

    /// Magnetic field direction observation with this noise model
    pub fn magnetometer_measurement(&self, body: Vec3, inertial: Vec3) -> SensorMeasurement {
        SensorMeasurement::from_variances(&self.gyro_variance, &self.magnetometer_variance, body, inertial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_document_gives_defaults() {
        let config = AdcsConfig::from_toml_str("").unwrap();

        assert_eq!(config, AdcsConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let toml = r#"
            update_interval = 0.5
            initial_mode = "Detumble"

            [noise]
            sun_variance = [1e-5, 1e-5, 2e-5]
        "#;

        let config = AdcsConfig::from_toml_str(toml).unwrap();

        assert_eq!(config.update_interval, 0.5);
        assert_eq!(config.initial_mode, Mode::Detumble);
        assert_eq!(config.noise.sun_variance, Vec3::new(1e-5, 1e-5, 2e-5));
        assert_eq!(config.noise.gyro_variance, NoiseConfig::default().gyro_variance);
        assert_eq!(config.filter, FilterConfig::default());
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = AdcsConfig::default();
        config.update_interval = 0.25;
        config.initial_mode = Mode::PointToEarth;
        config.filter.initial_covariance = Vec3::new(0.2, 0.3, 0.4);

        let text = toml::to_string(&config).unwrap();

        assert_eq!(AdcsConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_rejects_negative_interval() {
        let err = AdcsConfig::from_toml_str("update_interval = -1.0").unwrap_err();

        assert!(matches!(err, ConfigError::Invalid { ref field, .. } if field == "update_interval"));
    }

    #[test]
    fn test_rejects_zero_variance() {
        let toml = r#"
            [filter]
            initial_covariance = [0.1, 0.0, 0.1]
        "#;

        let err = AdcsConfig::from_toml_str(toml).unwrap_err();

        assert!(matches!(err, ConfigError::Invalid { ref field, .. } if field == "filter.initial_covariance"));
    }

    #[test]
    fn test_rejects_unknown_mode() {
        let err = AdcsConfig::from_toml_str(r#"initial_mode = "Safe""#).unwrap_err();

        assert!(matches!(err, ConfigError::Deserialize(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = AdcsConfig::from_file(Path::new("/nonexistent/adcs.toml")).unwrap_err();

        assert!(matches!(err, ConfigError::Io(_)));
    }
}
