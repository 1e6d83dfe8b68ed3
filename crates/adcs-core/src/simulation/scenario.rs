//! Scenario runner
//!
//! Propagates a truth attitude at a constant body rate, feeds the
//! orchestrator simulated readings every tick and scores the published
//! estimate against the truth.

use std::{fs, path::Path};

use log::{debug, info};
use rand_distr::NormalError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{SensorModelConfig, SensorSuite};
use crate::config::{AdcsConfig, ConfigError};
use crate::determination::TriadStatus;
use crate::estimation::FilterStatus;
use crate::math::{attitude_error, rotation_increment, Quaternion};
use crate::orchestration::{MeasurementSource, Orchestrator, TickOutcome};
use crate::Vec3;

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("Invalid estimator configuration")]
    Config(#[from] ConfigError),

    #[error("Invalid sensor noise model")]
    Noise(#[from] NormalError),

    #[error("Invalid value for '{field}': {reason}")]
    Invalid { field: String, reason: String },
}

/// True attitude motion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TruthConfig {
    /// Rotation axis of the initial attitude
    pub initial_axis: Vec3,
    /// Rotation angle of the initial attitude [rad]
    pub initial_angle: f64,
    /// Constant body rate [rad/s]
    pub body_rate: Vec3,
}

impl Default for TruthConfig {
    fn default() -> Self {
        Self {
            initial_axis: Vec3::new(0.3, -0.5, 0.8),
            initial_angle: 1.0,
            body_rate: Vec3::new(0.0, 0.0, 0.01),
        }
    }
}

impl TruthConfig {
    pub fn initial_attitude(&self) -> Quaternion {
        Quaternion::from_axis_angle(&self.initial_axis, self.initial_angle)
    }

    /// Exact attitude after `t` seconds
    pub fn attitude_at(&self, t: f64) -> Quaternion {
        (self.initial_attitude() * rotation_increment(&self.body_rate, t)).normalize()
    }
}

/// Time window without a sun reading [s]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EclipseWindow {
    pub start: f64,
    pub end: f64,
}

impl EclipseWindow {
    pub fn contains(&self, t: f64) -> bool {
        t >= self.start && t < self.end
    }
}

/// Inertial reference directions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    pub sun_direction: Vec3,
    pub magnetic_field: Vec3,
    pub eclipse: Option<EclipseWindow>,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            sun_direction: Vec3::new(1.0, 0.2, 0.1),
            magnetic_field: Vec3::new(0.1, 0.6, 0.8),
            eclipse: None,
        }
    }
}

impl EnvironmentConfig {
    pub fn sun_visible(&self, t: f64) -> bool {
        !self.eclipse.is_some_and(|e| e.contains(t))
    }
}

/// Full scenario description, loaded from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    /// Simulated time [s]
    pub duration: f64,
    /// Control tick period [s]
    pub tick_period: f64,
    /// Time after which errors count toward the settled maximum [s]
    pub settling_time: f64,
    /// Seed of the sensor noise generator
    pub seed: u64,
    pub truth: TruthConfig,
    pub environment: EnvironmentConfig,
    pub sensors: SensorModelConfig,
    pub adcs: AdcsConfig,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            duration: 60.0,
            tick_period: 0.1,
            settling_time: 5.0,
            seed: 12345,
            truth: TruthConfig::default(),
            environment: EnvironmentConfig::default(),
            sensors: SensorModelConfig::default(),
            adcs: AdcsConfig::default(),
        }
    }
}

impl ScenarioConfig {
    pub fn from_toml_str(toml: &str) -> Result<Self, ScenarioError> {
        let config: Self = toml::from_str(toml).map_err(ConfigError::from)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ScenarioError> {
        let text = fs::read_to_string(path).map_err(ConfigError::from)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ScenarioError> {
        let invalid = |field: &str, reason: &str| ScenarioError::Invalid {
            field: field.to_string(),
            reason: reason.to_string(),
        };

        if !self.tick_period.is_finite() || self.tick_period <= 0.0 {
            return Err(invalid("tick_period", "must be finite and strictly positive"));
        }
        if !self.duration.is_finite() || self.duration < 0.0 {
            return Err(invalid("duration", "must be finite and non-negative"));
        }
        if !self.settling_time.is_finite() {
            return Err(invalid("settling_time", "must be finite"));
        }
        if !self.truth.body_rate.iter().all(|v| v.is_finite()) {
            return Err(invalid("truth.body_rate", "must be finite"));
        }
        self.sensors.validate()?;
        self.adcs.validate()?;
        Ok(())
    }

    /// Number of control ticks in the run
    pub fn tick_count(&self) -> usize {
        (self.duration / self.tick_period).round() as usize
    }
}

/// Summary of a scenario run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScenarioReport {
    /// Control ticks executed
    pub ticks: usize,
    /// Ticks on which the estimator ran
    pub updates: usize,
    pub sun_updates: usize,
    pub magnetometer_updates: usize,
    /// Sun ticks where TRIAD did not produce an attitude
    pub triad_failures: usize,
    /// Updates where the MEKF skipped its correction
    pub degraded_updates: usize,
    /// Attitude error at the end of the run [rad]
    pub final_error: f64,
    /// Largest attitude error once settled [rad]
    pub max_error_after_settling: f64,
}

/// Closed-loop run of the orchestrator against a simulated truth
#[derive(Debug)]
pub struct Scenario {
    config: ScenarioConfig,
    orchestrator: Orchestrator,
    sensors: SensorSuite,
}

impl Scenario {
    pub fn new(config: ScenarioConfig) -> Result<Self, ScenarioError> {
        config.validate()?;
        let orchestrator = Orchestrator::new(config.adcs.clone(), 0.0)?;
        let sensors = SensorSuite::new(&config.sensors, config.seed)?;

        Ok(Self {
            config,
            orchestrator,
            sensors,
        })
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    pub fn run(&mut self) -> ScenarioReport {
        let mut report = ScenarioReport::default();
        let handle = self.orchestrator.handle();
        let truth = &self.config.truth;
        let env = &self.config.environment;

        for k in 1..=self.config.tick_count() {
            let t = k as f64 * self.config.tick_period;
            let q_true = truth.attitude_at(t);
            let readings = self.sensors.read(
                &q_true,
                &truth.body_rate,
                &env.sun_direction,
                &env.magnetic_field,
                env.sun_visible(t),
            );

            let tick = self.orchestrator.tick(t, &readings);
            report.ticks += 1;

            match tick.outcome {
                TickOutcome::NotDue | TickOutcome::Parked => continue,
                TickOutcome::Updated {
                    source, triad, filter, ..
                } => {
                    report.updates += 1;
                    match source {
                        MeasurementSource::Sun => report.sun_updates += 1,
                        MeasurementSource::Magnetometer => report.magnetometer_updates += 1,
                    }
                    if triad.is_some_and(|s| s != TriadStatus::Success) {
                        report.triad_failures += 1;
                    }
                    if let FilterStatus::PropagateOnly(_) = filter {
                        report.degraded_updates += 1;
                    }
                }
            }

            let estimate = handle.quaternion();
            let error = estimate.angle_to(&q_true);
            report.final_error = error;
            if t >= self.config.settling_time {
                report.max_error_after_settling = report.max_error_after_settling.max(error);
            }
            let axes = attitude_error(&q_true, &estimate);
            debug!("t={:.2} error={:.3e} rad [{:.2e} {:.2e} {:.2e}]", t, error, axes.x, axes.y, axes.z);
        }

        info!(
            "Scenario done: {} ticks, {} updates ({} sun, {} magnetometer), final error {:.3e} rad",
            report.ticks, report.updates, report.sun_updates, report.magnetometer_updates, report.final_error
        );

        report
    }
}
