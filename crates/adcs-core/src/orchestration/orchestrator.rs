//! Estimation orchestrator
//!
//! Runs once per control tick. In `Nominal` mode, when the update interval
//! has elapsed:
//! 1. Sun visible: TRIAD from (sun, magnetometer) re-seeds the attitude when
//!    it succeeds, the MEKF then fuses the sun direction.
//! 2. Sun absent: TRIAD is skipped, the prior attitude is carried forward
//!    and the MEKF fuses the magnetometer direction.
//!
//! Either way exactly one MEKF update runs, using the latest gyro rate, and
//! the result is published once the tick is complete.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::{AttitudeSnapshot, EstimateHandle, Mode, ModeError};
use crate::config::{AdcsConfig, ConfigError};
use crate::determination::{triad, TriadStatus};
use crate::estimation::{FilterStatus, Mekf, StateEstimate};
use crate::math::Quaternion;
use crate::Vec3;

/// Scheduler jitter tolerated when comparing elapsed time to the interval [s]
const TIMING_TOLERANCE: f64 = 1e-9;

/// Unit vector along `v`; the MEKF compares directions only
fn direction(v: &Vec3) -> Vec3 {
    v.try_normalize(0.0).unwrap_or(*v)
}

/// Latest sensor values for one tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReadings {
    /// Measured sun direction in the body frame, `None` in eclipse
    pub sun_measured: Option<Vec3>,
    /// Modeled sun direction in the inertial frame
    pub sun_model: Vec3,
    /// Measured magnetic field in the body frame
    pub mag_measured: Vec3,
    /// Modeled magnetic field in the inertial frame
    pub mag_model: Vec3,
    /// Body angular rate [rad/s]
    pub gyro: Vec3,
}

impl SensorReadings {
    /// Usable sun measurement, if any
    pub fn sun(&self) -> Option<Vec3> {
        self.sun_measured.filter(|v| {
            let norm = v.norm();
            norm.is_finite() && norm > 0.0
        })
    }
}

/// Which direction the MEKF fused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MeasurementSource {
    Sun,
    Magnetometer,
}

/// What a tick did
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TickOutcome {
    /// Update interval not yet elapsed, nothing changed
    NotDue,
    /// Mode does not estimate; estimate held
    Parked,
    /// Estimator ran and a new estimate was published
    Updated {
        source: MeasurementSource,
        /// TRIAD status, `None` when the sun was absent
        triad: Option<TriadStatus>,
        filter: FilterStatus,
        quaternion: Quaternion,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    pub time: f64,
    pub mode: Mode,
    pub outcome: TickOutcome,
}

/// Sole owner and writer of the attitude estimate
#[derive(Debug)]
pub struct Orchestrator {
    config: AdcsConfig,
    mode: Mode,
    state: StateEstimate,
    filter: Mekf,
    last_update: f64,
    handle: EstimateHandle,
}

impl Orchestrator {
    /// Start from the identity attitude at rest
    pub fn new(config: AdcsConfig, start_time: f64) -> Result<Self, ConfigError> {
        let state = StateEstimate::new(
            Quaternion::IDENTITY,
            Vec3::zeros(),
            config.filter.initial_covariance_matrix(),
        )?;
        Self::with_state(config, state, start_time)
    }

    /// Start from a known state, e.g. restored after a reset
    pub fn with_state(config: AdcsConfig, state: StateEstimate, start_time: f64) -> Result<Self, ConfigError> {
        config.validate()?;
        if !start_time.is_finite() {
            return Err(ConfigError::Invalid {
                field: "start_time".to_string(),
                reason: "must be finite".to_string(),
            });
        }

        let handle = EstimateHandle::new(AttitudeSnapshot::from_state(start_time, &state, None));

        Ok(Self {
            filter: Mekf::new(config.filter.mekf_config()),
            mode: config.initial_mode,
            config,
            state,
            last_update: start_time,
            handle,
        })
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: Mode) {
        if mode != self.mode {
            debug!("Mode {} -> {}", self.mode, mode);
        }
        self.mode = mode;
    }

    /// Apply a ground-command mode code
    pub fn command_mode(&mut self, code: u8) -> Result<Mode, ModeError> {
        let mode = Mode::try_from(code)?;
        self.set_mode(mode);
        Ok(mode)
    }

    pub fn state(&self) -> &StateEstimate {
        &self.state
    }

    pub fn config(&self) -> &AdcsConfig {
        &self.config
    }

    pub fn last_update(&self) -> f64 {
        self.last_update
    }

    /// Read handle for the pointing logic
    pub fn handle(&self) -> EstimateHandle {
        self.handle.clone()
    }

    /// Run one control tick at time `now` [s]
    pub fn tick(&mut self, now: f64, readings: &SensorReadings) -> TickReport {
        let outcome = self.step(now, readings);
        debug!("t={:.3} mode={} {:?}", now, self.mode, outcome);

        TickReport {
            time: now,
            mode: self.mode,
            outcome,
        }
    }

    fn step(&mut self, now: f64, readings: &SensorReadings) -> TickOutcome {
        let dt = now - self.last_update;
        if !dt.is_finite() || dt < 0.0 || dt + TIMING_TOLERANCE < self.config.update_interval {
            return TickOutcome::NotDue;
        }

        if !self.mode.runs_estimation() {
            // Re-entering Nominal must not integrate over the parked gap
            self.last_update = now;
            return TickOutcome::Parked;
        }

        if readings.gyro.iter().all(|v| v.is_finite()) {
            self.state.w_ref = readings.gyro;
        } else {
            warn!("Non-finite gyro reading, keeping previous rate");
        }

        let noise = &self.config.noise;
        let (source, triad_status, measurement) = match readings.sun() {
            Some(sun_measured) => {
                let result = triad(&readings.sun_model, &readings.mag_model, &sun_measured, &readings.mag_measured);
                match result.attitude() {
                    Some(q) => self.state.q_ref = q,
                    None => warn!("TRIAD failed ({}), keeping prior attitude", result.status.as_str()),
                }
                (
                    MeasurementSource::Sun,
                    Some(result.status),
                    noise.sun_measurement(direction(&sun_measured), direction(&readings.sun_model)),
                )
            }
            None => (
                MeasurementSource::Magnetometer,
                None,
                noise.magnetometer_measurement(direction(&readings.mag_measured), direction(&readings.mag_model)),
            ),
        };

        let step = self.filter.update(&mut self.state, &measurement, dt);
        if let FilterStatus::PropagateOnly(reason) = step.status {
            warn!("MEKF propagate-only tick: {}", reason.as_str());
        }

        self.last_update = now;
        self.handle
            .publish(AttitudeSnapshot::from_state(now, &self.state, Some(step.status)));

        TickOutcome::Updated {
            source,
            triad: triad_status,
            filter: step.status,
            quaternion: step.quaternion,
        }
    }
}
