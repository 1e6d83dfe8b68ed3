//! # ADCS Core
//!
//! Attitude estimation engine for a small spacecraft.
//!
//! Given noisy, intermittently available direction measurements (sun sensor,
//! magnetometer) and gyro rates, the engine keeps a continuously updated
//! estimate of the body-to-inertial rotation for the pointing logic.
//!
//! ## Modules
//!
//! - [`math`]: Quaternion algebra, skew matrices, small fixed-size linear algebra
//! - [`determination`]: Deterministic two-vector attitude solution (TRIAD)
//! - [`estimation`]: Multiplicative Extended Kalman Filter (MEKF)
//! - [`orchestration`]: Per-tick driver, spacecraft mode, published estimate
//! - [`config`]: TOML configuration of the estimator
//! - [`simulation`]: Synthetic truth and sensor models for closed-loop runs

pub mod config;
pub mod determination;
pub mod estimation;
pub mod math;
pub mod orchestration;
pub mod simulation;

use nalgebra::{Matrix3, Vector3};

pub use config::{AdcsConfig, ConfigError};
pub use determination::{triad, TriadResult, TriadStatus};
pub use estimation::{mekf_update, Mekf, SensorMeasurement, StateEstimate};
pub use math::Quaternion;
pub use orchestration::{EstimateHandle, Mode, Orchestrator, SensorReadings, TickOutcome, TickReport};

/// 3D vector type
pub type Vec3 = Vector3<f64>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f64>;
