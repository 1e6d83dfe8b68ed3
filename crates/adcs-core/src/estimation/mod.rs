//! Recursive attitude estimation
//!
//! Implements the Multiplicative Extended Kalman Filter from:
//! "Multiplicative vs. Additive Filtering for Spacecraft Attitude
//! Determination" (Markley, 2003)
//!
//! - [`StateEstimate`]: reference attitude, body rate and 3x3 error covariance
//! - [`SensorMeasurement`]: one vector observation with its noise models
//! - [`Mekf`]: propagate + correct step

pub mod mekf;
pub mod state;

pub use mekf::*;
pub use state::*;
