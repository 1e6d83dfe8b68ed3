//! Per-tick estimation driver
//!
//! - [`Mode`]: spacecraft operating mode, only [`Mode::Nominal`] estimates
//! - [`Orchestrator`]: fuses TRIAD and the MEKF on each control tick
//! - [`EstimateHandle`]: read-only view of the published estimate

pub mod mode;
pub mod orchestrator;
pub mod publish;

pub use mode::*;
pub use orchestrator::*;
pub use publish::*;
