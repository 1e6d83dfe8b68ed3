//! Closed-loop simulation of the estimator
//!
//! Synthetic truth attitude, noisy sensor models and a scenario runner used
//! to verify the estimator end to end.

pub mod scenario;
pub mod sensors;

pub use scenario::*;
pub use sensors::*;
