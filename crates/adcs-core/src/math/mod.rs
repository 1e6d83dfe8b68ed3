//! Mathematical utilities for the attitude engine
//!
//! Implements the scalar-first quaternion type with its kinematics,
//! skew (cross-product) matrices and the few 3x3 linear algebra
//! operations the filter needs.

pub mod linalg;
pub mod quaternion;
pub mod rotation;

pub use linalg::*;
pub use quaternion::*;
pub use rotation::*;
