//! Deterministic attitude determination
//!
//! Attitude from two reference/measurement vector pairs:
//! - TRIAD in the fast quaternion form (Markley, 2002)

pub mod triad;

pub use triad::*;
