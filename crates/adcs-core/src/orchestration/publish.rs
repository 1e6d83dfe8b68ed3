//! Published attitude estimate
//!
//! The orchestrator is the only writer. Readers hold an [`EstimateHandle`]
//! and always observe a complete snapshot from a finished tick.

use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use crate::estimation::{FilterStatus, StateEstimate};
use crate::math::Quaternion;
use crate::{Mat3, Vec3};

/// Consistent copy of the estimator output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttitudeSnapshot {
    /// Time of the tick that produced this estimate [s]
    pub time: f64,
    /// Body-to-inertial attitude
    pub quaternion: Quaternion,
    /// Body rate used by the filter [rad/s]
    pub angular_velocity: Vec3,
    /// Attitude error covariance [rad²]
    pub covariance: Mat3,
    /// Filter status of the tick, `None` before the first update
    pub filter: Option<FilterStatus>,
}

impl AttitudeSnapshot {
    pub fn from_state(time: f64, state: &StateEstimate, filter: Option<FilterStatus>) -> Self {
        Self {
            time,
            quaternion: state.q_ref,
            angular_velocity: state.w_ref,
            covariance: state.covariance,
            filter,
        }
    }
}

/// Cloneable read handle on the latest estimate
#[derive(Debug, Clone)]
pub struct EstimateHandle {
    inner: Arc<RwLock<AttitudeSnapshot>>,
}

impl EstimateHandle {
    pub(crate) fn new(snapshot: AttitudeSnapshot) -> Self {
        Self {
            inner: Arc::new(RwLock::new(snapshot)),
        }
    }

    /// Copy of the latest snapshot
    pub fn snapshot(&self) -> AttitudeSnapshot {
        // A panicking writer cannot leave a half-written snapshot: publish swaps whole values
        self.inner.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Latest attitude
    pub fn quaternion(&self) -> Quaternion {
        self.inner.read().unwrap_or_else(|e| e.into_inner()).quaternion
    }

    pub(crate) fn publish(&self, snapshot: AttitudeSnapshot) {
        *self.inner.write().unwrap_or_else(|e| e.into_inner()) = snapshot;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn snapshot(time: f64, q: Quaternion) -> AttitudeSnapshot {
        AttitudeSnapshot {
            time,
            quaternion: q,
            angular_velocity: Vec3::zeros(),
            covariance: Mat3::identity(),
            filter: None,
        }
    }

    #[test]
    fn test_clones_share_the_estimate() {
        let handle = EstimateHandle::new(snapshot(0.0, Quaternion::IDENTITY));
        let reader = handle.clone();
        let q = Quaternion::from_axis_angle(&Vec3::z(), 0.5);

        handle.publish(snapshot(1.0, q));

        assert_eq!(reader.quaternion(), q);
        assert_eq!(reader.snapshot().time, 1.0);
    }

    #[test]
    fn test_reader_on_another_thread() {
        let handle = EstimateHandle::new(snapshot(0.0, Quaternion::IDENTITY));
        let q = Quaternion::from_axis_angle(&Vec3::x(), 0.1);
        handle.publish(snapshot(2.0, q));

        let reader = handle.clone();
        let seen = thread::spawn(move || reader.snapshot()).join().unwrap();

        assert_eq!(seen, snapshot(2.0, q));
    }
}
