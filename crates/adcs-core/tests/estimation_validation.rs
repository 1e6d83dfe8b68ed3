//! Estimation Validation Tests
//!
//! End-to-end checks of the estimator against:
//! "Fast Quaternion Attitude Estimation From Two Vector Measurements" (Markley, 2002)
//! "Multiplicative vs. Additive Filtering for Spacecraft Attitude Determination" (Markley, 2003)
//!
//! These tests validate:
//! 1. Quaternion algebra identities
//! 2. TRIAD degenerate geometries and the 90° example
//! 3. MEKF behavior at zero innovation
//! 4. Orchestrator convergence, fallback and gating
//! 5. No input ever yields a non-finite or non-unit attitude

use approx::assert_relative_eq;
use std::f64::consts::FRAC_1_SQRT_2;

use adcs_core::estimation::{FilterStatus, Mekf, SensorMeasurement, StateEstimate};
use adcs_core::math::{inertial_to_body, integrate_quaternion, quaternion_derivative, Quaternion};
use adcs_core::orchestration::{MeasurementSource, Mode, Orchestrator, SensorReadings, TickOutcome};
use adcs_core::{triad, AdcsConfig, TriadStatus, Vec3};

const SUN_MODEL: Vec3 = Vec3::new(0.6, 0.8, 0.0);
const MAG_MODEL: Vec3 = Vec3::new(0.0, 0.28, 0.96);

fn readings(q_true: &Quaternion, sun_visible: bool, gyro: Vec3) -> SensorReadings {
    SensorReadings {
        sun_measured: sun_visible.then(|| inertial_to_body(q_true, &SUN_MODEL)),
        sun_model: SUN_MODEL,
        mag_measured: inertial_to_body(q_true, &MAG_MODEL),
        mag_model: MAG_MODEL,
        gyro,
    }
}

/// Rotation algebra identities
mod quaternion_tests {
    use super::*;

    #[test]
    fn test_normalize_gives_unit_or_identity() {
        let q = Quaternion::new(3.0, -1.0, 2.0, 0.5).normalize();
        assert_relative_eq!(q.magnitude(), 1.0, epsilon = 1e-15);

        assert_eq!(Quaternion::new(0.0, 0.0, 0.0, 0.0).normalize(), Quaternion::IDENTITY);
    }

    #[test]
    fn test_identity_rotation_is_noop() {
        let v = Vec3::new(1.5, -2.0, 0.25);

        assert_eq!(Quaternion::IDENTITY.rotate_vector(&v), v);
    }

    #[test]
    fn test_composition_matches_sequential_rotation() {
        let q1 = Quaternion::from_axis_angle(&Vec3::new(1.0, 0.0, 1.0), 0.7);
        let q2 = Quaternion::from_axis_angle(&Vec3::new(-0.2, 1.0, 0.3), 2.1);
        let v = Vec3::new(0.3, -0.4, 1.2);

        assert_relative_eq!(
            (q1 * q2).rotate_vector(&v),
            q1.rotate_vector(&q2.rotate_vector(&v)),
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_rotation_preserves_length() {
        let q = Quaternion::from_axis_angle(&Vec3::new(0.1, 0.2, 0.3), 1.3);
        let v = Vec3::new(4.0, -5.0, 6.0);

        assert_relative_eq!(q.rotate_vector(&v).norm(), v.norm(), epsilon = 1e-12);
    }
}

/// Markley 2002: degenerate geometries and the 90° example
mod triad_tests {
    use super::*;

    #[test]
    fn test_collinear_references() {
        let result = triad(&Vec3::x(), &Vec3::x(), &Vec3::y(), &Vec3::z());

        assert_eq!(result.status, TriadStatus::Collinear);
        assert_eq!(result.quaternion, Quaternion::IDENTITY);
    }

    #[test]
    fn test_anti_parallel() {
        let result = triad(&Vec3::x(), &Vec3::y(), &(-Vec3::x()), &Vec3::y());

        assert_eq!(result.status, TriadStatus::AntiParallel);
        assert_eq!(result.quaternion, Quaternion::IDENTITY);
    }

    #[test]
    fn test_90deg_about_z() {
        let (b1, b2) = (Vec3::y(), -Vec3::x());

        let result = triad(&Vec3::x(), &Vec3::y(), &b1, &b2);

        assert_eq!(result.status, TriadStatus::Success);
        assert_relative_eq!(result.quaternion.w, FRAC_1_SQRT_2, epsilon = 1e-6);
        assert_relative_eq!(result.quaternion.z, -FRAC_1_SQRT_2, epsilon = 1e-6);
        assert_relative_eq!(result.quaternion.rotate_vector(&b1), Vec3::x(), epsilon = 1e-12);
        assert_relative_eq!(result.quaternion.rotate_vector(&b2), Vec3::y(), epsilon = 1e-12);
    }
}

/// Markley 2003: the multiplicative update
mod mekf_tests {
    use super::*;

    #[test]
    fn test_zero_innovation_at_rest() {
        let q = Quaternion::from_axis_angle(&Vec3::new(1.0, 1.0, 1.0), 0.9);
        let mut state = StateEstimate::with_diagonal_covariance(q, &Vec3::repeat(0.05)).unwrap();
        let measurement = SensorMeasurement::from_variances(
            &Vec3::repeat(1e-6),
            &Vec3::repeat(1e-3),
            inertial_to_body(&q, &SUN_MODEL),
            SUN_MODEL,
        );

        let step = Mekf::default().update(&mut state, &measurement, 0.1);

        assert_eq!(step.status, FilterStatus::Corrected);
        assert!(step.quaternion.angle_to(&q) < 1e-12);
    }
}

/// Orchestrator: convergence, fallback, gating
mod orchestrator_tests {
    use super::*;

    #[test]
    fn test_converges_to_truth() {
        let q_true = Quaternion::from_axis_angle(&Vec3::new(-0.4, 0.9, 0.2), 2.5);
        let mut orch = Orchestrator::new(AdcsConfig::default(), 0.0).unwrap();
        let handle = orch.handle();

        for k in 1..=50 {
            let report = orch.tick(k as f64 * 0.1, &readings(&q_true, true, Vec3::zeros()));
            assert!(matches!(report.outcome, TickOutcome::Updated { .. }), "tick {k}: {:?}", report);
        }

        let q = handle.quaternion();
        assert!(q.angle_to(&q_true) < 1e-3);
        assert!(q.is_unit(1e-12));
    }

    #[test]
    fn test_sun_absent_follows_gyro() {
        let q_prior = Quaternion::from_axis_angle(&Vec3::new(0.0, 0.6, 0.8), 0.5);
        let gyro = Vec3::new(0.02, -0.01, 0.05);
        let state = StateEstimate::with_diagonal_covariance(q_prior, &Vec3::repeat(0.1)).unwrap();
        let mut orch = Orchestrator::with_state(AdcsConfig::default(), state, 0.0).unwrap();
        let mut expected = q_prior;

        for k in 1..=20 {
            let (now, last) = (k as f64 * 0.1, (k - 1) as f64 * 0.1);
            expected = integrate_quaternion(&expected, &quaternion_derivative(&expected, &gyro), now - last);

            let report = orch.tick(now, &readings(&expected, false, gyro));

            match report.outcome {
                TickOutcome::Updated {
                    source,
                    triad,
                    filter,
                    quaternion,
                } => {
                    assert_eq!(source, MeasurementSource::Magnetometer);
                    assert_eq!(triad, None);
                    assert_eq!(filter, FilterStatus::Corrected);
                    assert!(quaternion.angle_to(&expected) < 1e-12, "tick {k}");
                }
                other => panic!("tick {k}: unexpected outcome {:?}", other),
            }
            assert_eq!(orch.handle().quaternion(), orch.state().q_ref);
        }
        assert!(orch.state().q_ref.angle_to(&q_prior) > 0.05);
    }

    #[test]
    fn test_gating_and_parking() {
        let mut config = AdcsConfig::default();
        config.update_interval = 1.0;
        let mut orch = Orchestrator::new(config, 10.0).unwrap();
        let r = readings(&Quaternion::IDENTITY, true, Vec3::zeros());

        assert_eq!(orch.tick(10.5, &r).outcome, TickOutcome::NotDue);
        assert!(matches!(orch.tick(11.0, &r).outcome, TickOutcome::Updated { .. }));

        orch.command_mode(1).unwrap();
        assert_eq!(orch.tick(12.0, &r).mode, Mode::PointToSun);
        assert_eq!(orch.tick(12.0, &r).outcome, TickOutcome::NotDue);
        assert_eq!(orch.tick(13.0, &r).outcome, TickOutcome::Parked);
        assert!(orch.command_mode(7).is_err());
        assert_eq!(orch.mode(), Mode::PointToSun);
    }
}

/// No input may produce a non-finite or non-unit attitude
mod robustness_tests {
    use super::*;

    fn garbage() -> Vec<SensorReadings> {
        let nan = Vec3::new(f64::NAN, 0.0, 0.0);
        let inf = Vec3::new(0.0, f64::INFINITY, 0.0);
        let good = readings(&Quaternion::IDENTITY, true, Vec3::zeros());

        vec![
            SensorReadings { sun_measured: Some(Vec3::zeros()), ..good.clone() },
            SensorReadings { sun_measured: Some(nan), ..good.clone() },
            SensorReadings { sun_model: Vec3::zeros(), ..good.clone() },
            SensorReadings { mag_measured: nan, ..good.clone() },
            SensorReadings { mag_model: inf, ..good.clone() },
            SensorReadings { mag_measured: Vec3::zeros(), sun_measured: None, ..good.clone() },
            SensorReadings { gyro: nan, ..good.clone() },
            SensorReadings { gyro: Vec3::new(1e6, -1e6, 1e6), ..good.clone() },
            SensorReadings { sun_measured: Some(-SUN_MODEL), ..good.clone() },
            SensorReadings { mag_measured: good.sun_measured.unwrap_or_default(), mag_model: SUN_MODEL, ..good.clone() },
            good,
        ]
    }

    #[test]
    fn test_garbage_readings() {
        let mut orch = Orchestrator::new(AdcsConfig::default(), 0.0).unwrap();
        let handle = orch.handle();
        let mut t = 0.0;

        for (i, r) in garbage().iter().enumerate() {
            t += 0.1 + i as f64;
            let report = orch.tick(t, r);

            if let TickOutcome::Updated { quaternion, .. } = report.outcome {
                assert!(quaternion.is_unit(1e-9), "case {i}: {:?}", quaternion);
            }
            assert!(handle.quaternion().is_unit(1e-9), "case {i}");
            assert!(orch.state().covariance.iter().all(|v| v.is_finite()), "case {i}");
        }
    }

    #[test]
    fn test_huge_time_steps() {
        let mut orch = Orchestrator::new(AdcsConfig::default(), 0.0).unwrap();
        let r = readings(&Quaternion::IDENTITY, false, Vec3::new(0.3, 0.2, 0.1));

        for t in [1.0, 1e3, 1e9, 1e300, f64::INFINITY] {
            orch.tick(t, &r);
            assert!(orch.handle().quaternion().is_unit(1e-9), "t = {t}");
        }
    }

    #[test]
    fn test_singular_noise_configuration() {
        let mut state = StateEstimate::with_diagonal_covariance(Quaternion::IDENTITY, &Vec3::repeat(0.1)).unwrap();
        let measurement = SensorMeasurement::from_variances(
            &Vec3::repeat(1e-6),
            &Vec3::new(1e-3, 0.0, 1e-3),
            Vec3::y(),
            Vec3::x(),
        );

        let step = Mekf::default().update(&mut state, &measurement, 0.1);

        assert!(!step.status.is_corrected());
        assert_eq!(step.quaternion, Quaternion::IDENTITY);
    }
}
