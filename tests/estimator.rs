use approx::assert_abs_diff_eq;

use piahrs::{
    quaternion_to_euler, Axis, DegeneracyCheck, DeltaTracker, Estimator, EulerOffsets,
    FilterConfig, IntegrationMode, Normalization, Quaternion, RateScaling,
};

fn estimator(config: FilterConfig) -> Estimator {
    Estimator::new(config).unwrap()
}

fn rolled(deg: f32) -> Quaternion {
    Quaternion::from_axis_angle(Axis::new(1.0, 0.0, 0.0), deg.to_radians()).unwrap()
}

#[test]
fn norm_stays_unit_for_varied_inputs() {
    let mut ahrs = estimator(FilterConfig {
        kp: 1.5,
        ki: 0.05,
        integration: IntegrationMode::SecondOrder,
        ..Default::default()
    });
    for i in 0..2000 {
        let t = i as f32 * 0.005;
        let accel = Axis::new(0.3 * t.sin(), -0.2 * (2.0 * t).cos(), 9.6);
        let gyro = Axis::new(0.8 * (0.7 * t).sin(), 1.3 * t.cos(), -0.4);
        let mag = Axis::new(0.2, 0.05 * t.sin(), 0.4);
        let q = ahrs.update(accel, gyro, Some(mag), 0.005).unwrap();
        assert_abs_diff_eq!(q.norm(), 1.0, epsilon = 1e-5);
    }
}

#[test]
fn aligned_still_sample_is_a_fixed_point() {
    let start = rolled(25.0);
    let mut ahrs = estimator(FilterConfig {
        kp: 5.0,
        ki: 0.5,
        ..Default::default()
    })
    .with_attitude(start);
    let accel = start.gravity() * 9.81;
    for _ in 0..100 {
        ahrs.update(accel, Axis::ZERO, None, 0.01).unwrap();
    }
    let q = ahrs.quaternion();
    assert_abs_diff_eq!(q.q0, start.q0, epsilon = 1e-5);
    assert_abs_diff_eq!(q.q1, start.q1, epsilon = 1e-5);
    assert_abs_diff_eq!(q.q2, start.q2, epsilon = 1e-5);
    assert_abs_diff_eq!(q.q3, start.q3, epsilon = 1e-5);
}

#[test]
fn level_identity_is_exactly_unchanged() {
    let mut ahrs = estimator(FilterConfig::default());
    let q = ahrs
        .update(Axis::new(0.0, 0.0, 1.0), Axis::ZERO, None, 0.01)
        .unwrap();
    assert_eq!(q, Quaternion::IDENTITY);
    assert_eq!(ahrs.previous(), Quaternion::IDENTITY);
}

#[test]
fn exactly_level_reading_leaves_tilted_estimate_alone() {
    let start = rolled(10.0);
    let level = Axis::new(0.0, 0.0, 9.81);

    let mut ahrs = estimator(FilterConfig::default()).with_attitude(start);
    let before = ahrs.quaternion();
    let q = ahrs.update(level, Axis::ZERO, None, 0.01).unwrap();
    assert_abs_diff_eq!(q.q0, before.q0, epsilon = 1e-7);
    assert_abs_diff_eq!(q.q1, before.q1, epsilon = 1e-7);
    assert_eq!(ahrs.integral_feedback(), Axis::ZERO);

    // the norm-only check does pull it back toward level
    let mut ahrs = estimator(FilterConfig {
        degeneracy_check: DegeneracyCheck::Norm,
        ..Default::default()
    })
    .with_attitude(start);
    let q = ahrs.update(level, Axis::ZERO, None, 0.01).unwrap();
    assert!(q.q1 < before.q1);
}

#[test]
fn pure_heading_error_is_held_back_by_default() {
    let yaw = 30f32.to_radians();
    let mag = Axis::new(yaw.cos(), -yaw.sin(), 0.0);
    let mut ahrs = estimator(FilterConfig::default());
    for _ in 0..10 {
        ahrs.update(Axis::new(0.0, 0.0, 1.0), Axis::ZERO, Some(mag), 0.01)
            .unwrap();
    }
    assert_eq!(ahrs.quaternion(), Quaternion::IDENTITY);
}

#[test]
fn wrapped_timestamps_give_the_plain_delta() {
    let mut wrapped = DeltaTracker::new(0xFFFF_FFF0_u32, 1_000_000);
    let mut plain = DeltaTracker::new(0_u32, 1_000_000);
    assert_eq!(wrapped.elapsed(0x10), plain.elapsed(32));
}

#[test]
fn zero_accelerometer_integrates_gyro_only() {
    let config = FilterConfig {
        kp: 3.0,
        ki: 0.2,
        ..Default::default()
    };
    let start = rolled(-15.0);
    let gyro = Axis::new(0.4, -0.1, 0.25);
    let mut ahrs = estimator(config.clone()).with_attitude(start);
    let before = ahrs.quaternion();

    let q = ahrs.update(Axis::ZERO, gyro, None, 0.01).unwrap();
    let expected = before
        .integrate(gyro, 0.01, config.integration)
        .normalized(Normalization::Exact)
        .unwrap();
    assert_eq!(q, expected);
    assert!(q.q0.is_finite());
    assert_eq!(ahrs.integral_feedback(), Axis::ZERO);
}

#[test]
fn identity_euler_is_negated_offsets() {
    let offsets = EulerOffsets {
        pitch: 0.84,
        roll: -2.45,
        yaw: 1.5,
    };
    let e = quaternion_to_euler(&Quaternion::IDENTITY, &offsets);
    assert_eq!((e.pitch, e.roll, e.yaw), (-0.84, 2.45, -1.5));
}

#[test]
fn integral_resets_after_gain_drops_to_zero() {
    let mut ahrs = estimator(FilterConfig {
        kp: 0.5,
        ki: 0.3,
        degeneracy_check: DegeneracyCheck::Norm,
        ..Default::default()
    });
    let accel = rolled(40.0).gravity();
    for _ in 0..50 {
        ahrs.update(accel, Axis::ZERO, None, 0.01).unwrap();
    }
    assert!(ahrs.integral_feedback().x > 0.0);

    ahrs.set_integral_gain(0.0);
    ahrs.update(accel, Axis::ZERO, None, 0.01).unwrap();
    assert_eq!(ahrs.integral_feedback(), Axis::ZERO);

    ahrs.set_integral_gain(0.3);
    ahrs.update(accel, Axis::ZERO, None, 0.01).unwrap();
    assert!(ahrs.integral_feedback() != Axis::ZERO);
    // also on a step where the correction itself is skipped
    ahrs.set_integral_gain(-1.0);
    ahrs.update(Axis::ZERO, Axis::ZERO, None, 0.01).unwrap();
    assert_eq!(ahrs.integral_feedback(), Axis::ZERO);
}

#[test]
fn ten_thousand_still_steps_keep_unit_norm() {
    for normalization in [Normalization::Exact, Normalization::Fast] {
        let mut ahrs = estimator(FilterConfig {
            normalization,
            ..Default::default()
        })
        .with_attitude(Quaternion::new(0.9, 0.1, -0.3, 0.2));
        let tolerance = match normalization {
            Normalization::Exact => 1e-5,
            Normalization::Fast => 2e-3,
        };
        for _ in 0..10_000 {
            let q = ahrs.update(Axis::ZERO, Axis::ZERO, None, 0.002).unwrap();
            assert_abs_diff_eq!(q.norm(), 1.0, epsilon = tolerance);
        }
    }
}

#[test]
fn tilt_converges_to_accelerometer() {
    let truth = rolled(30.0);
    let accel = truth.gravity() * 9.81;
    for rate_scaling in [RateScaling::Rate, RateScaling::PerStep] {
        let kp = match rate_scaling {
            RateScaling::Rate => 2.0,
            RateScaling::PerStep => 0.02,
        };
        let mut ahrs = estimator(FilterConfig {
            kp,
            rate_scaling,
            degeneracy_check: DegeneracyCheck::Norm,
            ..Default::default()
        });
        for _ in 0..2000 {
            ahrs.update(accel, Axis::ZERO, None, 0.01).unwrap();
        }
        let e = ahrs.euler();
        assert_abs_diff_eq!(e.roll, 30.0, epsilon = 0.1);
        assert_abs_diff_eq!(e.pitch, 0.0, epsilon = 0.1);
    }
}

#[test]
fn heading_converges_to_magnetometer() {
    let yaw = 30f32.to_radians();
    let mag = Axis::new(0.4 * yaw.cos(), -0.4 * yaw.sin(), 0.3);
    let mut ahrs = estimator(FilterConfig {
        kp: 2.0,
        integration: IntegrationMode::SecondOrder,
        degeneracy_check: DegeneracyCheck::Norm,
        ..Default::default()
    });
    for _ in 0..3000 {
        ahrs.update(Axis::new(0.0, 0.0, 9.81), Axis::ZERO, Some(mag), 0.01)
            .unwrap();
    }
    let e = ahrs.euler();
    assert_abs_diff_eq!(e.yaw, 30.0, epsilon = 0.2);
    assert_abs_diff_eq!(e.roll, 0.0, epsilon = 0.2);

    // with the magnetometer disabled heading is never corrected
    let mut blind = estimator(FilterConfig {
        kp: 2.0,
        use_magnetometer: false,
        ..Default::default()
    });
    for _ in 0..100 {
        blind
            .update(Axis::new(0.0, 0.0, 9.81), Axis::ZERO, Some(mag), 0.01)
            .unwrap();
    }
    assert_eq!(blind.quaternion(), Quaternion::IDENTITY);
}

#[test]
fn integral_cancels_constant_gyro_bias() {
    let bias = Axis::new(0.02, -0.015, 0.0);
    let mut ahrs = estimator(FilterConfig {
        kp: 1.0,
        ki: 0.3,
        degeneracy_check: DegeneracyCheck::Norm,
        ..Default::default()
    });
    for _ in 0..6000 {
        ahrs.update(Axis::new(0.0, 0.0, 1.0), bias, None, 0.01).unwrap();
    }
    let fb = ahrs.integral_feedback();
    assert_abs_diff_eq!(fb.x, -bias.x, epsilon = 2e-3);
    assert_abs_diff_eq!(fb.y, -bias.y, epsilon = 2e-3);
    let e = ahrs.euler();
    assert_abs_diff_eq!(e.roll, 0.0, epsilon = 0.2);
    assert_abs_diff_eq!(e.pitch, 0.0, epsilon = 0.2);
}

#[test]
fn independent_instances_do_not_share_state() {
    let mut a = estimator(FilterConfig::default());
    let b = estimator(FilterConfig::default());
    a.update(Axis::new(0.0, 0.0, 1.0), Axis::new(1.0, 0.0, 0.0), None, 0.1)
        .unwrap();
    assert!(a.quaternion() != Quaternion::IDENTITY);
    assert_eq!(b.quaternion(), Quaternion::IDENTITY);
}
