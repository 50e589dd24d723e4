//! Complementary (proportional-integral) attitude filter.
//!
//! Per sample: normalize the reference sensors, measure how far the
//! predicted gravity (and optionally magnetic flux) direction is from the
//! measured one, feed that error back into the gyro rate, integrate the
//! quaternion and renormalize it. Samples the configured
//! [`DegeneracyCheck`] rejects fall back to plain gyro integration.
//!
//! The estimator does no locking. Share it between an interrupt/sampling
//! context and a reader only through a mutex or single-producer handoff.

use tracing::{debug, error, trace};

use crate::axis::Axis;
use crate::config::{DegeneracyCheck, FilterConfig, Normalization, RateScaling};
use crate::error::{ConfigError, EstimatorError};
use crate::euler::{quaternion_to_euler, EulerAngles};
use crate::quaternion::Quaternion;
use crate::timing::{DeltaTracker, TimeSource};

/// Misalignment between predicted and measured reference directions,
/// as a small-angle rotation vector in the body frame.
///
/// `accel` and `mag` are raw readings. Returns `None` when `check` finds the
/// sample unfit for correction: no usable accelerometer direction, or an
/// error vector it rejects.
pub fn reference_error(
    q: &Quaternion,
    accel: Axis,
    mag: Option<Axis>,
    check: DegeneracyCheck,
) -> Option<Axis> {
    if !check.accepts_accel(accel) {
        debug!(?accel, "accelerometer rejected, gyro-only step");
        return None;
    }
    let a = accel.normalized()?;
    let mut error = a.cross(q.gravity());

    let m = mag.and_then(Axis::normalized);
    if let Some(m) = m {
        // Flux seen from the reference frame, collapsed onto the north/down
        // plane so heading only comes from the horizontal component.
        let h = q.body_to_reference(m);
        let bx = (h.x * h.x + h.y * h.y).sqrt();
        let bz = h.z;
        let w = q.reference_to_body(Axis::new(bx, 0.0, bz));
        error += m.cross(w);
    }

    if !check.accepts_error(error, m.is_some()) {
        debug!(?error, "reference error rejected, gyro-only step");
        return None;
    }
    Some(error)
}

/// Attitude estimator state: current and previous attitude plus the
/// integral feedback accumulators.
#[derive(Debug, Clone)]
pub struct Estimator {
    config: FilterConfig,
    q: Quaternion,
    prev: Quaternion,
    integral: Axis,
}

impl Estimator {
    pub fn new(config: FilterConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Estimator {
            config,
            q: Quaternion::IDENTITY,
            prev: Quaternion::IDENTITY,
            integral: Axis::ZERO,
        })
    }

    /// Start from a known attitude instead of identity.
    pub fn with_attitude(mut self, q: Quaternion) -> Self {
        if let Ok(q) = q.normalized(Normalization::Exact) {
            self.q = q;
            self.prev = q;
        }
        self
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    pub fn quaternion(&self) -> Quaternion {
        self.q
    }

    /// Attitude before the most recent update.
    pub fn previous(&self) -> Quaternion {
        self.prev
    }

    pub fn integral_feedback(&self) -> Axis {
        self.integral
    }

    pub fn euler(&self) -> EulerAngles {
        quaternion_to_euler(&self.q, &self.config.offsets)
    }

    /// Change the integral gain. A non-positive value clears the
    /// accumulators on the next update.
    pub fn set_integral_gain(&mut self, ki: f32) {
        self.config.ki = ki;
    }

    pub fn reset(&mut self) {
        self.q = Quaternion::IDENTITY;
        self.prev = Quaternion::IDENTITY;
        self.integral = Axis::ZERO;
    }

    /// Fuse one sample taken `dt` seconds after the previous one.
    ///
    /// `gyro` is in the configured units; `accel` and `mag` only need a
    /// direction. Inputs are taken by value and never modified.
    pub fn update(
        &mut self,
        accel: Axis,
        gyro: Axis,
        mag: Option<Axis>,
        dt: f32,
    ) -> Result<Quaternion, EstimatorError> {
        if !dt.is_finite() || dt < 0.0 {
            return Err(EstimatorError::InvalidTimeStep(dt));
        }

        // anti-windup: a disabled integral term never carries state
        if self.config.ki <= 0.0 {
            self.integral = Axis::ZERO;
        }

        let gyro = gyro * self.config.gyro_units.to_radians_scale();
        let mag = if self.config.use_magnetometer { mag } else { None };

        let rate = match reference_error(&self.q, accel, mag, self.config.degeneracy_check) {
            Some(e) if dt > 0.0 => self.feedback(gyro, e, dt),
            _ => gyro,
        };
        trace!(dt, ?rate, "integrating");

        self.prev = self.q;
        let next = self.prev.integrate(rate, dt, self.config.integration);
        match next.normalized(self.config.normalization) {
            Ok(q) => {
                self.q = q;
                Ok(q)
            }
            Err(norm) => {
                error!(norm, ?next, ?rate, "quaternion collapsed, resetting estimator");
                self.reset();
                Err(EstimatorError::QuaternionCollapsed { norm })
            }
        }
    }

    /// PI correction of the measured rate. Only the accumulator persists.
    fn feedback(&mut self, gyro: Axis, error: Axis, dt: f32) -> Axis {
        if self.config.ki > 0.0 {
            self.integral += error * (self.config.ki * dt);
        }
        let proportional = match self.config.rate_scaling {
            RateScaling::Rate => error * self.config.kp,
            RateScaling::PerStep => error * (self.config.kp / dt),
        };
        gyro + proportional + self.integral
    }
}

/// An [`Estimator`] that derives its time step from a tick source.
pub struct ClockedEstimator<S: TimeSource> {
    estimator: Estimator,
    source: S,
    tracker: DeltaTracker<S::Tick>,
}

impl<S: TimeSource> ClockedEstimator<S> {
    /// Reads the source once; call [`initialize`](Self::initialize) again
    /// right before the first sample if setup took a while.
    pub fn new(estimator: Estimator, mut source: S) -> Self {
        let start = source.now();
        let tracker = DeltaTracker::new(start, estimator.config().ticks_per_second);
        ClockedEstimator {
            estimator,
            source,
            tracker,
        }
    }

    /// Restart time tracking from the current source reading.
    pub fn initialize(&mut self) {
        let now = self.source.now();
        self.tracker.reset(now);
    }

    /// Fuse one sample using the time elapsed since the previous call.
    /// The elapsed interval is consumed even when the update fails.
    pub fn update(
        &mut self,
        accel: Axis,
        gyro: Axis,
        mag: Option<Axis>,
    ) -> Result<Quaternion, EstimatorError> {
        let now = self.source.now();
        let dt = self.tracker.elapsed(now);
        self.estimator.update(accel, gyro, mag, dt)
    }

    pub fn estimator(&self) -> &Estimator {
        &self.estimator
    }

    pub fn estimator_mut(&mut self) -> &mut Estimator {
        &mut self.estimator
    }
}
