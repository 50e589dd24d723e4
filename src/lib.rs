//! Quaternion attitude estimation from accelerometer, gyroscope and
//! (optionally) magnetometer samples, using a complementary filter with
//! proportional-integral feedback.
//!
//! ```
//! use piahrs::{Axis, Estimator, FilterConfig};
//!
//! let mut ahrs = Estimator::new(FilterConfig::default()).unwrap();
//! let q = ahrs
//!     .update(Axis::new(0.0, 0.0, 9.81), Axis::new(0.0, 0.0, 0.01), None, 0.002)
//!     .unwrap();
//! assert!((q.norm() - 1.0).abs() < 1e-6);
//! let angles = ahrs.euler();
//! assert!(angles.yaw > 0.0);
//! ```

pub mod axis;
pub mod config;
pub mod data;
pub mod error;
pub mod euler;
pub mod fast_math;
pub mod filter;
pub mod intg;
pub mod quaternion;
pub mod timing;

pub use axis::Axis;
pub use config::{
    DegeneracyCheck, FilterConfig, GyroUnits, IntegrationMode, Normalization, RateScaling,
};
pub use error::{ConfigError, EstimatorError, ReplayError};
pub use euler::{quaternion_to_euler, EulerAngles, EulerOffsets};
pub use fast_math::inv_sqrt;
pub use filter::{reference_error, ClockedEstimator, Estimator};
pub use quaternion::Quaternion;
pub use timing::{DeltaTracker, MonotonicClock, TickCounter, TimeSource};
