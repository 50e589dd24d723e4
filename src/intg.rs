use tracing::warn;

use crate::axis::Axis;
use crate::config::{IntegrationMode, Normalization};
use crate::quaternion::Quaternion;

/// Open-loop gyro integration, no reference correction. Shows how far the
/// raw gyro drifts next to the corrected estimate.
#[derive(Debug, Clone, Default)]
pub struct GyroIntegrator {
    pub q: Quaternion,
}

impl GyroIntegrator {
    /// `w` in rad/s, `dt` in seconds.
    pub fn add_sample(&mut self, dt: f32, w: Axis) {
        let next = self.q.integrate(w, dt, IntegrationMode::SecondOrder);
        self.q = match next.normalized(Normalization::Exact) {
            Ok(q) => q,
            Err(norm) => {
                warn!(norm, ?w, "gyro-only attitude collapsed, restarting from identity");
                Quaternion::IDENTITY
            }
        };
    }

    pub fn reset(&mut self) {
        self.q = Quaternion::IDENTITY;
    }
}
