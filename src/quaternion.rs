use serde::{Deserialize, Serialize};

use crate::axis::Axis;
use crate::config::{IntegrationMode, Normalization};
use crate::fast_math::inv_sqrt;

/// Rotation from the reference frame to the body frame, scalar first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub q0: f32,
    pub q1: f32,
    pub q2: f32,
    pub q3: f32,
}

impl Default for Quaternion {
    fn default() -> Self {
        Quaternion::IDENTITY
    }
}

impl Quaternion {
    pub const IDENTITY: Quaternion = Quaternion::new(1.0, 0.0, 0.0, 0.0);

    pub const fn new(q0: f32, q1: f32, q2: f32, q3: f32) -> Self {
        Quaternion { q0, q1, q2, q3 }
    }

    /// Rotation of `angle` radians about `axis` (need not be unit length).
    pub fn from_axis_angle(axis: Axis, angle: f32) -> Option<Self> {
        let axis = axis.normalized()?;
        let (s, c) = (angle * 0.5).sin_cos();
        Some(Quaternion::new(c, axis.x * s, axis.y * s, axis.z * s))
    }

    pub fn norm_squared(&self) -> f32 {
        self.q0 * self.q0 + self.q1 * self.q1 + self.q2 * self.q2 + self.q3 * self.q3
    }

    pub fn norm(&self) -> f32 {
        self.norm_squared().sqrt()
    }

    /// Gravity direction in the body frame as predicted by this attitude,
    /// i.e. the third row of the rotation matrix.
    pub fn gravity(&self) -> Axis {
        let Quaternion { q0, q1, q2, q3 } = *self;
        Axis::new(
            2.0 * (q1 * q3 - q0 * q2),
            2.0 * (q0 * q1 + q2 * q3),
            q0 * q0 - q1 * q1 - q2 * q2 + q3 * q3,
        )
    }

    /// Rotate a body-frame vector into the reference frame.
    pub fn body_to_reference(&self, v: Axis) -> Axis {
        let Quaternion { q0, q1, q2, q3 } = *self;
        Axis::new(
            2.0 * v.x * (0.5 - q2 * q2 - q3 * q3)
                + 2.0 * v.y * (q1 * q2 - q0 * q3)
                + 2.0 * v.z * (q1 * q3 + q0 * q2),
            2.0 * v.x * (q1 * q2 + q0 * q3)
                + 2.0 * v.y * (0.5 - q1 * q1 - q3 * q3)
                + 2.0 * v.z * (q2 * q3 - q0 * q1),
            2.0 * v.x * (q1 * q3 - q0 * q2)
                + 2.0 * v.y * (q2 * q3 + q0 * q1)
                + 2.0 * v.z * (0.5 - q1 * q1 - q2 * q2),
        )
    }

    /// Rotate a reference-frame vector into the body frame.
    pub fn reference_to_body(&self, v: Axis) -> Axis {
        self.conjugate().body_to_reference(v)
    }

    pub fn conjugate(&self) -> Quaternion {
        Quaternion::new(self.q0, -self.q1, -self.q2, -self.q3)
    }

    /// One integration step of `q̇ = ½ q ⊗ (0, ω)` over `dt` seconds.
    ///
    /// Every right-hand-side term reads from `self`, which is the snapshot
    /// taken before the step. The result is not renormalized.
    pub fn integrate(&self, rate: Axis, dt: f32, mode: IntegrationMode) -> Quaternion {
        let half = 0.5 * dt;
        let (gx, gy, gz) = (rate.x * half, rate.y * half, rate.z * half);
        let p = self;

        let k = match mode {
            IntegrationMode::FirstOrder => 1.0,
            // Taylor term of the exponential map: cos(θ/2) ≈ 1 − θ²/8
            IntegrationMode::SecondOrder => 1.0 - (rate * dt).norm_squared() / 8.0,
        };

        Quaternion::new(
            k * p.q0 + (-p.q1 * gx - p.q2 * gy - p.q3 * gz),
            k * p.q1 + (p.q0 * gx + p.q2 * gz - p.q3 * gy),
            k * p.q2 + (p.q0 * gy - p.q1 * gz + p.q3 * gx),
            k * p.q3 + (p.q0 * gz + p.q1 * gy - p.q2 * gx),
        )
    }

    /// Unit-length copy, or `Err(norm)` when the norm is zero or not finite.
    pub fn normalized(&self, method: Normalization) -> Result<Quaternion, f32> {
        let n2 = self.norm_squared();
        if n2 == 0.0 || !n2.is_finite() {
            return Err(n2.sqrt());
        }
        let inv = match method {
            Normalization::Exact => 1.0 / n2.sqrt(),
            Normalization::Fast => inv_sqrt(n2),
        };
        Ok(Quaternion::new(
            self.q0 * inv,
            self.q1 * inv,
            self.q2 * inv,
            self.q3 * inv,
        ))
    }

    pub fn to_array(&self) -> [f32; 4] {
        [self.q0, self.q1, self.q2, self.q3]
    }
}

impl From<[f32; 4]> for Quaternion {
    fn from(q: [f32; 4]) -> Self {
        Quaternion::new(q[0], q[1], q[2], q[3])
    }
}
