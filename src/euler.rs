use serde::{Deserialize, Serialize};

use crate::quaternion::Quaternion;

/// Attitude in degrees, after board calibration offsets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EulerAngles {
    pub pitch: f32,
    pub roll: f32,
    pub yaw: f32,
}

/// Fixed per-axis mounting offsets in degrees, subtracted from every angle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EulerOffsets {
    pub pitch: f32,
    pub roll: f32,
    pub yaw: f32,
}

/// Pitch, roll and yaw of `q`, minus `offsets`.
///
/// The `asin` argument is clamped to `[-1, 1]`: near ±90° pitch rounding can
/// push it just past 1 and the angle would otherwise come out NaN.
pub fn quaternion_to_euler(q: &Quaternion, offsets: &EulerOffsets) -> EulerAngles {
    let Quaternion { q0, q1, q2, q3 } = *q;

    let sin_pitch = (-2.0 * q1 * q3 + 2.0 * q0 * q2).clamp(-1.0, 1.0);
    let pitch = sin_pitch.asin();
    let roll = (2.0 * q2 * q3 + 2.0 * q0 * q1).atan2(-2.0 * q1 * q1 - 2.0 * q2 * q2 + 1.0);
    let yaw = (2.0 * q1 * q2 + 2.0 * q0 * q3).atan2(-2.0 * q2 * q2 - 2.0 * q3 * q3 + 1.0);

    EulerAngles {
        pitch: pitch.to_degrees() - offsets.pitch,
        roll: roll.to_degrees() - offsets.roll,
        yaw: yaw.to_degrees() - offsets.yaw,
    }
}
