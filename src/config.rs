//! Filter tuning, loaded from JSON or built in code.
//!
//! Gains act on the error between *full-length* reference vectors
//! (`v = 2·(…)` form). Configurations written for the halved-vector
//! "two times Kp" convention translate as `kp = two_kp / 2`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::axis::Axis;
use crate::error::ConfigError;
use crate::euler::EulerOffsets;

/// How the proportional term is scaled against the sample period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateScaling {
    /// `kp * e`: the correction is an angular rate (rad/s per unit error).
    #[default]
    Rate,
    /// `kp * e / dt`: `kp` is the fraction of the error removed per sample,
    /// independent of the sample rate.
    PerStep,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationMode {
    #[default]
    FirstOrder,
    /// Scales the previous attitude by `1 − ‖ω·dt‖²/8`.
    SecondOrder,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Normalization {
    #[default]
    Exact,
    /// Fast inverse square root; keeps the norm within ~0.2% of one.
    Fast,
}

/// When a sample is too degenerate to correct against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegeneracyCheck {
    /// Skip correction unless every accelerometer component is non-zero,
    /// and, when a magnetometer was fused, every error component too.
    #[default]
    AllComponents,
    /// Skip only on a zero (or non-finite) accelerometer vector or a zero
    /// error. Accepts noise-free single-axis readings such as `(0, 0, g)`.
    Norm,
}

impl DegeneracyCheck {
    /// Whether the accelerometer reading may be used as a gravity reference.
    pub fn accepts_accel(self, accel: Axis) -> bool {
        match self {
            DegeneracyCheck::AllComponents => {
                all_components_nonzero(accel) && !accel.is_degenerate()
            }
            DegeneracyCheck::Norm => !accel.is_degenerate(),
        }
    }

    /// Whether the summed reference error may be fed back.
    pub fn accepts_error(self, error: Axis, mag_fused: bool) -> bool {
        match self {
            DegeneracyCheck::AllComponents if mag_fused => all_components_nonzero(error),
            _ => error != Axis::ZERO,
        }
    }
}

fn all_components_nonzero(v: Axis) -> bool {
    v.x != 0.0 && v.y != 0.0 && v.z != 0.0
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GyroUnits {
    #[default]
    RadiansPerSecond,
    DegreesPerSecond,
}

impl GyroUnits {
    pub fn to_radians_scale(self) -> f32 {
        match self {
            GyroUnits::RadiansPerSecond => 1.0,
            GyroUnits::DegreesPerSecond => core::f32::consts::PI / 180.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub kp: f32,
    /// Values `<= 0` disable the integral term and hold its accumulator at zero.
    pub ki: f32,
    pub rate_scaling: RateScaling,
    pub integration: IntegrationMode,
    pub use_magnetometer: bool,
    pub degeneracy_check: DegeneracyCheck,
    pub gyro_units: GyroUnits,
    pub normalization: Normalization,
    pub offsets: EulerOffsets,
    /// Resolution of the timestamp counter fed to a `ClockedEstimator`.
    pub ticks_per_second: u32,
}

impl Default for FilterConfig {
    fn default() -> Self {
        FilterConfig {
            kp: 0.8,
            ki: 0.0,
            rate_scaling: RateScaling::default(),
            integration: IntegrationMode::default(),
            use_magnetometer: true,
            degeneracy_check: DegeneracyCheck::default(),
            gyro_units: GyroUnits::default(),
            normalization: Normalization::default(),
            offsets: EulerOffsets::default(),
            ticks_per_second: 1_000_000,
        }
    }
}

impl FilterConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: FilterConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.kp.is_finite() || self.kp < 0.0 {
            return Err(ConfigError::InvalidGain {
                name: "kp",
                value: self.kp,
            });
        }
        if !self.ki.is_finite() {
            return Err(ConfigError::InvalidGain {
                name: "ki",
                value: self.ki,
            });
        }
        for (name, value) in [
            ("pitch", self.offsets.pitch),
            ("roll", self.offsets.roll),
            ("yaw", self.offsets.yaw),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::InvalidOffset { name, value });
            }
        }
        if self.ticks_per_second == 0 {
            return Err(ConfigError::ZeroTickRate);
        }
        Ok(())
    }
}
