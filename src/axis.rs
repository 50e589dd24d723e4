use core::ops::{Add, AddAssign, Mul};

use serde::{Deserialize, Serialize};

/// Three-axis sensor reading or rate vector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Axis {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Axis {
    pub const ZERO: Axis = Axis::new(0.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Axis { x, y, z }
    }

    pub fn dot(self, other: Axis) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(self, other: Axis) -> Axis {
        Axis::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    pub fn norm_squared(self) -> f32 {
        self.dot(self)
    }

    pub fn norm(self) -> f32 {
        self.norm_squared().sqrt()
    }

    /// True for the zero vector and for anything carrying NaN or infinity.
    /// Such a vector has no direction and must not be normalized.
    pub fn is_degenerate(self) -> bool {
        let n2 = self.norm_squared();
        n2 == 0.0 || !n2.is_finite()
    }

    /// Unit-length copy of this vector, using an exact square root.
    ///
    /// Returns `None` instead of dividing by a zero norm, so callers can skip
    /// whatever correction needed the direction.
    pub fn normalized(self) -> Option<Axis> {
        if self.is_degenerate() {
            return None;
        }
        let norm = self.norm();
        Some(Axis::new(self.x / norm, self.y / norm, self.z / norm))
    }
}

impl From<[f32; 3]> for Axis {
    fn from(v: [f32; 3]) -> Self {
        Axis::new(v[0], v[1], v[2])
    }
}

impl From<Axis> for [f32; 3] {
    fn from(a: Axis) -> Self {
        [a.x, a.y, a.z]
    }
}

impl Add for Axis {
    type Output = Axis;

    fn add(self, rhs: Axis) -> Axis {
        Axis::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Axis {
    fn add_assign(&mut self, rhs: Axis) {
        *self = *self + rhs;
    }
}

impl Mul<f32> for Axis {
    type Output = Axis;

    fn mul(self, k: f32) -> Axis {
        Axis::new(self.x * k, self.y * k, self.z * k)
    }
}
