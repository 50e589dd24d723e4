//! Approximate reciprocal square root for hot normalization paths.
//!
//! Relative error stays below ~0.18% for positive normal inputs, good enough
//! to renormalize an attitude quaternion every sample. Anything that feeds
//! another computation (reference flux magnitude, sensor vectors) uses
//! `f32::sqrt` instead.

const MAGIC: u32 = 0x5f37_59df;

/// `1 / sqrt(x)` from the float bit pattern plus one Newton-Raphson step.
///
/// Only meaningful for `x > 0`; callers check for degenerate inputs first.
pub fn inv_sqrt(x: f32) -> f32 {
    let half_x = 0.5 * x;
    let i = MAGIC.wrapping_sub(x.to_bits() >> 1);
    let y = f32::from_bits(i);
    y * (1.5 - half_x * y * y)
}
