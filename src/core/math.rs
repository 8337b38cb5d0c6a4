//! Angle arithmetic shared across the localization pipeline.
//!
//! All headings in the crate live in the half-open interval (-π, π].
//! Every operation that produces an angle normalizes through here so
//! poses stay comparable after arbitrarily many compositions.

use std::f64::consts::PI;

/// Normalize an angle to (-π, π].
///
/// Exactly -π maps to +π so the representation is unique.
pub fn normalize_angle(angle: f64) -> f64 {
    let mut a = angle % (2.0 * PI);
    if a > PI {
        a -= 2.0 * PI;
    } else if a <= -PI {
        a += 2.0 * PI;
    }
    a
}

/// Shortest signed difference `a - b`, wrapped to (-π, π].
pub fn angle_diff(a: f64, b: f64) -> f64 {
    normalize_angle(a - b)
}
