//! Angle helpers and nalgebra extensions for the compass engine

use nalgebra::Vector3;

/// Mathematical constants
pub const DEG_TO_RAD: f32 = core::f32::consts::PI / 180.0;
pub const RAD_TO_DEG: f32 = 360.0 / (2.0 * core::f32::consts::PI);

/// Full turn in degrees
pub const FULL_CIRCLE: f32 = 360.0;
const HALF_CIRCLE: f32 = 180.0;

/// Normalize an angle in degrees into `[0, 360)`
///
/// Uses a Euclidean remainder, so the cost is the same for any finite input.
/// Non-finite input normalizes to 0 so the render path always has a defined value.
///
/// # Example
/// ```
/// use fusion_compass::normalize_positive;
///
/// assert_eq!(normalize_positive(-90.0), 270.0);
/// assert_eq!(normalize_positive(360.0), 0.0);
/// ```
pub fn normalize_positive(degrees: f32) -> f32 {
    if !degrees.is_finite() {
        return 0.0;
    }

    let angle = degrees.rem_euclid(FULL_CIRCLE);
    // f32 rounding can land exactly on 360 for tiny negative input
    if angle >= FULL_CIRCLE { 0.0 } else { angle }
}

/// Normalize an angle in degrees into `[-180, 180)`
///
/// # Example
/// ```
/// use fusion_compass::normalize_signed;
///
/// assert_eq!(normalize_signed(190.0), -170.0);
/// assert_eq!(normalize_signed(180.0), -180.0);
/// ```
pub fn normalize_signed(degrees: f32) -> f32 {
    if !degrees.is_finite() {
        return 0.0;
    }

    let angle = (degrees + HALF_CIRCLE).rem_euclid(FULL_CIRCLE) - HALF_CIRCLE;
    if angle >= HALF_CIRCLE { -HALF_CIRCLE } else { angle }
}

/// Extension trait for Vector3 operations
pub trait Vector3Ext {
    /// Normalize the vector, returning zero vector if magnitude is zero
    fn safe_normalize(&self) -> Vector3<f32>;

    /// Product of the three components
    fn axis_product(&self) -> f32;
}

impl Vector3Ext for Vector3<f32> {
    fn safe_normalize(&self) -> Vector3<f32> {
        let magnitude_squared = self.magnitude_squared();
        if magnitude_squared > 0.0 {
            *self / magnitude_squared.sqrt()
        } else {
            Vector3::zeros()
        }
    }

    fn axis_product(&self) -> f32 {
        self.x * self.y * self.z
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_positive_range() {
        for raw in [-1080.0f32, -360.0, -180.5, -0.001, 0.0, 45.0, 359.999, 360.0, 725.0] {
            let angle = normalize_positive(raw);
            assert!(
                (0.0..360.0).contains(&angle),
                "{} normalized to {} which is outside [0, 360)",
                raw,
                angle
            );
        }
        assert_eq!(normalize_positive(-90.0), 270.0);
        assert_eq!(normalize_positive(450.0), 90.0);
    }

    #[test]
    fn test_normalize_positive_tiny_negative() {
        // -1e-6 + 360 rounds to 360.0 in f32
        let angle = normalize_positive(-1e-6);
        assert!((0.0..360.0).contains(&angle));
    }

    #[test]
    fn test_normalize_signed_range() {
        for raw in [-540.0f32, -180.0, -179.9, 0.0, 179.9, 180.0, 270.0, 900.0] {
            let angle = normalize_signed(raw);
            assert!(
                (-180.0..180.0).contains(&angle),
                "{} normalized to {} which is outside [-180, 180)",
                raw,
                angle
            );
        }
        assert_eq!(normalize_signed(270.0), -90.0);
        assert_eq!(normalize_signed(-180.0), -180.0);
    }

    #[test]
    fn test_normalize_non_finite() {
        assert_eq!(normalize_positive(f32::NAN), 0.0);
        assert_eq!(normalize_signed(f32::INFINITY), 0.0);
    }

    #[test]
    fn test_normalize_huge_values() {
        // beyond 2^32 a single turn is below f32 resolution
        for raw in [4.3e9f32, 1e12, -1e12, f32::MAX, f32::MIN] {
            let positive = normalize_positive(raw);
            assert!((0.0..360.0).contains(&positive), "{} normalized to {}", raw, positive);

            let signed = normalize_signed(raw);
            assert!((-180.0..180.0).contains(&signed), "{} normalized to {}", raw, signed);
        }
    }

    #[test]
    fn test_vector_extensions() {
        let v = Vector3::new(3.0f32, 4.0, 0.0);
        let normalized = v.safe_normalize();
        assert!((normalized.magnitude() - 1.0).abs() < 1e-6);
        assert_eq!(Vector3::<f32>::zeros().safe_normalize(), Vector3::zeros());

        assert_eq!(Vector3::new(2.0f32, -3.0, 4.0).axis_product(), -24.0);
    }

    #[test]
    fn test_radian_conversion() {
        assert!((core::f32::consts::PI * RAD_TO_DEG - 180.0).abs() < 1e-4);
        assert!((90.0 * DEG_TO_RAD - core::f32::consts::FRAC_PI_2).abs() < 1e-6);
    }
}
