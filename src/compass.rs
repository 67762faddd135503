//! Tilt-compensated orientation from gravity and geomagnetic vectors
//!
//! Vectors are in the device frame: X to the right of the screen, Y towards
//! the top of the screen, Z out of the screen. A device lying flat and face
//! up reads gravity as `(0, 0, +g)`.

use crate::math::{RAD_TO_DEG, Vector3Ext};
use crate::types::OrientationVector;
use nalgebra::{Matrix3, Vector3};

/// Minimum `|E × A|` for a usable rotation matrix
///
/// Below this the device is in free fall or the field is almost parallel to
/// gravity (close to a magnetic pole) and no horizontal reference exists.
const MIN_HORIZONTAL_NORM: f32 = 0.1;

/// Build the device-to-world rotation matrix
///
/// Rows are the world axes expressed in device coordinates:
/// east (`H = E × A`), north (`M = A × H`) and up (`A`). The result
/// transforms a device-frame vector into east-north-up coordinates.
///
/// # Arguments
/// * `gravity` - Accelerometer reading (any unit)
/// * `geomagnetic` - Magnetometer reading (any unit)
///
/// # Returns
/// `None` when the horizontal reference is degenerate
pub fn rotation_matrix(gravity: Vector3<f32>, geomagnetic: Vector3<f32>) -> Option<Matrix3<f32>> {
    let east = geomagnetic.cross(&gravity);
    let east_norm = east.magnitude();
    if east_norm.is_nan() || east_norm < MIN_HORIZONTAL_NORM {
        return None;
    }

    let east = east / east_norm;
    let up = gravity.safe_normalize();
    let north = up.cross(&east);

    Some(Matrix3::from_rows(&[
        east.transpose(),
        north.transpose(),
        up.transpose(),
    ]))
}

/// Extract azimuth, pitch and roll from a rotation matrix
///
/// Azimuth is `atan2(R[0][1], R[1][1])`, in `[-π, π]`, zero when the top of
/// the device points at magnetic north and increasing clockwise.
pub fn orientation(rotation: &Matrix3<f32>) -> OrientationVector {
    OrientationVector {
        azimuth: rotation[(0, 1)].atan2(rotation[(1, 1)]),
        pitch: (-rotation[(2, 1)]).clamp(-1.0, 1.0).asin(),
        roll: (-rotation[(2, 0)]).atan2(rotation[(2, 2)]),
    }
}

/// Calculate the tilt-compensated magnetic heading
///
/// # Returns
/// Heading in degrees (`-180..=180`, 0 = magnetic north), or `None` when the
/// vectors do not define a horizontal plane
///
/// # Example
/// ```
/// use nalgebra::Vector3;
/// use fusion_compass::compass::calculate_heading;
///
/// let gravity = Vector3::new(0.0, 0.0, 9.81); // Flat, face up
/// let field = Vector3::new(0.0, 22.0, -40.0); // Top of the device points north
/// let heading = calculate_heading(gravity, field).unwrap();
/// assert!(heading.abs() < 1.0);
/// ```
pub fn calculate_heading(gravity: Vector3<f32>, geomagnetic: Vector3<f32>) -> Option<f32> {
    rotation_matrix(gravity, geomagnetic).map(|rotation| orientation(&rotation).azimuth * RAD_TO_DEG)
}
