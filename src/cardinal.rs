//! Compass-point names for bearings

use crate::math::normalize_positive;

const POINTS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW", "NNW",
];
const SECTOR: f32 = 360.0 / POINTS.len() as f32;

/// Name of the 16-point compass direction nearest to a bearing
///
/// Accepts any bearing; each point covers 22.5° centred on its direction.
///
/// # Example
/// ```
/// use fusion_compass::cardinal::cardinal_from_bearing;
///
/// assert_eq!(cardinal_from_bearing(0.0), "N");
/// assert_eq!(cardinal_from_bearing(350.0), "N");
/// assert_eq!(cardinal_from_bearing(-90.0), "W");
/// assert_eq!(cardinal_from_bearing(135.0), "SE");
/// ```
pub fn cardinal_from_bearing(bearing: f32) -> &'static str {
    let shifted = normalize_positive(bearing + SECTOR / 2.0);
    let index = (shifted / SECTOR) as usize % POINTS.len();
    POINTS[index]
}
