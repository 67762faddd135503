//! Magnetic or true-north bearing from the orientation estimate

use crate::math::{normalize_positive, normalize_signed};
use crate::orientation::OrientationEstimator;
use crate::types::{SensorAccuracy, SensorKind, SensorSample};

/// Resolves the raw azimuth into the bearing shown to consumers
///
/// This is the only place where magnetic and true north are told apart:
/// everything downstream receives an already resolved, normalized value.
///
/// # Example
/// ```
/// use fusion_compass::{BearingService, SensorSample};
///
/// let mut service = BearingService::new();
/// service.update(SensorSample::accelerometer(0.0, 0.0, 9.81));
/// service.update(SensorSample::magnetic(0.0, 22.0, -40.0)); // Facing magnetic north
/// service.set_declination(-12.0);
///
/// assert!((service.positive_bearing(true) - 348.0).abs() < 0.5);
/// assert!((service.bearing(true) + 12.0).abs() < 0.5);
/// ```
#[derive(Debug, Clone, Default)]
pub struct BearingService {
    estimator: OrientationEstimator,
    /// Degrees east of true north, 0 until a location fix arrives
    declination: f32,
}

impl BearingService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a sensor sample to the orientation estimator
    pub fn update(&mut self, sample: SensorSample) {
        self.estimator.update(sample);
    }

    pub fn set_accuracy(&mut self, kind: SensorKind, accuracy: SensorAccuracy) {
        self.estimator.set_accuracy(kind, accuracy);
    }

    pub fn set_declination(&mut self, declination: f32) {
        self.declination = if declination.is_finite() { declination } else { 0.0 };
    }

    pub fn declination(&self) -> f32 {
        self.declination
    }

    pub fn estimator(&self) -> &OrientationEstimator {
        &self.estimator
    }

    pub fn estimator_mut(&mut self) -> &mut OrientationEstimator {
        &mut self.estimator
    }

    /// Bearing in `[-180, 180)`, declination-corrected when `true_north`
    pub fn bearing(&mut self, true_north: bool) -> f32 {
        normalize_signed(self.raw_bearing(true_north))
    }

    /// Bearing in `[0, 360)`, declination-corrected when `true_north`
    pub fn positive_bearing(&mut self, true_north: bool) -> f32 {
        normalize_positive(self.raw_bearing(true_north))
    }

    fn raw_bearing(&mut self, true_north: bool) -> f32 {
        let azimuth = self.estimator.bearing();
        if true_north { azimuth + self.declination } else { azimuth }
    }
}
